use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::projection::current_percentage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    /// Check-ins from the dashboard carry no status; a marked record is a present one.
    #[serde(default)]
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Present
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAttendance {
    pub attended: u32,
    pub total: u32,
    pub percentage: f64,
}

impl SubjectAttendance {
    pub fn new(attended: u32, total: u32) -> Self {
        Self {
            attended,
            total,
            percentage: percentage_of(attended, total),
        }
    }
}

/// Point-in-time attendance for the active course, as the dashboard reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSnapshot {
    pub total_classes: u32,
    pub attended_classes: u32,
    pub percentage: f64,
    #[serde(default)]
    pub attendance_details: Vec<AttendanceRecord>,
    #[serde(default)]
    pub subject_wise: HashMap<String, SubjectAttendance>,
    #[serde(default)]
    pub total_remaining_classes: u32,
}

impl AttendanceSnapshot {
    pub fn new(attended_classes: u32, total_classes: u32) -> Self {
        Self {
            total_classes,
            attended_classes,
            percentage: percentage_of(attended_classes, total_classes),
            attendance_details: Vec::new(),
            subject_wise: HashMap::new(),
            total_remaining_classes: 0,
        }
    }

    pub fn with_details(mut self, details: Vec<AttendanceRecord>) -> Self {
        self.attendance_details = details;
        self
    }

    pub fn with_subject(mut self, name: &str, attended: u32, total: u32) -> Self {
        self.subject_wise
            .insert(name.to_lowercase(), SubjectAttendance::new(attended, total));
        self
    }

    pub fn with_remaining(mut self, remaining: u32) -> Self {
        self.total_remaining_classes = remaining;
        self
    }

    pub fn missed_classes(&self) -> u32 {
        self.total_classes.saturating_sub(self.attended_classes)
    }
}

// The dashboard reports 0% for a course with no classes yet.
fn percentage_of(attended: u32, total: u32) -> f64 {
    current_percentage(attended, total).unwrap_or(0.0)
}
