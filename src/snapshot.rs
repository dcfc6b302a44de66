use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{AttendanceRecord, AttendanceSnapshot, AttendanceStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("attended classes ({attended}) exceed total classes ({total})")]
    AttendedExceedsTotal { attended: u32, total: u32 },

    #[error("subject '{subject}' has {attended} attended out of {total} classes")]
    SubjectAttendedExceedsTotal {
        subject: String,
        attended: u32,
        total: u32,
    },

    #[error("subject '{0}' appears more than once")]
    DuplicateSubject(String),
}

/// Checks the snapshot invariants and lowercases subject keys.
pub fn validate(mut snapshot: AttendanceSnapshot) -> Result<AttendanceSnapshot, SnapshotError> {
    if snapshot.attended_classes > snapshot.total_classes {
        return Err(SnapshotError::AttendedExceedsTotal {
            attended: snapshot.attended_classes,
            total: snapshot.total_classes,
        });
    }

    let mut subjects = HashMap::with_capacity(snapshot.subject_wise.len());
    for (name, data) in snapshot.subject_wise.drain() {
        let key = name.to_lowercase();
        if data.attended > data.total {
            return Err(SnapshotError::SubjectAttendedExceedsTotal {
                subject: key,
                attended: data.attended,
                total: data.total,
            });
        }
        if subjects.insert(key.clone(), data).is_some() {
            return Err(SnapshotError::DuplicateSubject(key));
        }
    }
    snapshot.subject_wise = subjects;

    let expected = AttendanceSnapshot::new(snapshot.attended_classes, snapshot.total_classes);
    if (expected.percentage - snapshot.percentage).abs() > 0.01 {
        tracing::warn!(
            reported = snapshot.percentage,
            expected = expected.percentage,
            "snapshot percentage does not match its class counts"
        );
    }

    Ok(snapshot)
}

pub fn load_snapshot(path: &Path) -> anyhow::Result<AttendanceSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot: AttendanceSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("invalid snapshot JSON in {}", path.display()))?;
    let snapshot = validate(snapshot)?;

    tracing::info!(
        path = %path.display(),
        attended = snapshot.attended_classes,
        total = snapshot.total_classes,
        records = snapshot.attendance_details.len(),
        "snapshot loaded"
    );
    Ok(snapshot)
}

pub fn write_snapshot(path: &Path, snapshot: &AttendanceSnapshot) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    Ok(())
}

/// Builds a snapshot from one CSV row per held class: `date,status,subject`.
pub fn import_csv(csv_path: &Path, remaining_classes: u32) -> anyhow::Result<AttendanceSnapshot> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        date: NaiveDate,
        status: String,
        #[serde(default)]
        subject: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut records = Vec::new();
    let mut subjects: HashMap<String, (u32, u32)> = HashMap::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result
            .with_context(|| format!("bad row {} in {}", line + 1, csv_path.display()))?;
        let status = match row.status.trim().to_lowercase().as_str() {
            "present" | "p" => AttendanceStatus::Present,
            "absent" | "a" => AttendanceStatus::Absent,
            other => {
                tracing::warn!(row = line + 1, status = other, "skipping row with unknown status");
                continue;
            }
        };

        if let Some(subject) = row.subject.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let entry = subjects.entry(subject.to_lowercase()).or_insert((0, 0));
            if status == AttendanceStatus::Present {
                entry.0 += 1;
            }
            entry.1 += 1;
        }

        records.push(AttendanceRecord {
            date: row.date,
            status,
        });
    }

    records.sort_by_key(|record| record.date);
    let total = u32::try_from(records.len()).context("too many attendance rows")?;
    let attended = records.iter().filter(|record| record.is_present()).count() as u32;

    let mut snapshot = AttendanceSnapshot::new(attended, total)
        .with_details(records)
        .with_remaining(remaining_classes);
    for (name, (attended, total)) in subjects {
        snapshot = snapshot.with_subject(&name, attended, total);
    }

    tracing::info!(attended, total, subjects = snapshot.subject_wise.len(), "csv imported");
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectAttendance;
    use std::io::Write;

    fn subject(attended: u32, total: u32) -> SubjectAttendance {
        SubjectAttendance::new(attended, total)
    }

    #[test]
    fn loads_dashboard_report_shape() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "totalClasses": 40,
                "attendedClasses": 30,
                "percentage": 75.0,
                "attendanceDetails": [
                    {{"date": "2025-02-03", "status": "present"}},
                    {{"date": "2025-02-04", "status": "absent"}},
                    {{"date": "2025-02-05"}}
                ],
                "subjectWise": {{"Physics": {{"attended": 9, "total": 10, "percentage": 90.0}}}},
                "totalRemainingClasses": 12
            }}"#
        )
        .unwrap();

        let snapshot = load_snapshot(file.path()).unwrap();
        assert_eq!(snapshot.attended_classes, 30);
        assert_eq!(snapshot.total_remaining_classes, 12);
        assert_eq!(snapshot.attendance_details.len(), 3);
        assert_eq!(snapshot.attendance_details[1].status, AttendanceStatus::Absent);
        assert_eq!(snapshot.attendance_details[2].status, AttendanceStatus::Present);
        assert!(snapshot.subject_wise.contains_key("physics"));
    }

    #[test]
    fn optional_sections_default_to_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"totalClasses": 4, "attendedClasses": 3, "percentage": 75.0}}"#
        )
        .unwrap();

        let snapshot = load_snapshot(file.path()).unwrap();
        assert!(snapshot.attendance_details.is_empty());
        assert!(snapshot.subject_wise.is_empty());
        assert_eq!(snapshot.total_remaining_classes, 0);
    }

    #[test]
    fn rejects_more_attended_than_total() {
        let snapshot = AttendanceSnapshot::new(5, 4);
        assert_eq!(
            validate(snapshot),
            Err(SnapshotError::AttendedExceedsTotal {
                attended: 5,
                total: 4
            })
        );
    }

    #[test]
    fn rejects_subject_keys_that_collide_when_lowercased() {
        let mut snapshot = AttendanceSnapshot::new(3, 4);
        snapshot
            .subject_wise
            .insert("Physics".to_string(), subject(1, 2));
        snapshot
            .subject_wise
            .insert("physics".to_string(), subject(2, 2));
        assert_eq!(
            validate(snapshot),
            Err(SnapshotError::DuplicateSubject("physics".to_string()))
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let error = load_snapshot(&dir.path().join("absent.json")).unwrap_err();
        assert!(error.to_string().contains("failed to read snapshot"));
    }

    #[test]
    fn imports_csv_rows_in_date_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,status,subject").unwrap();
        writeln!(file, "2025-02-05,absent,Physics").unwrap();
        writeln!(file, "2025-02-03,present,Physics").unwrap();
        writeln!(file, "2025-02-04,present,Chemistry").unwrap();
        writeln!(file, "2025-02-06,late,Chemistry").unwrap();
        writeln!(file, "2025-02-07,P,").unwrap();
        file.flush().unwrap();

        let snapshot = import_csv(file.path(), 8).unwrap();
        assert_eq!(snapshot.total_classes, 4);
        assert_eq!(snapshot.attended_classes, 3);
        assert_eq!(snapshot.percentage, 75.0);
        assert_eq!(snapshot.total_remaining_classes, 8);

        let dates: Vec<String> = snapshot
            .attendance_details
            .iter()
            .map(|record| record.date.to_string())
            .collect();
        assert_eq!(dates, ["2025-02-03", "2025-02-04", "2025-02-05", "2025-02-07"]);

        let physics = &snapshot.subject_wise["physics"];
        assert_eq!((physics.attended, physics.total), (1, 2));
        assert_eq!(physics.percentage, 50.0);
        assert_eq!(snapshot.subject_wise["chemistry"].total, 1);
    }

    #[test]
    fn written_snapshot_loads_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        let snapshot = AttendanceSnapshot::new(9, 12).with_subject("English", 4, 5);

        write_snapshot(&path, &snapshot).unwrap();
        assert_eq!(load_snapshot(&path).unwrap(), snapshot);
    }
}
