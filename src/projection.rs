use crate::models::AttendanceRecord;

pub const DEFAULT_THRESHOLD: u32 = 75;
pub const EXCELLENT_THRESHOLD: u32 = 90;
pub const RECENT_WINDOW: usize = 5;
/// Horizon used to estimate the best percentage still achievable.
pub const BEST_CASE_HORIZON: u32 = 500;

/// Result of solving for the number of consecutive classes needed to hit a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassesNeeded {
    Classes(u32),
    /// No finite number of attended classes reaches the target.
    Unreachable,
}

impl ClassesNeeded {
    pub fn count(self) -> Option<u32> {
        match self {
            Self::Classes(count) => Some(count),
            Self::Unreachable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missable {
    /// Classes that can still be missed while staying at or above the threshold.
    CanMiss(u32),
    /// Already below the threshold; carries the classes needed to recover.
    Deficit(ClassesNeeded),
}

impl Missable {
    /// Signed view: spare classes are positive, a deficit is the negated recovery count.
    /// `None` when the deficit can never be recovered.
    pub fn as_signed(self) -> Option<i64> {
        match self {
            Self::CanMiss(count) => Some(count as i64),
            Self::Deficit(ClassesNeeded::Classes(count)) => Some(-(count as i64)),
            Self::Deficit(ClassesNeeded::Unreachable) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub earlier_pct: f64,
    pub later_pct: f64,
    pub direction: TrendDirection,
}

pub fn current_percentage(attended: u32, total: u32) -> Option<f64> {
    ratio_pct(attended as f64, total as f64)
}

/// Solves `(attended + x) / (total + x) = target / 100` for the smallest whole `x`.
pub fn classes_needed_for_target(attended: u32, total: u32, target_pct: u32) -> ClassesNeeded {
    if target_pct >= 100 {
        return ClassesNeeded::Unreachable;
    }

    let numerator = target_pct as i64 * total as i64 - 100 * attended as i64;
    let denominator = 100 - target_pct as i64;
    if numerator <= 0 {
        return ClassesNeeded::Classes(0);
    }

    let needed = (numerator + denominator - 1) / denominator;
    ClassesNeeded::Classes(u32::try_from(needed).unwrap_or(u32::MAX))
}

/// `None` when there is no attendance recorded yet.
pub fn missable_classes(attended: u32, total: u32, threshold_pct: u32) -> Option<Missable> {
    if total == 0 || threshold_pct == 0 {
        return None;
    }

    // A threshold pulled from the query can be as large as u32::MAX.
    let attended_scaled = 100 * attended as i128;
    if attended_scaled < threshold_pct as i128 * total as i128 {
        return Some(Missable::Deficit(classes_needed_for_target(
            attended,
            total,
            threshold_pct,
        )));
    }

    let max_total = attended_scaled / threshold_pct as i128;
    let spare = (max_total - total as i128).max(0);
    Some(Missable::CanMiss(u32::try_from(spare).unwrap_or(u32::MAX)))
}

/// Percentage after `delta` more classes, all of them attended.
pub fn projected_percentage(attended: u32, total: u32, delta: u32) -> Option<f64> {
    ratio_pct(
        attended as f64 + delta as f64,
        total as f64 + delta as f64,
    )
}

/// Percentage after `extra_total` more classes of which `extra_attended` are attended.
pub fn projected_partial(
    attended: u32,
    total: u32,
    extra_attended: f64,
    extra_total: u32,
) -> Option<f64> {
    ratio_pct(
        attended as f64 + extra_attended,
        total as f64 + extra_total as f64,
    )
}

/// Percentage after missing `missed` more classes in a row.
pub fn percentage_after_missing(attended: u32, total: u32, missed: u32) -> Option<f64> {
    ratio_pct(attended as f64, total as f64 + missed as f64)
}

/// Splits the history at its midpoint and compares the present ratio of both halves.
pub fn trend(history: &[AttendanceRecord]) -> Option<Trend> {
    if history.len() < 2 {
        return None;
    }

    let (earlier, later) = history.split_at(history.len() / 2);
    let earlier_pct = present_ratio(earlier)?;
    let later_pct = present_ratio(later)?;

    let direction = if later_pct > earlier_pct {
        TrendDirection::Improving
    } else if later_pct < earlier_pct {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };

    Some(Trend {
        earlier_pct,
        later_pct,
        direction,
    })
}

/// Present ratio of the last `window` records, if that many exist.
pub fn recent_rate(history: &[AttendanceRecord], window: usize) -> Option<f64> {
    if window == 0 || history.len() < window {
        return None;
    }
    present_ratio(&history[history.len() - window..])
}

fn present_ratio(records: &[AttendanceRecord]) -> Option<f64> {
    let present = records.iter().filter(|record| record.is_present()).count();
    ratio_pct(present as f64, records.len() as f64)
}

fn ratio_pct(attended: f64, total: f64) -> Option<f64> {
    if total <= 0.0 {
        None
    } else {
        Some(attended / total * 100.0)
    }
}
