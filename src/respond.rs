use std::fmt::Write;

use crate::intent::{self, Intent};
use crate::models::AttendanceSnapshot;
use crate::projection::{
    self, ClassesNeeded, Missable, TrendDirection, BEST_CASE_HORIZON, DEFAULT_THRESHOLD,
    EXCELLENT_THRESHOLD, RECENT_WINDOW,
};

pub const NO_SNAPSHOT: &str = "I can't access your attendance information right now. Please try again later or select a course first.";

pub const NO_CLASSES: &str = "No classes have been recorded for this course yet, so there's no attendance data to work with.";

pub const HELP: &str = "I can answer questions about your attendance such as:\n\n\
- Current percentage ('What's my attendance?')\n\
- Classes you can miss ('How many classes can I skip?')\n\
- Required classes ('How many classes to reach 90%?')\n\
- Risk assessment ('Am I at risk?')\n\
- Detailed analytics ('Show me attendance analytics')\n\
- Subject data ('What's my Math attendance?')\n\
- Improvement plan ('How can I improve my attendance?')\n\
- Overall status ('What's my attendance status?')";

/// Classifies `query` and composes the reply for it.
pub fn answer(query: &str, snapshot: Option<&AttendanceSnapshot>) -> String {
    let Some(snapshot) = snapshot else {
        return NO_SNAPSHOT.to_string();
    };
    compose(&intent::classify(query), snapshot)
}

pub fn compose(intent: &Intent, snapshot: &AttendanceSnapshot) -> String {
    if *intent == Intent::Help {
        return HELP.to_string();
    }
    if snapshot.total_classes == 0 {
        return NO_CLASSES.to_string();
    }

    match intent {
        Intent::Percentage => percentage(snapshot),
        Intent::Missable { threshold } => missable(snapshot, *threshold),
        Intent::Projection { count } => projected(snapshot, *count),
        Intent::AtRisk { threshold } => at_risk(snapshot, *threshold),
        Intent::ClassesAttended => classes_attended(snapshot),
        Intent::ClassesMissed => classes_missed(snapshot),
        Intent::ReachTarget { target } => reach_target(snapshot, *target),
        Intent::WhatIfMiss { count, threshold } => what_if_miss(snapshot, *count, *threshold),
        Intent::History => history(snapshot),
        Intent::Subject { subject } => subject_attendance(snapshot, subject),
        Intent::Improvement => improvement(snapshot),
        Intent::Analytics => analytics(snapshot),
        Intent::Status => status(snapshot),
        Intent::Help => HELP.to_string(),
    }
}

/// Rounds to two decimals, half away from zero, and drops trailing zeros:
/// `75.0` becomes `75`, `66.666` becomes `66.67`, `3.125` becomes `3.13`.
pub fn format_pct(value: f64) -> String {
    // Only odd multiples of 1/8 sit exactly halfway between two hundredths.
    let eighths = value * 8.0;
    let fixed = if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        format!("{:.2}", value + value.signum() * 0.001)
    } else {
        format!("{value:.2}")
    };
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn percentage(s: &AttendanceSnapshot) -> String {
    format!(
        "Your current attendance percentage is {}%. You've attended {} out of {} classes.",
        format_pct(s.percentage),
        s.attended_classes,
        s.total_classes
    )
}

fn missable(s: &AttendanceSnapshot, threshold: u32) -> String {
    let missable = projection::missable_classes(s.attended_classes, s.total_classes, threshold);
    tracing::debug!(
        threshold,
        signed = ?missable.and_then(Missable::as_signed),
        "missable classes"
    );

    match missable {
        Some(Missable::CanMiss(count)) => format!(
            "You can miss {count} more classes without dropping below the {threshold}% attendance requirement."
        ),
        Some(Missable::Deficit(ClassesNeeded::Classes(count))) => format!(
            "You're already below the {threshold}% attendance threshold. You need to attend {count} more classes to reach {threshold}%."
        ),
        Some(Missable::Deficit(ClassesNeeded::Unreachable)) => format!(
            "You're already below the {threshold}% attendance threshold, and it's mathematically impossible to reach {threshold}% no matter how many more classes you attend."
        ),
        None => NO_CLASSES.to_string(),
    }
}

fn projected(s: &AttendanceSnapshot, count: u32) -> String {
    let Some(projected) =
        projection::projected_percentage(s.attended_classes, s.total_classes, count)
    else {
        return NO_CLASSES.to_string();
    };

    let threshold = DEFAULT_THRESHOLD;
    let current = s.percentage;
    let mut note = String::new();
    if current < threshold as f64 && projected >= threshold as f64 {
        note = format!(" This would bring you above the minimum requirement of {threshold}%.");
    } else if current < threshold as f64 {
        let still_needed = projection::classes_needed_for_target(
            s.attended_classes.saturating_add(count),
            s.total_classes.saturating_add(count),
            threshold,
        );
        if let Some(still_needed) = still_needed.count() {
            note = format!(
                " However, you would still need {still_needed} more classes after that to reach the minimum requirement of {threshold}%."
            );
        }
    }

    format!(
        "If you attend {count} more classes, your attendance would increase from {}% to {}%.{note}",
        format_pct(current),
        format_pct(projected)
    )
}

fn at_risk(s: &AttendanceSnapshot, threshold: u32) -> String {
    let current = s.percentage;
    if current < threshold as f64 {
        let deficit = format_pct(threshold as f64 - current);
        return match projection::classes_needed_for_target(
            s.attended_classes,
            s.total_classes,
            threshold,
        ) {
            ClassesNeeded::Unreachable => format!(
                "Your attendance ({}%) is {deficit}% below the minimum requirement of {threshold}%. Unfortunately, it's mathematically impossible to reach the minimum threshold this semester.",
                format_pct(current)
            ),
            ClassesNeeded::Classes(count) => format!(
                "Your attendance ({}%) is {deficit}% below the minimum requirement of {threshold}%. You need to attend at least {count} more consecutive classes to reach the minimum requirement.",
                format_pct(current)
            ),
        };
    }

    format!(
        "You're doing well! Your attendance ({}%) is {}% above the minimum requirement of {threshold}%. You can miss up to {} classes and still meet the minimum requirement.",
        format_pct(current),
        format_pct(current - threshold as f64),
        spare_classes(s.attended_classes, s.total_classes, threshold)
    )
}

fn classes_attended(s: &AttendanceSnapshot) -> String {
    format!(
        "You've attended {} out of {} total classes. Your attendance rate is {}%.",
        s.attended_classes,
        s.total_classes,
        format_pct(s.percentage)
    )
}

fn classes_missed(s: &AttendanceSnapshot) -> String {
    format!(
        "You've missed {} out of {} total classes. Your absence rate is {}%.",
        s.missed_classes(),
        s.total_classes,
        format_pct(100.0 - s.percentage)
    )
}

fn reach_target(s: &AttendanceSnapshot, target: u32) -> String {
    let current = s.percentage;
    if current >= target as f64 {
        return format!(
            "You've already achieved {}%, which is above your target of {target}%!",
            format_pct(current)
        );
    }

    match projection::classes_needed_for_target(s.attended_classes, s.total_classes, target) {
        ClassesNeeded::Unreachable => {
            let best = projection::projected_percentage(
                s.attended_classes,
                s.total_classes,
                BEST_CASE_HORIZON,
            )
            .unwrap_or(current);
            format!(
                "It's mathematically impossible to reach {target}% with your current attendance record. The maximum possible percentage you can achieve is {}% (even if you attend {BEST_CASE_HORIZON} more classes).",
                format_pct(best)
            )
        }
        ClassesNeeded::Classes(count) => {
            let reached =
                projection::projected_percentage(s.attended_classes, s.total_classes, count)
                    .unwrap_or(current);
            format!(
                "To reach {target}%, you need to attend {count} more consecutive classes without missing any. This would increase your attendance from {}% to approximately {}%.",
                format_pct(current),
                format_pct(reached)
            )
        }
    }
}

fn what_if_miss(s: &AttendanceSnapshot, count: u32, threshold: u32) -> String {
    let current = s.percentage;
    let Some(dropped) =
        projection::percentage_after_missing(s.attended_classes, s.total_classes, count)
    else {
        return NO_CLASSES.to_string();
    };

    let mut risk = String::new();
    if dropped < threshold as f64 {
        let needed = projection::classes_needed_for_target(
            s.attended_classes,
            s.total_classes.saturating_add(count),
            threshold,
        );
        if current >= threshold as f64 {
            risk = format!("⚠️ This would put you below the minimum requirement of {threshold}%. ");
            match needed {
                ClassesNeeded::Unreachable => {
                    let _ = write!(
                        risk,
                        "Once you miss these classes, it would be impossible to reach {threshold}% again this semester."
                    );
                }
                ClassesNeeded::Classes(n) => {
                    let _ = write!(
                        risk,
                        "You would then need to attend {n} more consecutive classes to get back above {threshold}%."
                    );
                }
            }
        } else {
            risk = format!(
                "⚠️ This would further reduce your attendance which is already below the minimum requirement of {threshold}%. "
            );
            match needed {
                ClassesNeeded::Unreachable => {
                    let _ = write!(
                        risk,
                        "It would become impossible to reach {threshold}% this semester."
                    );
                }
                ClassesNeeded::Classes(n) => {
                    let _ = write!(
                        risk,
                        "You would then need to attend {n} more consecutive classes to reach {threshold}%."
                    );
                }
            }
        }
    }

    let reply = format!(
        "If you miss {count} more classes, your attendance would drop from {}% to {}% (a decrease of {}%). {risk}",
        format_pct(current),
        format_pct(dropped),
        format_pct(current - dropped)
    );
    reply.trim_end().to_string()
}

fn history(s: &AttendanceSnapshot) -> String {
    let details = &s.attendance_details;
    if details.is_empty() {
        return format!(
            "Your overall attendance is {}%. Detailed history isn't available at the moment.",
            format_pct(s.percentage)
        );
    }

    let recent = &details[details.len().saturating_sub(RECENT_WINDOW)..];
    let lines: Vec<String> = recent
        .iter()
        .map(|record| {
            let mark = if record.is_present() {
                "✓ Present"
            } else {
                "✗ Absent"
            };
            format!("{}: {mark}", record.date.format("%-m/%-d/%Y"))
        })
        .collect();

    let trend = match projection::trend(details) {
        Some(trend) => match trend.direction {
            TrendDirection::Improving => format!(
                "Your attendance is improving over time ({}% → {}%).",
                format_pct(trend.earlier_pct),
                format_pct(trend.later_pct)
            ),
            TrendDirection::Declining => format!(
                "Your attendance is declining over time ({}% → {}%).",
                format_pct(trend.earlier_pct),
                format_pct(trend.later_pct)
            ),
            TrendDirection::Stable => format!(
                "Your attendance has been consistent over time ({}%).",
                format_pct(trend.earlier_pct)
            ),
        },
        None => "There aren't enough records yet to show a trend.".to_string(),
    };

    format!(
        "Your recent attendance history:\n\n{}\n\n{trend}\n\nOverall attendance: {}%.",
        lines.join("\n"),
        format_pct(s.percentage)
    )
}

fn subject_attendance(s: &AttendanceSnapshot, subject: &str) -> String {
    let data = s
        .subject_wise
        .get(&subject.to_lowercase())
        .filter(|data| data.total > 0);
    let Some(data) = data else {
        return format!(
            "I don't have subject-specific data for {subject}. Your overall attendance is {}%.",
            format_pct(s.percentage)
        );
    };

    let threshold = DEFAULT_THRESHOLD;
    let risk = if data.percentage < threshold as f64 {
        match projection::classes_needed_for_target(data.attended, data.total, threshold) {
            ClassesNeeded::Unreachable => format!(
                "⚠️ It's not possible to reach the minimum requirement ({threshold}%) for this subject."
            ),
            ClassesNeeded::Classes(count) => format!(
                "⚠️ You need to attend {count} more classes to reach the minimum requirement ({threshold}%)."
            ),
        }
    } else {
        format!(
            "You can miss up to {} more classes while maintaining the minimum requirement.",
            spare_classes(data.attended, data.total, threshold)
        )
    };

    format!(
        "For {subject}, your attendance is {}%. You've attended {} out of {} classes. {risk}",
        format_pct(data.percentage),
        data.attended,
        data.total
    )
}

fn improvement(s: &AttendanceSnapshot) -> String {
    let current = s.percentage;
    let minimum = DEFAULT_THRESHOLD;
    let excellent = EXCELLENT_THRESHOLD;

    if current >= excellent as f64 {
        return format!(
            "Your attendance is excellent at {}%! Just maintain your current regularity.",
            format_pct(current)
        );
    }

    if current >= minimum as f64 {
        return match projection::classes_needed_for_target(
            s.attended_classes,
            s.total_classes,
            excellent,
        ) {
            ClassesNeeded::Unreachable => format!(
                "Your attendance is good at {}%, above the minimum requirement. However, it's not mathematically possible to reach {excellent}% this semester.\n\n\
Some tips to maintain good attendance:\n\
1. Set reminders for classes\n\
2. Plan your schedule ahead to avoid conflicts\n\
3. Maintain a healthy routine to avoid sick days",
                format_pct(current)
            ),
            ClassesNeeded::Classes(count) => format!(
                "Your attendance is good at {}%, above the minimum requirement. To reach an excellent level ({excellent}%), try to attend the next {count} classes without missing any.\n\n\
Some strategies that can help:\n\
1. Set calendar reminders 15 minutes before each class\n\
2. Find a study buddy to hold each other accountable\n\
3. Track your progress weekly to stay motivated",
                format_pct(current)
            ),
        };
    }

    match projection::classes_needed_for_target(s.attended_classes, s.total_classes, minimum) {
        ClassesNeeded::Unreachable => format!(
            "Your attendance of {}% is below the minimum requirement of {minimum}%. Unfortunately, it's mathematically impossible to reach the minimum threshold this semester.\n\n\
You should speak with your academic advisor about your options, which may include:\n\
1. Requesting special consideration\n\
2. Taking remedial assignments\n\
3. Discussing course withdrawal options if it's still early enough",
            format_pct(current)
        ),
        ClassesNeeded::Classes(count) => format!(
            "Your attendance of {}% is below the minimum requirement of {minimum}%. You should attend at least {count} more classes without missing any to reach the minimum threshold.\n\n\
Here's an improvement plan:\n\
1. Start attending every class immediately - you need {count} consecutive classes\n\
2. Set multiple reminders for each class day\n\
3. Create a clear schedule and eliminate conflicts\n\
4. Consider discussing your situation with an academic advisor",
            format_pct(current)
        ),
    }
}

fn analytics(s: &AttendanceSnapshot) -> String {
    let threshold = DEFAULT_THRESHOLD;
    let excellent = EXCELLENT_THRESHOLD;
    let present_pct = s.percentage;
    let (attended, total) = (s.attended_classes, s.total_classes);
    let remaining = s.total_remaining_classes;

    let minimum_needed = projection::classes_needed_for_target(attended, total, threshold);
    let excellent_needed = projection::classes_needed_for_target(attended, total, excellent);
    let all_remaining =
        projection::projected_percentage(attended, total, remaining).unwrap_or(present_pct);

    let status = if present_pct >= excellent as f64 {
        "🟢 Excellent".to_string()
    } else if present_pct >= threshold as f64 {
        "🟡 Satisfactory".to_string()
    } else if let ClassesNeeded::Classes(count) = minimum_needed {
        format!("🟠 Below requirement (need {count} more classes)")
    } else {
        "🔴 Cannot reach minimum requirement".to_string()
    };

    let mut output = String::new();
    let _ = writeln!(output, "📊 Attendance Analytics:");
    let _ = writeln!(output);
    let _ = writeln!(output, "Days Present: {attended} ({}%)", format_pct(present_pct));
    let _ = writeln!(
        output,
        "Days Absent: {} ({}%)",
        s.missed_classes(),
        format_pct(100.0 - present_pct)
    );
    let _ = writeln!(output, "Attendance Status: {status}");

    if let Some(recent) = projection::recent_rate(&s.attendance_details, RECENT_WINDOW) {
        let comparison = if recent > present_pct {
            "shows improvement over your overall average"
        } else if recent < present_pct {
            "has declined compared to your overall average"
        } else {
            "is consistent with your overall average"
        };
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Trend Analysis: Your recent attendance ({}% in the last {RECENT_WINDOW} classes) {comparison}.",
            format_pct(recent)
        );
    }

    let _ = writeln!(output);
    match projection::missable_classes(attended, total, threshold) {
        Some(Missable::CanMiss(count)) => {
            let _ = writeln!(
                output,
                "You can miss up to {count} more classes while maintaining minimum requirements."
            );
        }
        Some(Missable::Deficit(ClassesNeeded::Classes(count))) => {
            let _ = writeln!(
                output,
                "You can't miss any more classes. You need to attend {count} consecutive classes to reach minimum requirements."
            );
        }
        Some(Missable::Deficit(ClassesNeeded::Unreachable)) | None => {
            let _ = writeln!(
                output,
                "You can't miss any more classes, and the minimum requirement can no longer be reached."
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Projections:");
    if minimum_needed == ClassesNeeded::Unreachable {
        let _ = writeln!(
            output,
            "- Even if you attend all remaining classes ({}%), you cannot reach the minimum threshold of {threshold}%",
            format_pct(all_remaining)
        );
    } else {
        let half_remaining =
            projection::projected_partial(attended, total, remaining as f64 / 2.0, remaining)
                .unwrap_or(present_pct);
        let _ = writeln!(
            output,
            "- If you attend all remaining classes: You'll reach {}%",
            format_pct(all_remaining)
        );
        let _ = writeln!(
            output,
            "- If you attend half of remaining classes: You'll reach {}%",
            format_pct(half_remaining)
        );
    }

    let _ = writeln!(output);
    match minimum_needed {
        ClassesNeeded::Classes(count) => {
            let _ = writeln!(
                output,
                "To reach minimum attendance ({threshold}%), attend {count} more consecutive classes."
            );
        }
        ClassesNeeded::Unreachable => {
            let _ = writeln!(
                output,
                "It's mathematically impossible to reach minimum attendance ({threshold}%) this semester."
            );
        }
    }
    match excellent_needed {
        ClassesNeeded::Classes(count) => {
            let _ = write!(
                output,
                "To reach excellent attendance ({excellent}%), attend {count} more consecutive classes."
            );
        }
        ClassesNeeded::Unreachable => {
            let _ = write!(
                output,
                "It's not possible to reach excellent attendance ({excellent}%) this semester."
            );
        }
    }

    output
}

fn status(s: &AttendanceSnapshot) -> String {
    let threshold = DEFAULT_THRESHOLD;
    let current = s.percentage;

    let badge = if current >= EXCELLENT_THRESHOLD as f64 {
        format!("🟢 Excellent: Your attendance ({}%) is outstanding!", format_pct(current))
    } else if current >= threshold as f64 {
        format!("🟡 Good: Your attendance ({}%) meets requirements.", format_pct(current))
    } else {
        format!("🟠 At Risk: Your attendance ({}%) is below requirements.", format_pct(current))
    };

    let requirement = if current >= threshold as f64 {
        format!(
            "You can miss up to {} more classes while maintaining minimum requirements.",
            spare_classes(s.attended_classes, s.total_classes, threshold)
        )
    } else {
        let needed =
            projection::classes_needed_for_target(s.attended_classes, s.total_classes, threshold);
        match needed {
            ClassesNeeded::Unreachable => format!(
                "It's mathematically impossible to reach the minimum requirement ({threshold}%) this semester."
            ),
            ClassesNeeded::Classes(count) => format!(
                "You need to attend {count} more consecutive classes to reach the minimum requirement ({threshold}%)."
            ),
        }
    };

    let mut output = String::new();
    let _ = writeln!(output, "Attendance Summary:");
    let _ = writeln!(output);
    let _ = writeln!(output, "{badge}");
    let _ = writeln!(output);
    let _ = writeln!(output, "{requirement}");
    let _ = writeln!(output);

    if let Some(recent) = projection::recent_rate(&s.attendance_details, RECENT_WINDOW) {
        let _ = writeln!(
            output,
            "Your recent attendance rate (last {RECENT_WINDOW} classes) is {}%.",
            format_pct(recent)
        );
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "Quick Stats:");
    let _ = writeln!(output, "- Total classes: {}", s.total_classes);
    let _ = writeln!(output, "- Classes attended: {}", s.attended_classes);
    let _ = writeln!(output, "- Current percentage: {}%", format_pct(current));
    let _ = write!(output, "- Minimum required: {threshold}%");

    output
}

// Zero when the snapshot's rounded percentage and the exact integer check disagree at the boundary.
fn spare_classes(attended: u32, total: u32, threshold: u32) -> u32 {
    match projection::missable_classes(attended, total, threshold) {
        Some(Missable::CanMiss(count)) => count,
        _ => 0,
    }
}
