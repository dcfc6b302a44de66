use crate::extract::{
    extract_count, extract_subject, extract_target_percentage, extract_threshold, has_number,
    has_percentage, mentions_known_subject, DEFAULT_MISS_COUNT, DEFAULT_PROJECTION_COUNT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Percentage,
    Missable,
    Projection,
    AtRisk,
    ClassesAttended,
    ClassesMissed,
    ReachTarget,
    WhatIfMiss,
    History,
    Subject,
    Improvement,
    Analytics,
    Status,
    Help,
}

/// A classified query together with the parameters its handler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Percentage,
    Missable { threshold: u32 },
    Projection { count: u32 },
    AtRisk { threshold: u32 },
    ClassesAttended,
    ClassesMissed,
    ReachTarget { target: u32 },
    WhatIfMiss { count: u32, threshold: u32 },
    History,
    Subject { subject: String },
    Improvement,
    Analytics,
    Status,
    Help,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::Percentage => IntentKind::Percentage,
            Self::Missable { .. } => IntentKind::Missable,
            Self::Projection { .. } => IntentKind::Projection,
            Self::AtRisk { .. } => IntentKind::AtRisk,
            Self::ClassesAttended => IntentKind::ClassesAttended,
            Self::ClassesMissed => IntentKind::ClassesMissed,
            Self::ReachTarget { .. } => IntentKind::ReachTarget,
            Self::WhatIfMiss { .. } => IntentKind::WhatIfMiss,
            Self::History => IntentKind::History,
            Self::Subject { .. } => IntentKind::Subject,
            Self::Improvement => IntentKind::Improvement,
            Self::Analytics => IntentKind::Analytics,
            Self::Status => IntentKind::Status,
            Self::Help => IntentKind::Help,
        }
    }
}

impl IntentKind {
    fn with_parameters(self, query: &str) -> Intent {
        match self {
            Self::Percentage => Intent::Percentage,
            Self::Missable => Intent::Missable {
                threshold: extract_threshold(query),
            },
            Self::Projection => Intent::Projection {
                count: extract_count(query, DEFAULT_PROJECTION_COUNT),
            },
            Self::AtRisk => Intent::AtRisk {
                threshold: extract_threshold(query),
            },
            Self::ClassesAttended => Intent::ClassesAttended,
            Self::ClassesMissed => Intent::ClassesMissed,
            Self::ReachTarget => Intent::ReachTarget {
                target: extract_target_percentage(query),
            },
            Self::WhatIfMiss => Intent::WhatIfMiss {
                count: extract_count(query, DEFAULT_MISS_COUNT),
                threshold: extract_threshold(query),
            },
            Self::History => Intent::History,
            Self::Subject => Intent::Subject {
                subject: extract_subject(query),
            },
            Self::Improvement => Intent::Improvement,
            Self::Analytics => Intent::Analytics,
            Self::Status => Intent::Status,
            Self::Help => Intent::Help,
        }
    }
}

struct Rule {
    kind: IntentKind,
    matches: fn(&str) -> bool,
}

/// Declaration order is priority order.
const RULES: &[Rule] = &[
    Rule {
        kind: IntentKind::Percentage,
        matches: asks_percentage,
    },
    Rule {
        kind: IntentKind::Missable,
        matches: asks_missable,
    },
    Rule {
        kind: IntentKind::Projection,
        matches: asks_projection,
    },
    Rule {
        kind: IntentKind::AtRisk,
        matches: asks_at_risk,
    },
    Rule {
        kind: IntentKind::ClassesAttended,
        matches: asks_classes_attended,
    },
    Rule {
        kind: IntentKind::ClassesMissed,
        matches: asks_classes_missed,
    },
    Rule {
        kind: IntentKind::ReachTarget,
        matches: asks_reach_target,
    },
    Rule {
        kind: IntentKind::WhatIfMiss,
        matches: asks_what_if_miss,
    },
    Rule {
        kind: IntentKind::History,
        matches: asks_history,
    },
    Rule {
        kind: IntentKind::Subject,
        matches: asks_subject,
    },
    Rule {
        kind: IntentKind::Improvement,
        matches: asks_improvement,
    },
    Rule {
        kind: IntentKind::Analytics,
        matches: asks_analytics,
    },
    Rule {
        kind: IntentKind::Status,
        matches: asks_status,
    },
];

pub fn classify(query: &str) -> Intent {
    let query = query.to_lowercase();
    let kind = RULES
        .iter()
        .find(|rule| (rule.matches)(&query))
        .map(|rule| rule.kind)
        .unwrap_or(IntentKind::Help);

    let intent = kind.with_parameters(&query);
    tracing::debug!(kind = ?intent.kind(), %query, "classified query");
    intent
}

fn contains_any(query: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| query.contains(needle))
}

fn asks_percentage(q: &str) -> bool {
    contains_any(
        q,
        &[
            "attendance percentage",
            "my attendance",
            "percentage",
            "how am i doing",
            "how i'm doing",
        ],
    )
}

fn asks_missable(q: &str) -> bool {
    contains_any(
        q,
        &[
            "leaves",
            "absence",
            "absent",
            "miss",
            "skip",
            "how many classes can i miss",
        ],
    )
}

fn asks_projection(q: &str) -> bool {
    q.contains("if i attend")
        || (q.contains("will") && q.contains("percentage"))
        || q.contains("project")
}

fn asks_at_risk(q: &str) -> bool {
    contains_any(q, &["at risk", "danger", "failing", "minimum"])
        || (q.contains("will") && q.contains("pass"))
}

fn asks_classes_attended(q: &str) -> bool {
    contains_any(q, &["classes attended", "how many classes", "total classes"])
}

fn asks_classes_missed(q: &str) -> bool {
    contains_any(q, &["missed", "absences", "not attended"])
}

fn asks_reach_target(q: &str) -> bool {
    (contains_any(q, &["reach", "achieve", "get to"]) && has_percentage(q))
        || (q.contains("need") && q.contains("to attend"))
}

fn asks_what_if_miss(q: &str) -> bool {
    contains_any(q, &["miss", "skip"]) && has_number(q)
}

fn asks_history(q: &str) -> bool {
    contains_any(q, &["history", "trend", "pattern"])
}

fn asks_subject(q: &str) -> bool {
    contains_any(q, &["subject", "course"]) || mentions_known_subject(q)
}

fn asks_improvement(q: &str) -> bool {
    contains_any(q, &["improve", "get better", "increase"])
}

fn asks_analytics(q: &str) -> bool {
    contains_any(q, &["analytics", "statistics", "analysis", "detailed info"])
}

fn asks_status(q: &str) -> bool {
    contains_any(q, &["status", "summary", "overview"])
        || (q.contains("how") && q.contains("doing"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(query: &str) -> IntentKind {
        classify(query).kind()
    }

    #[test]
    fn each_rule_has_a_reachable_query() {
        let cases = [
            ("What's my attendance?", IntentKind::Percentage),
            ("How am I doing?", IntentKind::Percentage),
            ("How many leaves do I have left?", IntentKind::Missable),
            ("If I attend 10 more classes?", IntentKind::Projection),
            ("Am I at risk?", IntentKind::AtRisk),
            ("Will I pass?", IntentKind::AtRisk),
            ("How many classes have I been to?", IntentKind::ClassesAttended),
            ("Classes not attended", IntentKind::ClassesMissed),
            ("I want to reach 90%", IntentKind::ReachTarget),
            ("What do I need to attend now?", IntentKind::ReachTarget),
            ("Show my history", IntentKind::History),
            ("Attendance in physics", IntentKind::Subject),
            ("Subject breakdown", IntentKind::Subject),
            ("How can I improve?", IntentKind::Improvement),
            ("Show me attendance analytics", IntentKind::Analytics),
            ("Give me an overview", IntentKind::Status),
            ("How are things doing", IntentKind::Status),
            ("hello there", IntentKind::Help),
            ("", IntentKind::Help),
        ];

        for (query, expected) in cases {
            assert_eq!(kind(query), expected, "{query}");
        }
    }

    #[test]
    fn earlier_rules_shadow_later_ones() {
        // "miss" is caught before the what-if-miss rule can see the number.
        assert_eq!(kind("What if I miss 3 classes?"), IntentKind::Missable);
        // "missed" contains "miss".
        assert_eq!(kind("How many classes have I missed?"), IntentKind::Missable);
        // "percentage" is caught before "will" + "percentage".
        assert_eq!(kind("What will my percentage be?"), IntentKind::Percentage);
        // "how many classes" is caught before "reach" + "%".
        assert_eq!(kind("How many classes to reach 90%?"), IntentKind::ClassesAttended);
        // "history" is both a trend keyword and a known subject.
        assert_eq!(kind("Attendance in history"), IntentKind::History);
        // "my attendance" wins over everything else.
        assert_eq!(kind("Improve my attendance"), IntentKind::Percentage);
    }

    #[test]
    fn what_if_miss_needs_a_keyword_and_a_standalone_number() {
        assert!(asks_what_if_miss("what if i skip 2 classes"));
        assert!(asks_what_if_miss("miss 3"));
        assert!(!asks_what_if_miss("can i skip class"));
        assert!(!asks_what_if_miss("skip room b12"));
        assert!(!asks_what_if_miss("attend 4 classes"));
    }

    #[test]
    fn reach_requires_a_percentage() {
        assert_eq!(kind("Can I reach the goal?"), IntentKind::Help);
        assert_eq!(
            classify("Can I get to 85%?"),
            Intent::ReachTarget { target: 85 }
        );
    }

    #[test]
    fn parameters_are_extracted_per_intent() {
        assert_eq!(
            classify("Can I skip class and stay above 80%?"),
            Intent::Missable { threshold: 80 }
        );
        assert_eq!(classify("leaves left"), Intent::Missable { threshold: 75 });
        assert_eq!(
            classify("If I attend 12 more classes"),
            Intent::Projection { count: 12 }
        );
        assert_eq!(classify("Project ahead"), Intent::Projection { count: 5 });
        assert_eq!(
            classify("Am I in danger at 60%?"),
            Intent::AtRisk { threshold: 60 }
        );
        assert_eq!(
            classify("What about chemistry course?"),
            Intent::Subject {
                subject: "this course".to_string()
            }
        );
        assert_eq!(
            classify("Course attendance in Immunology"),
            Intent::Subject {
                subject: "immunology".to_string()
            }
        );
    }

    #[test]
    fn classification_ignores_case() {
        assert_eq!(classify("SHOW ME ANALYTICS"), Intent::Analytics);
        assert_eq!(classify("show me analytics"), Intent::Analytics);
    }
}
