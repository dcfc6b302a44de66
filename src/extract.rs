use std::sync::LazyLock;

use regex::Regex;

use crate::projection::DEFAULT_THRESHOLD;

pub const DEFAULT_SUBJECT: &str = "this course";
pub const DEFAULT_PROJECTION_COUNT: u32 = 5;
pub const DEFAULT_MISS_COUNT: u32 = 1;

static RE_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)%").expect("percent pattern"));

static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\b").expect("number pattern"));

static RE_SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)in ([a-z]+)").expect("subject pattern"));

static RE_KNOWN_SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)in (immunology|computational biology|english|history|physics|chemistry)")
        .expect("known subject pattern")
});

/// Threshold to stay above, from the first `<n>%` in the query.
pub fn extract_threshold(query: &str) -> u32 {
    first_percentage(query).unwrap_or(DEFAULT_THRESHOLD)
}

/// Target to reach, from the first `<n>%` in the query.
pub fn extract_target_percentage(query: &str) -> u32 {
    first_percentage(query).unwrap_or(DEFAULT_THRESHOLD)
}

/// First standalone integer in the query, or `default` when there is none.
pub fn extract_count(query: &str, default: u32) -> u32 {
    RE_NUMBER
        .captures(query)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(default)
}

/// Word following the first "in ", lowercased.
pub fn extract_subject(query: &str) -> String {
    RE_SUBJECT
        .captures(query)
        .map(|caps| caps[1].to_lowercase())
        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string())
}

pub fn has_percentage(query: &str) -> bool {
    RE_PERCENT.is_match(query)
}

/// True when `extract_count` would find a number rather than use its default.
pub fn has_number(query: &str) -> bool {
    RE_NUMBER.is_match(query)
}

pub fn mentions_known_subject(query: &str) -> bool {
    RE_KNOWN_SUBJECT.is_match(query)
}

// A zero or overflowing percentage is treated as absent.
fn first_percentage(query: &str) -> Option<u32> {
    RE_PERCENT
        .captures(query)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|value| *value > 0)
}
