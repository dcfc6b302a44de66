use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::models::AttendanceSnapshot;
use crate::session::DEFAULT_REPLY_DELAY;
use crate::snapshot;

pub const SNAPSHOT_ENV: &str = "ATTENDANCE_SNAPSHOT";
pub const REPLY_DELAY_ENV: &str = "ASSISTANT_REPLY_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    pub snapshot_path: Option<PathBuf>,
    pub reply_delay: Duration,
}

impl AssistantConfig {
    /// Command-line values win over the environment.
    pub fn resolve(snapshot: Option<PathBuf>, reply_delay_ms: Option<u64>) -> anyhow::Result<Self> {
        Self::from_sources(snapshot, reply_delay_ms, |key| std::env::var(key).ok())
    }

    fn from_sources(
        snapshot: Option<PathBuf>,
        reply_delay_ms: Option<u64>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let snapshot_path = snapshot.or_else(|| env(SNAPSHOT_ENV).map(PathBuf::from));

        let reply_delay = match reply_delay_ms {
            Some(ms) => Duration::from_millis(ms),
            None => match env(REPLY_DELAY_ENV) {
                Some(raw) => Duration::from_millis(raw.trim().parse().with_context(|| {
                    format!("{REPLY_DELAY_ENV} must be milliseconds, got {raw:?}")
                })?),
                None => DEFAULT_REPLY_DELAY,
            },
        };

        Ok(Self {
            snapshot_path,
            reply_delay,
        })
    }

    /// `None` when no snapshot is configured; the assistant then answers without data.
    pub fn load_snapshot(&self) -> anyhow::Result<Option<AttendanceSnapshot>> {
        match &self.snapshot_path {
            Some(path) => snapshot::load_snapshot(path).map(Some),
            None => {
                tracing::warn!("no attendance snapshot configured");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_flags_or_env() {
        let config = AssistantConfig::from_sources(None, None, env(&[])).unwrap();
        assert_eq!(config.snapshot_path, None);
        assert_eq!(config.reply_delay, Duration::from_millis(500));
    }

    #[test]
    fn environment_fills_missing_flags() {
        let config = AssistantConfig::from_sources(
            None,
            None,
            env(&[(SNAPSHOT_ENV, "/tmp/course.json"), (REPLY_DELAY_ENV, "250")]),
        )
        .unwrap();
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/tmp/course.json")));
        assert_eq!(config.reply_delay, Duration::from_millis(250));
    }

    #[test]
    fn flags_override_environment() {
        let config = AssistantConfig::from_sources(
            Some(PathBuf::from("flag.json")),
            Some(0),
            env(&[(SNAPSHOT_ENV, "env.json"), (REPLY_DELAY_ENV, "250")]),
        )
        .unwrap();
        assert_eq!(config.snapshot_path, Some(PathBuf::from("flag.json")));
        assert_eq!(config.reply_delay, Duration::ZERO);
    }

    #[test]
    fn rejects_malformed_delay() {
        let error = AssistantConfig::from_sources(None, None, env(&[(REPLY_DELAY_ENV, "soon")]))
            .unwrap_err();
        assert!(error.to_string().contains(REPLY_DELAY_ENV));
    }

    #[test]
    fn missing_snapshot_path_means_no_data() {
        let config = AssistantConfig::from_sources(None, None, env(&[])).unwrap();
        assert_eq!(config.load_snapshot().unwrap(), None);
    }
}
