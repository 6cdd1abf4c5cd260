//! Defines all configuration structures for the clock.
//!
//! These structs are deserialized with `serde` from a layered source built by
//! the `config` crate: an optional TOML file, then `TICKCAST_*` environment
//! variables. Every field has a default, so an empty source yields a working
//! one-second topic clock in the host's local timezone.

use crate::common::Topic;
use anyhow::Context;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// The environment prefix for configuration overrides, e.g. `TICKCAST_TICK_MILLIS`.
pub const ENV_PREFIX: &str = "TICKCAST";

/// The top-level configuration for a clock and the demo binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Which subject the demo binary builds.
    pub variant: ClockVariant,

    /// Milliseconds between ticks.
    pub tick_millis: u64,

    /// The IANA timezone used to sample wall-clock time (e.g. "Asia/Taipei").
    /// The host's local timezone is used when unset.
    pub timezone: Option<Tz>,

    /// What the ticker does when a notification round overruns the interval.
    pub missed_ticks: MissedTicks,

    /// Topic names the demo observer subscribes to. Unknown names are skipped.
    pub topics: Vec<String>,

    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: String,
}

/// Selects between the topic-scoped and the flat subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockVariant {
    /// Observers subscribe per topic; ticks cascade second -> minute -> punctually.
    Topics,
    /// Every observer is notified on every tick.
    Simple,
}

/// Mirrors tokio's `MissedTickBehavior` in a deserializable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissedTicks {
    /// Fire the missed ticks back to back.
    Burst,
    /// Restart the interval from the late tick.
    Delay,
    /// Drop missed ticks and wait for the next aligned one.
    Skip,
}

impl From<MissedTicks> for MissedTickBehavior {
    fn from(value: MissedTicks) -> Self {
        match value {
            MissedTicks::Burst => MissedTickBehavior::Burst,
            MissedTicks::Delay => MissedTickBehavior::Delay,
            MissedTicks::Skip => MissedTickBehavior::Skip,
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            variant: ClockVariant::Topics,
            tick_millis: 1000,
            timezone: None,
            missed_ticks: MissedTicks::Delay,
            topics: default_topics(),
            log_level: "info".to_string(),
        }
    }
}

impl ClockConfig {
    /// Loads the configuration from an optional TOML file and the environment.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("topics"),
            )
            .build()
            .context("failed to assemble clock configuration")?;
        settings
            .try_deserialize()
            .context("invalid clock configuration")
    }

    /// The tick interval. Never shorter than one millisecond.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

fn default_topics() -> Vec<String> {
    Topic::ALL
        .iter()
        .map(|topic| topic.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, PoisonError};

    // Tests that read the process environment must not interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_describe_a_one_second_topic_clock() {
        let config = ClockConfig::default();
        assert_eq!(config.variant, ClockVariant::Topics);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.missed_ticks, MissedTicks::Delay);
        assert_eq!(config.topics, vec!["second", "minute", "punctually"]);
        assert!(config.timezone.is_none());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = ClockConfig {
            tick_millis: 0,
            ..Default::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
    }

    #[test]
    fn loads_toml_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let path = std::env::temp_dir().join(format!("tickcast-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
variant = "simple"
tick_millis = 250
timezone = "Asia/Taipei"
missed_ticks = "skip"
topics = ["minute"]
"#
        )
        .unwrap();
        drop(file);

        let config = ClockConfig::load(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.variant, ClockVariant::Simple);
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.timezone, Some(chrono_tz::Asia::Taipei));
        assert_eq!(config.missed_ticks, MissedTicks::Skip);
        assert_eq!(config.topics, vec!["minute"]);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let _env = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let path = std::env::temp_dir().join("tickcast-does-not-exist.toml");
        let config = ClockConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.tick_millis, 1000);
    }

    #[test]
    fn environment_overrides_the_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let path = std::env::temp_dir().join(format!("tickcast-env-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "variant = \"simple\"\ntick_millis = 250\ntopics = [\"second\"]\n",
        )
        .unwrap();
        std::env::set_var("TICKCAST_TICK_MILLIS", "500");
        std::env::set_var("TICKCAST_TOPICS", "minute,punctually");

        let loaded = ClockConfig::load(Some(path.as_path()));
        std::env::remove_var("TICKCAST_TICK_MILLIS");
        std::env::remove_var("TICKCAST_TOPICS");
        std::fs::remove_file(&path).ok();

        let config = loaded.unwrap();
        assert_eq!(config.tick_millis, 500);
        assert_eq!(config.topics, vec!["minute", "punctually"]);
        assert_eq!(config.variant, ClockVariant::Simple);
    }
}
