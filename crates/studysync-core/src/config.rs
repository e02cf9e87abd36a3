//! Runtime configuration
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! rollover_check_secs = 30
//! notification_cap = 100
//!
//! [pomodoro]
//! work = 1500
//! short = 300
//! long = 900
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use studysync_model::PomodoroDurations;
use studysync_store::{DEFAULT_SUFFIX_LEN, MIN_SUFFIX_LEN};
use thiserror::Error;

/// Rejected configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Not valid TOML or wrong field types
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The rollover check would never fire
    #[error("rollover check interval must be positive")]
    ZeroRolloverInterval,

    /// Generated ids would collide too easily
    #[error("id suffix length {0} is below the minimum of {MIN_SUFFIX_LEN}")]
    IdSuffixTooShort(usize),

    /// Local keys need a namespace to be told apart from other data
    #[error("local key namespace must not be empty")]
    EmptyNamespace,
}

/// Tunables of a [`StudySync`](crate::StudySync) instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between daily stats date checks
    pub rollover_check_secs: u64,
    /// Trailing debounce of the pomodoro session count write, in ms
    pub sessions_debounce_ms: u64,
    /// Trailing debounce of the pomodoro total minutes write, in ms
    pub minutes_debounce_ms: u64,
    /// Notifications kept in the local cache
    pub notification_cap: usize,
    /// Random suffix length of generated ids
    pub id_suffix_len: usize,
    /// Prefix of every local key
    pub namespace: String,
    /// Timer durations until the user stores their own
    pub pomodoro: PomodoroDurations,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            rollover_check_secs: 60,
            sessions_debounce_ms: 500,
            minutes_debounce_ms: 1000,
            notification_cap: 50,
            id_suffix_len: DEFAULT_SUFFIX_LEN,
            namespace: "studysync".to_string(),
            pomodoro: PomodoroDurations::default(),
        }
    }
}

impl SyncConfig {
    /// Create a new config with defaults
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// [`ConfigError::Parse`] or any validation error.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Only if serialization itself fails.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check the invariants the runtime relies on
    ///
    /// # Errors
    /// The first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rollover_check_secs == 0 {
            return Err(ConfigError::ZeroRolloverInterval);
        }
        if self.id_suffix_len < MIN_SUFFIX_LEN {
            return Err(ConfigError::IdSuffixTooShort(self.id_suffix_len));
        }
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        Ok(())
    }

    /// Set the rollover check interval
    #[inline]
    #[must_use]
    pub fn with_rollover_check(mut self, every: Duration) -> Self {
        self.rollover_check_secs = every.as_secs();
        self
    }

    /// Set both pomodoro debounce windows
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, sessions: Duration, minutes: Duration) -> Self {
        self.sessions_debounce_ms = u64::try_from(sessions.as_millis()).unwrap_or(u64::MAX);
        self.minutes_debounce_ms = u64::try_from(minutes.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the notification cache cap
    #[inline]
    #[must_use]
    pub fn with_notification_cap(mut self, cap: usize) -> Self {
        self.notification_cap = cap;
        self
    }

    /// Set the id suffix length
    #[inline]
    #[must_use]
    pub fn with_id_suffix_len(mut self, len: usize) -> Self {
        self.id_suffix_len = len;
        self
    }

    /// Set the local key namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the default timer durations
    #[inline]
    #[must_use]
    pub fn with_pomodoro(mut self, durations: PomodoroDurations) -> Self {
        self.pomodoro = durations;
        self
    }

    /// Rollover check interval
    #[must_use]
    pub fn rollover_check(&self) -> Duration {
        Duration::from_secs(self.rollover_check_secs)
    }

    /// Session count debounce window
    #[must_use]
    pub fn sessions_debounce(&self) -> Duration {
        Duration::from_millis(self.sessions_debounce_ms)
    }

    /// Total minutes debounce window
    #[must_use]
    pub fn minutes_debounce(&self) -> Duration {
        Duration::from_millis(self.minutes_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = SyncConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.rollover_check(), Duration::from_secs(60));
        assert_eq!(config.sessions_debounce(), Duration::from_millis(500));
        assert_eq!(config.minutes_debounce(), Duration::from_secs(1));
        assert_eq!(config.notification_cap, 50);
        assert_eq!(config.id_suffix_len, 9);
        assert_eq!(config.pomodoro.work, 1800);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = SyncConfig::from_toml_str(
            "notification_cap = 10\n\n[pomodoro]\nwork = 1500\nshort = 300\nlong = 600\n",
        )
        .unwrap();
        assert_eq!(config.notification_cap, 10);
        assert_eq!(config.pomodoro.work, 1500);
        assert_eq!(config.pomodoro.long, 600);
        assert_eq!(config.rollover_check_secs, 60);
        assert_eq!(config.namespace, "studysync");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            SyncConfig::from_toml_str("rollover_check_secs = 0"),
            Err(ConfigError::ZeroRolloverInterval)
        ));
        assert!(matches!(
            SyncConfig::from_toml_str("id_suffix_len = 3"),
            Err(ConfigError::IdSuffixTooShort(3))
        ));
        assert!(matches!(
            SyncConfig::from_toml_str("namespace = \"  \""),
            Err(ConfigError::EmptyNamespace)
        ));
        assert!(matches!(
            SyncConfig::from_toml_str("notification_cap = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rendered_toml_parses_back() {
        let config = SyncConfig::new()
            .with_notification_cap(20)
            .with_debounce(Duration::from_millis(250), Duration::from_millis(750))
            .with_namespace("custom");
        let text = config.to_toml_string().unwrap();
        assert_eq!(SyncConfig::from_toml_str(&text).unwrap(), config);
    }
}
