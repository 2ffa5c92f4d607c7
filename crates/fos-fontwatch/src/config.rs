//! Watch Configuration

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use crate::{Result, WatchError};

/// Default test string. Characters are chosen so that their widths vary a lot
/// between the default fallback stacks.
pub const DEFAULT_TEST_STRING: &str = "BESbswy";

/// Default time before giving up on a font
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Delay between width checks
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Font watch configuration options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Time before the font is reported inactive (0 = default)
    pub timeout_ms: u64,

    /// Delay between width checks
    pub poll_interval_ms: u64,

    /// Characters rendered by the probes
    pub test_string: String,

    /// Fonts allowed to go active on the last-resort path. `None` allows all.
    pub metric_compatible_fonts: Option<HashSet<String>>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            test_string: DEFAULT_TEST_STRING.to_string(),
            metric_compatible_fonts: None,
        }
    }
}

impl WatchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_test_string(mut self, test_string: impl Into<String>) -> Self {
        self.test_string = test_string.into();
        self
    }

    pub fn with_metric_compatible_fonts<I, S>(mut self, fonts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metric_compatible_fonts = Some(fonts.into_iter().map(Into::into).collect());
        self
    }

    /// Effective timeout; zero means the default
    pub fn timeout(&self) -> Duration {
        match self.timeout_ms {
            0 => Duration::from_millis(DEFAULT_TIMEOUT_MS),
            ms => Duration::from_millis(ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// True if no allow-list was given or `name` is on it
    pub fn is_metric_compatible(&self, name: &str) -> bool {
        self.metric_compatible_fonts
            .as_ref()
            .is_none_or(|fonts| fonts.contains(name))
    }

    pub fn validate(&self) -> Result<()> {
        if self.test_string.is_empty() {
            return Err(WatchError::EmptyTestString);
        }
        if self.poll_interval_ms == 0 {
            return Err(WatchError::InvalidPollInterval);
        }
        Ok(())
    }
}
