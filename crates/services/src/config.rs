use std::time::Duration;

/// Default namespace for local-store keys.
pub const DEFAULT_KEY_PREFIX: &str = "svenska:";

const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_SIGNAL_DURATION: Duration = Duration::from_secs(3);

/// Tunables for the daily-program engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyConfig {
    /// Prepended to every local-store key.
    pub key_prefix: String,
    /// Upper bound on a single local-store write.
    pub write_timeout: Duration,
    /// How long the "daily complete" signal stays visible.
    pub complete_signal_duration: Duration,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_owned(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            complete_signal_duration: DEFAULT_SIGNAL_DURATION,
        }
    }
}

impl DailyConfig {
    /// Defaults overridden by `SVENSKA_KEY_PREFIX`, `SVENSKA_WRITE_TIMEOUT_MS`
    /// and `SVENSKA_SIGNAL_MS`. Unparseable values keep the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(prefix) = lookup("SVENSKA_KEY_PREFIX") {
            config.key_prefix = prefix;
        }
        if let Some(timeout) = millis(&lookup, "SVENSKA_WRITE_TIMEOUT_MS") {
            config.write_timeout = timeout;
        }
        if let Some(duration) = millis(&lookup, "SVENSKA_SIGNAL_MS") {
            config.complete_signal_duration = duration;
        }
        config
    }

    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<Duration> {
    let raw = lookup(name)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Some(Duration::from_millis(ms)),
        _ => {
            tracing::warn!(var = name, value = %raw, "ignoring invalid duration");
            None
        }
    }
}
