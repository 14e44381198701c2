//! Engine timing settings.

use std::time::Duration;

/// Timing knobs for the launch engine.
///
/// Defaults mirror production behavior; tests and the simulate harness
/// inject short values instead of faking clocks.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Maximum wait for the conversion callback during acquisition.
    pub conversion_timeout: Duration,
    /// Poll interval while waiting for the conversion callback.
    pub conversion_poll_interval: Duration,
    /// Delay before the single organic re-verification.
    pub reverify_delay: Duration,
    /// Poll interval of the background connectivity observer.
    pub observe_interval: Duration,
    /// Cooldown before the permission screen may show again after a skip.
    pub permission_cooldown: chrono::Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            conversion_timeout: Duration::from_secs(15),
            conversion_poll_interval: Duration::from_millis(300),
            reverify_delay: Duration::from_secs(5),
            observe_interval: Duration::from_secs(1),
            permission_cooldown: chrono::Duration::hours(72),
        }
    }
}

impl EngineSettings {
    /// Sets the conversion wait timeout.
    pub fn with_conversion_timeout(mut self, timeout: Duration) -> Self {
        self.conversion_timeout = timeout;
        self
    }

    /// Sets the conversion poll interval.
    pub fn with_conversion_poll_interval(mut self, interval: Duration) -> Self {
        self.conversion_poll_interval = interval;
        self
    }

    /// Sets the organic re-verification delay.
    pub fn with_reverify_delay(mut self, delay: Duration) -> Self {
        self.reverify_delay = delay;
        self
    }

    /// Sets the connectivity observer poll interval.
    pub fn with_observe_interval(mut self, interval: Duration) -> Self {
        self.observe_interval = interval;
        self
    }

    /// Sets the permission skip cooldown.
    pub fn with_permission_cooldown(mut self, cooldown: chrono::Duration) -> Self {
        self.permission_cooldown = cooldown;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_production_values() {
        let settings = EngineSettings::default();
        assert_eq!(settings.conversion_timeout, Duration::from_secs(15));
        assert_eq!(settings.reverify_delay, Duration::from_secs(5));
        assert_eq!(settings.permission_cooldown, chrono::Duration::hours(72));
    }

    #[test]
    fn test_builder_overrides() {
        let settings = EngineSettings::default()
            .with_conversion_timeout(Duration::from_millis(50))
            .with_observe_interval(Duration::from_millis(5));
        assert_eq!(settings.conversion_timeout, Duration::from_millis(50));
        assert_eq!(settings.observe_interval, Duration::from_millis(5));
    }
}
