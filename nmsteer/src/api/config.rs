//! Tunables for access point visibility and band steering.

use std::time::Duration;

use crate::types::constants::{strength, timeouts};

/// Configuration for [`ApManager`](crate::ApManager).
///
/// All fields have sensible defaults; use the `with_*` methods to override
/// individual values.
///
/// # Example
///
/// ```rust
/// use nmsteer::SteeringConfig;
/// use std::time::Duration;
///
/// let config = SteeringConfig::new()
///     .with_debounce(Duration::from_secs(3))
///     .with_min_strength_gain(25);
///
/// assert_eq!(config.debounce, Duration::from_secs(3));
/// assert_eq!(config.min_strength_gain, 25);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteeringConfig {
    /// Delay used to coalesce scan bursts before a steering pass.
    pub debounce: Duration,
    /// A 5 GHz link stronger than this is never steered automatically.
    pub strength_threshold: u8,
    /// Minimum strength a candidate must gain over the current AP
    /// before an automatic switch.
    pub min_strength_gain: u8,
    /// Inactive APs with strength in `1..ignore_below_strength` are hidden.
    pub ignore_below_strength: u8,
    /// Whether scan results schedule automatic steering passes.
    pub steering_enabled: bool,
}

impl Default for SteeringConfig {
    /// Defaults:
    /// - `debounce`: 10 seconds
    /// - `strength_threshold`: 65
    /// - `min_strength_gain`: 20
    /// - `ignore_below_strength`: 10
    /// - `steering_enabled`: `true`
    fn default() -> Self {
        Self {
            debounce: timeouts::steering_debounce(),
            strength_threshold: strength::AUTO_CHANGE_THRESHOLD,
            min_strength_gain: strength::MIN_GAIN,
            ignore_below_strength: strength::IGNORE_BELOW,
            steering_enabled: true,
        }
    }
}

impl SteeringConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scan burst debounce delay.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the strength above which a 5 GHz link is left alone.
    pub fn with_strength_threshold(mut self, threshold: u8) -> Self {
        self.strength_threshold = threshold;
        self
    }

    /// Sets the minimum strength gain required for automatic steering.
    pub fn with_min_strength_gain(mut self, gain: u8) -> Self {
        self.min_strength_gain = gain;
        self
    }

    /// Sets the exclusive upper bound of the ignore window.
    pub fn with_ignore_below_strength(mut self, strength: u8) -> Self {
        self.ignore_below_strength = strength;
        self
    }

    /// Enables or disables automatic steering on scan results.
    pub fn with_steering_enabled(mut self, enabled: bool) -> Self {
        self.steering_enabled = enabled;
        self
    }
}
