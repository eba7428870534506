//! Session tunables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FfbError, FfbResult};
use crate::ids::{BASELINE_AUTOCENTER, hidpp};

/// Timing and addressing knobs for one wheel session.
///
/// The defaults are the values real wheels are known to answer within; the
/// slice and the timeouts together bound the worst-case latency of every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Granularity of every reply poll.
    pub poll_slice_ms: u64,
    /// Per-attempt deadline while negotiating.
    pub ping_timeout_ms: u64,
    /// Per-policy deadline while resolving a feature.
    pub feature_timeout_ms: u64,
    /// Per-command deadline for effect lifecycle calls.
    pub command_timeout_ms: u64,
    /// Software id in the low nibble of root function bytes, 1..=15.
    pub sw_id: u8,
    pub ping_tag: u8,
    /// Device indices tried during negotiation, in order.
    pub candidate_indices: Vec<u8>,
    /// Autocenter magnitude restored after a stop.
    pub baseline_autocenter: u16,
    /// Stop forces and re-enable autocenter when the session closes.
    pub restore_on_close: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_slice_ms: 10,
            ping_timeout_ms: 250,
            feature_timeout_ms: 250,
            command_timeout_ms: 50,
            sw_id: hidpp::DEFAULT_SW_ID,
            ping_tag: hidpp::PING_TAG,
            candidate_indices: hidpp::CANDIDATE_INDICES.to_vec(),
            baseline_autocenter: BASELINE_AUTOCENTER,
            restore_on_close: true,
        }
    }
}

impl SessionConfig {
    /// Reject settings that would make a session hang or never match.
    pub fn validate(&self) -> FfbResult<()> {
        if self.poll_slice_ms == 0 {
            return Err(FfbError::InvalidConfig(
                "poll_slice_ms must be non-zero".to_string(),
            ));
        }
        for (name, value) in [
            ("ping_timeout_ms", self.ping_timeout_ms),
            ("feature_timeout_ms", self.feature_timeout_ms),
            ("command_timeout_ms", self.command_timeout_ms),
        ] {
            if value == 0 {
                return Err(FfbError::InvalidConfig(format!("{name} must be non-zero")));
            }
        }
        if self.candidate_indices.is_empty() {
            return Err(FfbError::InvalidConfig(
                "candidate_indices must not be empty".to_string(),
            ));
        }
        if !(1..=15).contains(&self.sw_id) {
            return Err(FfbError::InvalidConfig(format!(
                "sw_id {} outside 1..=15",
                self.sw_id
            )));
        }
        Ok(())
    }

    pub fn poll_slice(&self) -> Duration {
        Duration::from_millis(self.poll_slice_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn feature_timeout(&self) -> Duration {
        Duration::from_millis(self.feature_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() -> Result<(), Box<dyn std::error::Error>> {
        let config = SessionConfig::default();
        config.validate()?;
        assert_eq!(config.poll_slice(), Duration::from_millis(10));
        assert_eq!(config.ping_timeout(), Duration::from_millis(250));
        assert_eq!(config.command_timeout(), Duration::from_millis(50));
        assert_eq!(config.candidate_indices.len(), 8);
        Ok(())
    }

    #[test]
    fn test_rejects_zero_slice() {
        let config = SessionConfig {
            poll_slice_ms: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(FfbError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = SessionConfig {
            command_timeout_ms: 0,
            ..SessionConfig::default()
        };
        let err = config.validate().err();
        assert!(
            err.map(|e| e.to_string().contains("command_timeout_ms"))
                .unwrap_or(false)
        );
    }

    #[test]
    fn test_rejects_empty_candidates_and_bad_sw_id() {
        let config = SessionConfig {
            candidate_indices: Vec::new(),
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(FfbError::InvalidConfig(_))));

        let config = SessionConfig {
            sw_id: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(FfbError::InvalidConfig(_))));

        let config = SessionConfig {
            sw_id: 0x10,
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(FfbError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_fills_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let config: SessionConfig = serde_json::from_str(r#"{"command_timeout_ms": 80}"#)?;
        assert_eq!(config.command_timeout_ms, 80);
        assert_eq!(config.poll_slice_ms, 10);
        assert_eq!(config.sw_id, 0x0E);
        Ok(())
    }
}
