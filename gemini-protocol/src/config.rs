//! Link timing configuration
//!
//! All values are fixed when the channel is built. Only the frame timeout
//! can be changed afterwards (see `BitChannel::set_frame_timeout`).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default idle time after which the current frame is considered ended
pub const DEFAULT_FRAME_TIMEOUT_US: u32 = 50_000;

/// Errors found when validating a [`GeminiConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Sampling would happen before a zero bit's write pulse has ended
    ReadDelayTooShort,
    /// Frame timeout of zero would end every frame immediately
    ZeroFrameTimeout,
    /// Handshake timeout shorter than the peer's own sample delay
    HandshakeTooShort,
    /// Handshake timeout not below the frame timeout
    HandshakeExceedsFrameTimeout,
}

/// Timing and role of one end of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeminiConfig {
    /// Width of the leading high pulse that marks every bit (µs)
    pub write_pulse_us: u32,
    /// Longest wait for the peer's acknowledging edge (µs)
    ///
    /// `None` waits forever: a silent peer then stalls the channel until
    /// its next edge arrives.
    pub handshake_timeout_us: Option<u32>,
    /// Delay from the peer's edge to sampling the input line (µs)
    pub read_delay_us: u32,
    /// Minimum hold time after the peer's acknowledge before releasing the
    /// output line (µs)
    pub write_delay_us: u32,
    /// Idle time after which the frame-end flag is raised (µs)
    pub frame_timeout_us: u32,
    /// Whether this end may start an exchange on its own
    pub can_initiate: bool,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            write_pulse_us: 10,
            handshake_timeout_us: Some(5_000),
            read_delay_us: 170,
            write_delay_us: 90,
            frame_timeout_us: DEFAULT_FRAME_TIMEOUT_US,
            can_initiate: true,
        }
    }
}

impl GeminiConfig {
    /// Default timing for the end that only responds
    pub fn responder() -> Self {
        Self {
            can_initiate: false,
            ..Self::default()
        }
    }

    /// Check that the timing values can work together
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_delay_us <= self.write_pulse_us {
            return Err(ConfigError::ReadDelayTooShort);
        }

        if self.frame_timeout_us == 0 {
            return Err(ConfigError::ZeroFrameTimeout);
        }

        if let Some(handshake_us) = self.handshake_timeout_us {
            if handshake_us <= self.read_delay_us {
                return Err(ConfigError::HandshakeTooShort);
            }
            if handshake_us >= self.frame_timeout_us {
                return Err(ConfigError::HandshakeExceedsFrameTimeout);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(GeminiConfig::default().validate(), Ok(()));
        assert_eq!(GeminiConfig::responder().validate(), Ok(()));
        assert!(!GeminiConfig::responder().can_initiate);
    }

    #[test]
    fn test_read_delay_must_exceed_pulse() {
        let config = GeminiConfig {
            write_pulse_us: 20,
            read_delay_us: 20,
            ..GeminiConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ReadDelayTooShort));
    }

    #[test]
    fn test_zero_frame_timeout() {
        let config = GeminiConfig {
            frame_timeout_us: 0,
            handshake_timeout_us: None,
            ..GeminiConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroFrameTimeout));
    }

    #[test]
    fn test_handshake_bounds() {
        let too_short = GeminiConfig {
            handshake_timeout_us: Some(100),
            ..GeminiConfig::default()
        };
        assert_eq!(too_short.validate(), Err(ConfigError::HandshakeTooShort));

        let too_long = GeminiConfig {
            handshake_timeout_us: Some(DEFAULT_FRAME_TIMEOUT_US),
            ..GeminiConfig::default()
        };
        assert_eq!(
            too_long.validate(),
            Err(ConfigError::HandshakeExceedsFrameTimeout)
        );

        // Waiting forever is allowed
        let unbounded = GeminiConfig {
            handshake_timeout_us: None,
            ..GeminiConfig::default()
        };
        assert_eq!(unbounded.validate(), Ok(()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: GeminiConfig = toml::from_str(
            r#"
            read_delay_us = 200
            can_initiate = false
            "#,
        )
        .unwrap();

        assert_eq!(config.read_delay_us, 200);
        assert!(!config.can_initiate);
        assert_eq!(config.write_pulse_us, 10);
        assert_eq!(config.frame_timeout_us, DEFAULT_FRAME_TIMEOUT_US);
        assert_eq!(config.handshake_timeout_us, Some(5_000));
    }
}
