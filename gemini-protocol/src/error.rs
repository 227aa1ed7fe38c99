//! Error types for link setup and transmission
//!
//! Frame timeouts and handshake timeouts are not errors: they are recovered
//! from internally and only show up in counters.

use gemini_hal::EdgeError;

use crate::config::ConfigError;

/// Errors that make the link unusable until corrected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupError {
    /// The input line cannot report rising edges
    Edge(EdgeError),
    /// Timing values do not fit together
    InvalidConfig(ConfigError),
    /// A zero-length frame buffer was supplied
    EmptyFrameBuffer,
}

impl From<EdgeError> for SetupError {
    fn from(err: EdgeError) -> Self {
        SetupError::Edge(err)
    }
}

impl From<ConfigError> for SetupError {
    fn from(err: ConfigError) -> Self {
        SetupError::InvalidConfig(err)
    }
}

/// Errors when queueing outbound data
///
/// A failed send never leaves a partial byte or frame in the outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// Not enough free space in the outbound FIFO
    OutputFull,
    /// Frame has more sub-frames than fit in one outbound FIFO
    FrameTooLong,
}
