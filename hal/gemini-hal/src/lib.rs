//! Gemini Hardware Abstraction Layer
//!
//! The Gemini link never touches registers itself. Everything it needs from
//! the board is injected through the traits in this crate, so the same
//! protocol code runs on a microcontroller and in host-side simulation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (instrument records, CLI)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  gemini-protocol (FrameCodec/BitChannel)│
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  gemini-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ embedded-hal  │       │  edge ISR +   │
//! │  GPIO / delay │       │   EdgeFlag    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`], [`gpio::EdgeInput`] - Digital lines
//! - [`time::MonotonicClock`] - Free-running microsecond clock
//! - [`time::DelayNs`] - Busy-wait delay (re-exported from embedded-hal)

#![no_std]
#![deny(unsafe_code)]

pub mod edge;
pub mod gpio;
pub mod time;

// Re-export key items at crate root for convenience
pub use edge::{EdgeFlag, FlaggedInput, PolledEdgeInput};
pub use gpio::{EdgeError, EdgeInput, HalInput, HalOutput, InputPin, OutputPin};
pub use time::{DelayNs, MonotonicClock};
