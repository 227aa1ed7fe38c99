//! Gemini Two-Wire Link
//!
//! A self-clocked, full-duplex bit exchange between two peers over one line
//! in each direction, with a byte-frame layer on top.
//!
//! # Protocol Overview
//!
//! Every bit is announced by a rising edge and acknowledged by the peer's
//! rising edge, which carries the peer's own bit. While an exchange runs,
//! both directions therefore move exactly one bit per handshake:
//!
//! ```text
//!   initiator                          responder
//!   edge + bit ──────────────────────>  sample after read delay
//!   sample after hold + read delay <──  edge + bit (or bare ack = 0)
//!   edge + next bit ─────────────────>  ...
//! ```
//!
//! The initiator alone may end an exchange. After `frame_timeout_us` without
//! bit activity the channel raises its frame-end flag.
//!
//! Bytes travel as sub-frames (a 1 start bit, then 8 data bits MSB first).
//! Zero bits outside a sub-frame are synchronization padding:
//!
//! ```text
//! ┌────────┬───────┬──────────────┬───────┬──────────────┬──────┐
//! │ SYNC   │ START │ DATA         │ START │ DATA         │ IDLE │
//! │ 0…     │ 1     │ 8 bits MSB   │ 1     │ 8 bits MSB   │      │
//! └────────┴───────┴──────────────┴───────┴──────────────┴──────┘
//! ```
//!
//! # Layers
//!
//! - [`BitFifo`] - fixed 64-bit queue, one per direction
//! - [`BitChannel`] - handshake state machine over the two lines
//! - [`FrameCodec`] - sub-frame assembly into a caller-owned buffer
//!
//! Nothing allocates and nothing blocks unless asked to; the application
//! calls `poll()` from its main loop every few microseconds.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod channel;
pub mod config;
pub mod error;
pub mod fifo;
pub mod frame;

#[cfg(test)]
mod sim;

pub use channel::{BitChannel, ChannelState};
pub use config::{ConfigError, GeminiConfig, DEFAULT_FRAME_TIMEOUT_US};
pub use error::{SendError, SetupError};
pub use fifo::{BitFifo, FIFO_CAPACITY};
pub use frame::{
    subframe_bits, FrameCodec, FrameSink, FrameSource, FrameState, MAX_QUEUED_FRAME,
    SUBFRAME_BITS,
};
