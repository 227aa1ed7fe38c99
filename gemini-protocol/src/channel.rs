//! Bit-level exchange with the peer
//!
//! Every bit is marked by a rising edge. The sender raises its output for
//! `write_pulse_us`, then leaves the line at the bit value. The receiver
//! samples `read_delay_us` after seeing the edge and answers with an edge of
//! its own, carrying its next bit (or a bare pulse when it has nothing to
//! send). So while an exchange is running, one bit travels in each direction
//! per handshake:
//!
//! ```text
//! Idle                 ── peer edge ─────────────────> AwaitingSampleDelay
//! Idle                 ── own bit queued, frame end ─> AwaitingPeerAck
//! AwaitingSampleDelay  ── sampled, bit queued ───────> AwaitingPeerAck
//! AwaitingSampleDelay  ── sampled, nothing queued ───> Idle
//! AwaitingPeerAck      ── peer edge ─────────────────> AwaitingHoldTime
//! AwaitingPeerAck      ── handshake timeout ─────────> Idle
//! AwaitingHoldTime     ── write delay elapsed ───────> AwaitingSampleDelay
//! ```
//!
//! Only the end that started the exchange may stop it, by not raising its
//! line again once it has nothing left to send.

use gemini_hal::{DelayNs, EdgeInput, MonotonicClock, OutputPin};

use crate::config::{ConfigError, GeminiConfig};
use crate::error::{SendError, SetupError};
use crate::fifo::BitFifo;

/// Poll interval of the busy-wait helpers (µs)
const WAIT_POLL_US: u32 = 4;

/// Handshake state of a [`BitChannel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// No bit in flight
    Idle,
    /// Peer edge seen, waiting `read_delay_us` before sampling
    AwaitingSampleDelay,
    /// Own bit on the line, waiting for the peer's edge
    AwaitingPeerAck,
    /// Peer edge seen, holding the line for `write_delay_us`
    AwaitingHoldTime,
}

/// One end of a Gemini link
///
/// Owns the two lines, the clock, the delay and both bit FIFOs. Nothing
/// happens unless [`BitChannel::poll`] is called, and all deadlines are
/// checked there, so it must be called often (every few microseconds while
/// an exchange is running).
pub struct BitChannel<I, O, C, D> {
    input: I,
    output: O,
    clock: C,
    delay: D,
    config: GeminiConfig,
    state: ChannelState,
    /// This end started the running exchange
    self_initiated: bool,
    inbound: BitFifo,
    outbound: BitFifo,
    /// Time of the last state change caused by bit activity
    last_activity_us: u32,
    /// No bit activity for `frame_timeout_us` (sticky until the next bit)
    frame_end: bool,
    handshake_timeouts: u32,
    inbound_overruns: u32,
}

impl<I, O, C, D> BitChannel<I, O, C, D>
where
    I: EdgeInput,
    O: OutputPin,
    C: MonotonicClock,
    D: DelayNs,
{
    /// Create a channel, driving the output line low
    ///
    /// [`BitChannel::begin`] must be called before polling.
    pub fn new(input: I, mut output: O, clock: C, delay: D, config: GeminiConfig) -> Self {
        output.set_low();
        let now = clock.now_micros();

        Self {
            input,
            output,
            clock,
            delay,
            config,
            state: ChannelState::Idle,
            self_initiated: false,
            inbound: BitFifo::new(),
            outbound: BitFifo::new(),
            last_activity_us: now,
            frame_end: true,
            handshake_timeouts: 0,
            inbound_overruns: 0,
        }
    }

    /// Validate the configuration and enable edge notification
    ///
    /// Leaves the channel idle with the frame-end flag set, so an initiator
    /// may start sending on the first poll.
    pub fn begin(&mut self) -> Result<(), SetupError> {
        self.config.validate()?;
        self.input.listen_rising_edge()?;

        self.output.set_low();
        self.state = ChannelState::Idle;
        self.self_initiated = false;
        self.frame_end = true;
        self.last_activity_us = self.clock.now_micros();

        debug!("gemini channel ready, initiator: {}", self.config.can_initiate);
        Ok(())
    }

    /// Advance the handshake state machine by at most one step
    pub fn poll(&mut self) {
        let elapsed_us = self.clock.micros_since(self.last_activity_us);

        match self.state {
            ChannelState::Idle => {
                if self.input.take_rising_edge() {
                    trace!("peer started exchange");
                    self.self_initiated = false;
                    self.frame_end = false;
                    self.enter(ChannelState::AwaitingSampleDelay);
                } else if self.config.can_initiate && self.frame_end {
                    if let Some(bit) = self.outbound.pull() {
                        trace!("starting exchange");
                        self.write_bit(bit);
                        self.self_initiated = true;
                        self.frame_end = false;
                        self.enter(ChannelState::AwaitingPeerAck);
                    }
                } else if !self.frame_end && elapsed_us >= self.config.frame_timeout_us {
                    trace!("frame end after {} us idle", elapsed_us);
                    self.frame_end = true;
                }
            }

            ChannelState::AwaitingSampleDelay => {
                if elapsed_us >= self.config.read_delay_us {
                    let bit = self.input.is_high();
                    if self.inbound.push(bit).is_err() {
                        self.inbound_overruns = self.inbound_overruns.saturating_add(1);
                        warn!("inbound FIFO full, bit dropped");
                    }
                    self.frame_end = false;

                    match self.outbound.pull() {
                        // Queued data keeps the exchange going whoever started it
                        Some(next) => {
                            self.write_bit(next);
                            self.enter(ChannelState::AwaitingPeerAck);
                        }
                        None if self.self_initiated => {
                            self.output.set_low();
                            self.self_initiated = false;
                            trace!("exchange complete");
                            self.enter(ChannelState::Idle);
                        }
                        None => {
                            // Bare acknowledge: the peer reads a zero bit
                            self.pulse(self.config.write_pulse_us, false);
                            self.enter(ChannelState::Idle);
                        }
                    }
                }
            }

            ChannelState::AwaitingPeerAck => {
                if self.input.take_rising_edge() {
                    self.frame_end = false;
                    self.enter(ChannelState::AwaitingHoldTime);
                } else if let Some(timeout_us) = self.config.handshake_timeout_us {
                    if elapsed_us >= timeout_us {
                        self.abort_handshake();
                    }
                }
            }

            ChannelState::AwaitingHoldTime => {
                if elapsed_us >= self.config.write_delay_us {
                    self.output.set_low();
                    // Direction reverses: read the bit sent with the ack
                    self.enter(ChannelState::AwaitingSampleDelay);
                }
            }
        }
    }

    fn enter(&mut self, state: ChannelState) {
        self.state = state;
        self.last_activity_us = self.clock.now_micros();
    }

    fn write_bit(&mut self, bit: bool) {
        self.pulse(self.config.write_pulse_us, bit);
    }

    fn abort_handshake(&mut self) {
        warn!("no acknowledge from peer, exchange aborted");
        self.output.set_low();
        self.self_initiated = false;
        self.handshake_timeouts = self.handshake_timeouts.saturating_add(1);
        // Idle timer keeps counting from the last real activity
        self.state = ChannelState::Idle;
    }

    /// Raise the output for `micros`, then leave it at `final_state`
    ///
    /// With `final_state == false` this is a pulse, otherwise a rising edge.
    /// Busy-waits for the pulse width. Mainly used internally, but also
    /// available for start-up handshakes.
    pub fn pulse(&mut self, micros: u32, final_state: bool) {
        self.output.set_high();
        self.delay.delay_us(micros);
        self.output.set_state(final_state);
    }

    /// Queue one bit for transmission
    pub fn send_bit(&mut self, bit: bool) -> Result<(), SendError> {
        self.outbound.push(bit).map_err(|_| SendError::OutputFull)
    }

    /// Queue a byte for transmission, most significant bit first
    ///
    /// Either all 8 bits are queued or none are.
    pub fn send_byte(&mut self, byte: u8) -> Result<(), SendError> {
        self.outbound
            .push_byte(byte)
            .map_err(|_| SendError::OutputFull)
    }

    /// Queue a synchronization run of `count` zero bits, or nothing at all
    pub fn send_sync(&mut self, count: usize) -> Result<(), SendError> {
        if !self.can_send(count) {
            return Err(SendError::OutputFull);
        }
        for _ in 0..count {
            self.outbound
                .push(false)
                .map_err(|_| SendError::OutputFull)?;
        }
        Ok(())
    }

    /// Free slots in the outbound FIFO, in bits
    pub fn free_space(&self) -> usize {
        self.outbound.free()
    }

    /// Check if `nbits` more bits can be queued
    pub fn can_send(&self, nbits: usize) -> bool {
        nbits <= self.outbound.free()
    }

    /// Check if queued bits are still waiting to be sent
    pub fn is_output_pending(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// Number of received bits waiting to be read
    pub fn available(&self) -> usize {
        self.inbound.len()
    }

    /// Check if at least one received bit is waiting
    pub fn has_data(&self) -> bool {
        !self.inbound.is_empty()
    }

    /// Check if at least `n` received bits are waiting
    pub fn has_bits(&self, n: usize) -> bool {
        self.inbound.len() >= n
    }

    /// Take the oldest received bit
    pub fn receive(&mut self) -> Option<bool> {
        self.inbound.pull()
    }

    /// Take 8 received bits as a byte, if 8 are available
    pub fn receive_byte(&mut self) -> Option<u8> {
        self.inbound.pull_byte()
    }

    /// Poll until 8 bits are available, then return them as a byte
    ///
    /// Busy-waits without bound: if the peer stops sending, this never
    /// returns. Prefer [`BitChannel::receive_byte_within`] unless the peer is
    /// known to be streaming.
    pub fn receive_byte_blocking(&mut self) -> u8 {
        loop {
            if let Some(byte) = self.inbound.pull_byte() {
                return byte;
            }
            self.poll();
        }
    }

    /// Poll for up to `timeout_us` until 8 bits are available
    pub fn receive_byte_within(&mut self, timeout_us: u32) -> Option<u8> {
        let start = self.clock.now_micros();
        loop {
            if let Some(byte) = self.inbound.pull_byte() {
                return Some(byte);
            }
            if self.clock.micros_since(start) >= timeout_us {
                return None;
            }
            self.poll();
            self.delay.delay_us(WAIT_POLL_US);
        }
    }

    /// Busy-wait for a rising edge on the input line
    ///
    /// Consumes the edge. Returns false if none arrived within `timeout_us`.
    /// Intended for start-up handshakes, before regular polling starts.
    pub fn wait_input_edge(&mut self, timeout_us: u32) -> bool {
        let start = self.clock.now_micros();
        loop {
            if self.input.take_rising_edge() {
                return true;
            }
            if self.clock.micros_since(start) >= timeout_us {
                return false;
            }
            self.delay.delay_us(WAIT_POLL_US);
        }
    }

    /// Busy-wait for a rising edge on the input line, without a timeout
    pub fn wait_input_edge_blocking(&mut self) {
        while !self.input.take_rising_edge() {
            self.delay.delay_us(WAIT_POLL_US);
        }
    }

    /// Busy-wait until the input line is low
    ///
    /// Returns false if it is still high after `timeout_us`.
    pub fn wait_input_idle(&mut self, timeout_us: u32) -> bool {
        let start = self.clock.now_micros();
        while self.input.is_high() {
            if self.clock.micros_since(start) >= timeout_us {
                return false;
            }
            self.delay.delay_us(WAIT_POLL_US);
        }
        true
    }

    /// Whether this end may start an exchange on its own
    pub fn can_initiate(&self) -> bool {
        self.config.can_initiate
    }

    /// Allow or forbid starting exchanges from this end
    pub fn set_can_initiate(&mut self, can_initiate: bool) {
        self.config.can_initiate = can_initiate;
    }

    /// Current frame timeout (µs)
    pub fn frame_timeout(&self) -> u32 {
        self.config.frame_timeout_us
    }

    /// Change the frame timeout (µs)
    ///
    /// The new value must pass [`GeminiConfig::validate`] together with the
    /// other timings; otherwise the current timeout is kept.
    pub fn set_frame_timeout(&mut self, timeout_us: u32) -> Result<(), ConfigError> {
        let config = GeminiConfig {
            frame_timeout_us: timeout_us,
            ..self.config
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// True once no bit activity happened for the frame timeout
    ///
    /// Stays set until the next bit activity, which marks a new frame.
    pub fn frame_end_detected(&self) -> bool {
        self.frame_end
    }

    /// Check if the frame timeout has elapsed since the last bit activity
    pub fn idle_timed_out(&self) -> bool {
        self.clock.micros_since(self.last_activity_us) >= self.config.frame_timeout_us
    }

    /// Current handshake state
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Configuration in use
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Number of exchanges aborted because the peer never acknowledged
    pub fn handshake_timeouts(&self) -> u32 {
        self.handshake_timeouts
    }

    /// Number of received bits dropped because the inbound FIFO was full
    pub fn inbound_overruns(&self) -> u32 {
        self.inbound_overruns
    }

    /// Give back the injected lines, clock and delay
    pub fn release(self) -> (I, O, C, D) {
        (self.input, self.output, self.clock, self.delay)
    }
}
