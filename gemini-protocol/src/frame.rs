//! Byte frames on top of a [`BitChannel`]
//!
//! Each byte travels as a sub-frame: a start bit of 1 followed by the 8 data
//! bits, most significant first. Zero bits outside a sub-frame are
//! synchronization padding and are dropped. A frame has no length field; the
//! receiver supplies a buffer of the expected length, and frames are
//! delimited by the channel's idle timeout.
//!
//! ```text
//!  sync  │ start │ b7 b6 b5 b4 b3 b2 b1 b0 │ start │ b7 ... b0 │  idle
//!  0 0 0 │   1   │ 0  0  0  0  0  0  1  0  │   1   │ ...       │ ──────> frame end
//! ```

use heapless::Vec;

use gemini_hal::{DelayNs, EdgeInput, MonotonicClock, OutputPin};

use crate::channel::BitChannel;
use crate::error::{SendError, SetupError};
use crate::fifo::FIFO_CAPACITY;

/// Bits per sub-frame on the wire
pub const SUBFRAME_BITS: usize = 9;

/// Largest frame [`FrameCodec::queue_frame`] accepts (bytes)
///
/// As many sub-frames as fit in one empty outbound FIFO.
pub const MAX_QUEUED_FRAME: usize = FIFO_CAPACITY / SUBFRAME_BITS;

/// Wire bits of one sub-frame: the start bit, then `byte` MSB first
pub fn subframe_bits(byte: u8) -> impl Iterator<Item = bool> {
    core::iter::once(true).chain((0..8).rev().map(move |shift| (byte >> shift) & 1 != 0))
}

/// Receive state of a [`FrameCodec`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameState {
    /// Link idle, dropping leftovers of the previous session
    WaitFrameStart,
    /// Session running, assembling sub-frames into the buffer
    WaitFrameData,
    /// Session over, waiting for the next one
    FrameEnd,
}

/// Byte being assembled from the data bits of a sub-frame
#[derive(Debug, Clone, Copy, Default)]
struct SubFrame {
    value: u8,
    bits: u8,
}

impl SubFrame {
    /// Shift in one data bit, returning the byte once all 8 are in
    fn push(&mut self, bit: bool) -> Option<u8> {
        self.value = (self.value << 1) | u8::from(bit);
        self.bits += 1;
        (self.bits == 8).then_some(self.value)
    }
}

/// Anything that delivers complete byte frames
pub trait FrameSource {
    /// Check if a whole frame has been received
    fn frame_complete(&self) -> bool;

    /// Take the frame, making room for the next one
    fn get_frame(&mut self) -> Option<&[u8]>;

    /// Drop any partially or fully received frame
    fn reset_frame(&mut self);
}

/// Anything that accepts byte frames for transmission
pub trait FrameSink {
    /// Queue a frame for transmission, all of it or nothing
    fn send_frame(&mut self, bytes: &[u8]) -> Result<(), SendError>;
}

/// Frame layer of a Gemini link
///
/// Owns the [`BitChannel`]. Received frames are written into a buffer
/// borrowed from the caller; without one, received bits stay in the
/// channel's FIFO for raw access through [`FrameCodec::channel_mut`].
pub struct FrameCodec<'b, I, O, C, D> {
    channel: BitChannel<I, O, C, D>,
    buffer: Option<&'b mut [u8]>,
    /// Bytes written into `buffer` so far
    received: usize,
    /// Sub-frame in progress (start bit seen)
    assembling: Option<SubFrame>,
    frame_timeouts: u32,
    state: FrameState,
    queued: Option<Vec<u8, MAX_QUEUED_FRAME>>,
}

impl<'b, I, O, C, D> FrameCodec<'b, I, O, C, D>
where
    I: EdgeInput,
    O: OutputPin,
    C: MonotonicClock,
    D: DelayNs,
{
    /// Wrap a channel; call a `begin` method before polling
    pub fn new(channel: BitChannel<I, O, C, D>) -> Self {
        Self {
            channel,
            buffer: None,
            received: 0,
            assembling: None,
            frame_timeouts: 0,
            state: FrameState::WaitFrameStart,
            queued: None,
        }
    }

    /// Start the link without a receive buffer
    pub fn begin(&mut self) -> Result<(), SetupError> {
        self.channel.begin()?;
        self.reset_frame();
        self.state = FrameState::WaitFrameStart;
        Ok(())
    }

    /// Start the link, receiving frames of `buffer.len()` bytes into `buffer`
    pub fn begin_with_buffer(&mut self, buffer: &'b mut [u8]) -> Result<(), SetupError> {
        if buffer.is_empty() {
            return Err(SetupError::EmptyFrameBuffer);
        }
        self.begin()?;
        self.buffer = Some(buffer);
        Ok(())
    }

    /// Bind a different receive buffer
    ///
    /// With `reset` false the bytes already received are kept, as far as
    /// they fit the new buffer's length.
    pub fn set_frame_buffer(&mut self, buffer: &'b mut [u8], reset: bool) -> Result<(), SetupError> {
        if buffer.is_empty() {
            return Err(SetupError::EmptyFrameBuffer);
        }
        self.received = self.received.min(buffer.len());
        self.buffer = Some(buffer);
        if reset {
            self.reset_frame();
        }
        Ok(())
    }

    /// Advance the channel and the frame state machine
    pub fn poll(&mut self) {
        self.flush_queued();
        self.channel.poll();

        let frame_end = self.channel.frame_end_detected();
        match self.state {
            FrameState::WaitFrameStart => {
                if frame_end {
                    self.drain_inbound();
                } else {
                    if self.frame_complete() {
                        debug!("unread frame dropped by new session");
                    }
                    self.reset_frame();
                    trace!("frame start");
                    self.state = FrameState::WaitFrameData;
                }
            }

            FrameState::WaitFrameData => {
                self.handle_frame_data();
                if frame_end {
                    self.state = FrameState::FrameEnd;
                }
            }

            FrameState::FrameEnd => {
                if frame_end {
                    self.drain_inbound();
                } else {
                    self.state = FrameState::WaitFrameStart;
                }
            }
        }
    }

    fn handle_frame_data(&mut self) {
        let Some(buffer) = self.buffer.as_deref_mut() else {
            return;
        };

        while let Some(bit) = self.channel.receive() {
            if self.received >= buffer.len() {
                // Complete frame not collected yet: keep draining
                continue;
            }

            let Some(subframe) = self.assembling.as_mut() else {
                if bit {
                    self.assembling = Some(SubFrame::default());
                }
                continue;
            };

            if let Some(byte) = subframe.push(bit) {
                buffer[self.received] = byte;
                self.received += 1;
                self.assembling = None;

                if self.received == buffer.len() {
                    debug!("frame complete, {} bytes", self.received);
                }
            }
        }

        if !self.frame_complete() && self.frame_started() && self.channel.idle_timed_out() {
            self.frame_timeouts = self.frame_timeouts.saturating_add(1);
            warn!(
                "frame timeout after {} of {} bytes",
                self.received,
                self.frame_len()
            );
            self.reset_frame();
        }
    }

    fn drain_inbound(&mut self) {
        if self.buffer.is_some() {
            while self.channel.receive().is_some() {}
        }
    }

    fn flush_queued(&mut self) {
        if !self.channel.frame_end_detected() || self.channel.is_output_pending() {
            return;
        }
        let Some(frame) = self.queued.take() else {
            return;
        };

        trace!("sending queued frame, {} bytes", frame.len());
        if self.send_frame(&frame).is_err() {
            warn!("queued frame did not fit the output FIFO");
        }
    }

    /// Queue a frame's sub-frames on the channel
    ///
    /// No synchronization bits are added; use [`BitChannel::send_sync`]
    /// through [`FrameCodec::channel_mut`] for padding. Nothing is queued if
    /// the whole frame does not fit.
    pub fn send_frame(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        let nbits = bytes.len().saturating_mul(SUBFRAME_BITS);
        if !self.channel.can_send(nbits) {
            return Err(SendError::OutputFull);
        }

        for &byte in bytes {
            for bit in subframe_bits(byte) {
                self.channel.send_bit(bit)?;
            }
        }
        Ok(())
    }

    /// Hold a frame until the link is idle, then send it
    ///
    /// The frame is handed to the channel once the current session has ended
    /// and nothing else is queued, so it never interleaves with other
    /// traffic. Replaces a frame that is still waiting.
    pub fn queue_frame(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        let frame = Vec::from_slice(bytes).map_err(|_| SendError::FrameTooLong)?;
        if self.queued.replace(frame).is_some() {
            debug!("queued frame replaced before it was sent");
        }
        Ok(())
    }

    /// Check if a frame from [`FrameCodec::queue_frame`] is still waiting
    pub fn frame_queued(&self) -> bool {
        self.queued.is_some()
    }

    /// Check if the receive buffer has been filled
    ///
    /// Further sub-frames are dropped until the frame is taken with
    /// [`FrameCodec::get_frame`] or [`FrameCodec::reset_frame`].
    pub fn frame_complete(&self) -> bool {
        match &self.buffer {
            Some(buffer) => self.received >= buffer.len(),
            None => false,
        }
    }

    /// Take the receive buffer and start a new frame
    ///
    /// The whole buffer is returned; check [`FrameCodec::frame_complete`]
    /// first.
    pub fn get_frame(&mut self) -> Option<&[u8]> {
        self.reset_frame();
        self.buffer.as_deref()
    }

    /// Bytes received so far, without starting a new frame
    pub fn frame(&self) -> Option<&[u8]> {
        self.buffer.as_deref().map(|buffer| &buffer[..self.received])
    }

    /// Discard the frame in progress and start over at byte 0
    pub fn reset_frame(&mut self) {
        self.received = 0;
        self.assembling = None;
    }

    /// Expected frame length (the receive buffer length)
    pub fn frame_len(&self) -> usize {
        self.buffer.as_deref().map_or(0, <[u8]>::len)
    }

    /// Bytes written into the receive buffer so far
    pub fn received_len(&self) -> usize {
        self.received
    }

    /// Check if a frame is partially received
    pub fn frame_started(&self) -> bool {
        self.received > 0 || self.assembling.is_some()
    }

    /// Check if any frame was abandoned by the idle timeout
    pub fn frame_timeout_detected(&self) -> bool {
        self.frame_timeouts > 0
    }

    /// Number of frames abandoned by the idle timeout
    pub fn frame_timeout_count(&self) -> u32 {
        self.frame_timeouts
    }

    /// Clear the frame timeout counter
    pub fn reset_frame_timeout_count(&mut self) {
        self.frame_timeouts = 0;
    }

    /// Check if the channel has seen no bit activity for the frame timeout
    pub fn frame_end_detected(&self) -> bool {
        self.channel.frame_end_detected()
    }

    /// Current receive state
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Bit-level access to the link
    pub fn channel(&self) -> &BitChannel<I, O, C, D> {
        &self.channel
    }

    /// Mutable bit-level access, for raw sends and receives
    pub fn channel_mut(&mut self) -> &mut BitChannel<I, O, C, D> {
        &mut self.channel
    }

    /// Unbind the receive buffer and give back the channel
    pub fn release(self) -> BitChannel<I, O, C, D> {
        self.channel
    }
}

impl<I, O, C, D> FrameSource for FrameCodec<'_, I, O, C, D>
where
    I: EdgeInput,
    O: OutputPin,
    C: MonotonicClock,
    D: DelayNs,
{
    fn frame_complete(&self) -> bool {
        FrameCodec::frame_complete(self)
    }

    fn get_frame(&mut self) -> Option<&[u8]> {
        FrameCodec::get_frame(self)
    }

    fn reset_frame(&mut self) {
        FrameCodec::reset_frame(self)
    }
}

impl<I, O, C, D> FrameSink for FrameCodec<'_, I, O, C, D>
where
    I: EdgeInput,
    O: OutputPin,
    C: MonotonicClock,
    D: DelayNs,
{
    fn send_frame(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        FrameCodec::send_frame(self, bytes)
    }
}
