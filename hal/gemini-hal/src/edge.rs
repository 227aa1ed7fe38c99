//! Rising-edge handoff between interrupt context and the poll loop
//!
//! The edge interrupt only ever sets a flag. The poll loop consumes it with a
//! single atomic swap, so at most one pending edge is represented and no
//! other protocol state is shared with the interrupt handler.

use portable_atomic::{AtomicBool, Ordering};

use crate::gpio::{EdgeError, EdgeInput, InputPin};

/// Single-slot edge notification
///
/// Meant to live in a `static` next to the interrupt handler:
///
/// ```
/// use gemini_hal::EdgeFlag;
///
/// static LINK_EDGE: EdgeFlag = EdgeFlag::new();
///
/// // in the rising-edge interrupt handler
/// LINK_EDGE.signal();
///
/// // in the poll loop
/// assert!(LINK_EDGE.take());
/// assert!(!LINK_EDGE.take());
/// ```
///
/// On cores without compare-and-swap, enable the `critical-section` feature
/// so [`EdgeFlag::take`] runs with interrupts masked.
#[derive(Debug)]
pub struct EdgeFlag {
    pending: AtomicBool,
}

impl Default for EdgeFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeFlag {
    /// Create a flag with no pending edge
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Record a rising edge (interrupt context)
    pub fn signal(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume the pending edge, returning whether there was one
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Check for a pending edge without consuming it
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Drop any pending edge
    pub fn clear(&self) {
        self.pending.store(false, Ordering::Release);
    }
}

/// Input line whose edges are reported by an interrupt through an [`EdgeFlag`]
///
/// The platform registers a rising-edge interrupt on the pin and calls
/// [`EdgeFlag::signal`] from it.
pub struct FlaggedInput<'a, P> {
    pin: P,
    flag: &'a EdgeFlag,
    listening: bool,
}

impl<'a, P: InputPin> FlaggedInput<'a, P> {
    /// Pair an input pin with the flag its interrupt handler signals
    pub fn new(pin: P, flag: &'a EdgeFlag) -> Self {
        Self {
            pin,
            flag,
            listening: false,
        }
    }

    /// Give back the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: InputPin> InputPin for FlaggedInput<'_, P> {
    fn is_high(&mut self) -> bool {
        self.pin.is_high()
    }
}

impl<P: InputPin> EdgeInput for FlaggedInput<'_, P> {
    fn listen_rising_edge(&mut self) -> Result<(), EdgeError> {
        self.flag.clear();
        self.listening = true;
        Ok(())
    }

    fn take_rising_edge(&mut self) -> bool {
        self.listening && self.flag.take()
    }
}

/// Input line whose rising edges are found by sampling at each poll
///
/// For pins without interrupt support. An edge is only seen if the line is
/// still high when it is next sampled, so a pulse that returns low between
/// two polls is missed. Only usable when the poll period is shorter than the
/// peer's write pulse.
pub struct PolledEdgeInput<P> {
    pin: P,
    last_high: bool,
}

impl<P: InputPin> PolledEdgeInput<P> {
    /// Wrap an input pin
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            last_high: false,
        }
    }

    /// Give back the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: InputPin> InputPin for PolledEdgeInput<P> {
    fn is_high(&mut self) -> bool {
        self.pin.is_high()
    }
}

impl<P: InputPin> EdgeInput for PolledEdgeInput<P> {
    fn listen_rising_edge(&mut self) -> Result<(), EdgeError> {
        // Start from the current level so a line already high is not an edge
        self.last_high = self.pin.is_high();
        Ok(())
    }

    fn take_rising_edge(&mut self) -> bool {
        let high = self.pin.is_high();
        let rising = high && !self.last_high;
        self.last_high = high;
        rising
    }
}
