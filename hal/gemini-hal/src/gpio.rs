//! GPIO line abstractions
//!
//! The link drives one output line and samples one input line. The input
//! line must also be able to report rising edges, since every bit the peer
//! sends starts with one.

use core::convert::Infallible;

/// Digital output line
///
/// Implementations should write the port register directly; the protocol
/// generates pulses only a few microseconds wide.
pub trait OutputPin {
    /// Set the line high (logic 1)
    fn set_high(&mut self);

    /// Set the line low (logic 0)
    fn set_low(&mut self);

    /// Set the line to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the line is currently driven high
    fn is_set_high(&self) -> bool;

    /// Check if the line is currently driven low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Digital input line
///
/// Reads take `&mut self` because embedded-hal 1.0 pins do.
pub trait InputPin {
    /// Check if the line reads high (logic 1)
    fn is_high(&mut self) -> bool;

    /// Check if the line reads low (logic 0)
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }
}

/// Errors when enabling edge notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeError {
    /// The line cannot report rising edges (no interrupt on this pin)
    Unsupported,
}

/// Input line that reports rising edges
///
/// At most one pending edge is remembered. The producer is normally an
/// interrupt handler; the consumer is the protocol poll loop.
pub trait EdgeInput: InputPin {
    /// Start reporting rising edges
    ///
    /// Any edge seen before this call is discarded.
    fn listen_rising_edge(&mut self) -> Result<(), EdgeError>;

    /// Consume the pending rising edge, if there is one
    fn take_rising_edge(&mut self) -> bool;
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Adapter for embedded-hal 1.0 output pins that cannot fail
///
/// Tracks the driven level itself so [`OutputPin::is_set_high`] does not
/// need mutable access to the wrapped pin.
pub struct HalOutput<P> {
    pin: P,
    high: bool,
}

impl<P> HalOutput<P>
where
    P: embedded_hal::digital::OutputPin<Error = Infallible>,
{
    /// Wrap a pin, driving it low
    pub fn new(pin: P) -> Self {
        let mut output = Self { pin, high: true };
        output.set_low();
        output
    }

    /// Give back the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> OutputPin for HalOutput<P>
where
    P: embedded_hal::digital::OutputPin<Error = Infallible>,
{
    fn set_high(&mut self) {
        infallible(self.pin.set_high());
        self.high = true;
    }

    fn set_low(&mut self) {
        infallible(self.pin.set_low());
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// Adapter for embedded-hal 1.0 input pins that cannot fail
pub struct HalInput<P> {
    pin: P,
}

impl<P> HalInput<P>
where
    P: embedded_hal::digital::InputPin<Error = Infallible>,
{
    /// Wrap a pin
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Give back the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> InputPin for HalInput<P>
where
    P: embedded_hal::digital::InputPin<Error = Infallible>,
{
    fn is_high(&mut self) -> bool {
        infallible(self.pin.is_high())
    }
}
