//! Host simulation of a two-wire link
//!
//! Each wire has one driver and one probe. Raising a low wire signals the
//! wire's [`EdgeFlag`], the way the rising-edge interrupt would on a board.
//! Time is a shared counter moved forward by the bench and by every
//! busy-wait delay, so both ends see the same clock.

use core::cell::Cell;

use gemini_hal::{DelayNs, EdgeFlag, FlaggedInput, InputPin, MonotonicClock, OutputPin};

use crate::channel::BitChannel;
use crate::config::GeminiConfig;

/// Simulated time step of [`Bench::tick`] (µs)
pub const TICK_US: u32 = 5;

pub struct Wire {
    level: Cell<bool>,
    edge: EdgeFlag,
}

impl Wire {
    fn new() -> Self {
        Self {
            level: Cell::new(false),
            edge: EdgeFlag::new(),
        }
    }
}

pub struct WireDriver<'a> {
    wire: &'a Wire,
}

impl OutputPin for WireDriver<'_> {
    fn set_high(&mut self) {
        if !self.wire.level.replace(true) {
            self.wire.edge.signal();
        }
    }

    fn set_low(&mut self) {
        self.wire.level.set(false);
    }

    fn is_set_high(&self) -> bool {
        self.wire.level.get()
    }
}

pub struct WireProbe<'a> {
    wire: &'a Wire,
}

impl InputPin for WireProbe<'_> {
    fn is_high(&mut self) -> bool {
        self.wire.level.get()
    }
}

pub struct SimClock<'a> {
    now: &'a Cell<u32>,
}

impl MonotonicClock for SimClock<'_> {
    fn now_micros(&self) -> u32 {
        self.now.get()
    }
}

/// Busy-wait that moves simulated time instead of spinning
pub struct SimDelay<'a> {
    now: &'a Cell<u32>,
}

impl SimDelay<'_> {
    fn advance(&self, us: u32) {
        self.now.set(self.now.get().wrapping_add(us));
    }
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.advance(us);
    }
}

pub type SimInput<'a> = FlaggedInput<'a, WireProbe<'a>>;

pub type SimChannel<'a> = BitChannel<SimInput<'a>, WireDriver<'a>, SimClock<'a>, SimDelay<'a>>;

/// Two wires and a clock, shared by both ends of the link
pub struct Bench {
    a_to_b: Wire,
    b_to_a: Wire,
    now: Cell<u32>,
}

impl Bench {
    pub fn new() -> Self {
        Self {
            a_to_b: Wire::new(),
            b_to_a: Wire::new(),
            now: Cell::new(1_000),
        }
    }

    fn channel<'a>(&'a self, rx: &'a Wire, tx: &'a Wire, config: GeminiConfig) -> SimChannel<'a> {
        BitChannel::new(
            FlaggedInput::new(WireProbe { wire: rx }, &rx.edge),
            WireDriver { wire: tx },
            SimClock { now: &self.now },
            SimDelay { now: &self.now },
            config,
        )
    }

    /// End that drives the A→B wire
    pub fn side_a(&self, config: GeminiConfig) -> SimChannel<'_> {
        self.channel(&self.b_to_a, &self.a_to_b, config)
    }

    /// End that drives the B→A wire
    pub fn side_b(&self, config: GeminiConfig) -> SimChannel<'_> {
        self.channel(&self.a_to_b, &self.b_to_a, config)
    }

    pub fn now(&self) -> u32 {
        self.now.get()
    }

    pub fn advance(&self, us: u32) {
        self.now.set(self.now.get().wrapping_add(us));
    }

    pub fn tick(&self) {
        self.advance(TICK_US);
    }

    /// Level of the A→B wire
    pub fn a_line(&self) -> bool {
        self.a_to_b.level.get()
    }

    /// Level of the B→A wire
    pub fn b_line(&self) -> bool {
        self.b_to_a.level.get()
    }
}

/// Fast timing for simulation: a bit exchange takes about 100 µs
pub fn link_config(can_initiate: bool) -> GeminiConfig {
    GeminiConfig {
        write_pulse_us: 10,
        handshake_timeout_us: Some(400),
        read_delay_us: 40,
        write_delay_us: 30,
        frame_timeout_us: 2_000,
        can_initiate,
    }
}
