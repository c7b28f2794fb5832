// Copyright (C) 2025 swdid contributors
//
// MIT License

//! Simulated SWD wire and target, shared by the integration tests.
//!
//! [`Bus`] records every SWCLK rising edge as a [`Cycle`]: the SWDIO level if
//! the host was driving, or [`Cycle::Target`] if the host had released
//! SWDIO.  While the host has released SWDIO, each rising edge shifts the
//! next queued response bit onto the line.  With nothing queued the line
//! floats high, as it would with the target's pull-up.
//!
//! A [`Target`] can be attached to decode what the host drives and queue
//! responses to IDCODE requests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use swdid_swd::{SwdLink, SwdSession, SwdioPin};

pub type SimSession = SwdSession<SimSwdio, SimSwclk, SimDelay>;
pub type SimLink = SwdLink<SimSwdio, SimSwclk, SimDelay>;

/// One SWCLK cycle, as seen on the rising edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// The host drove SWDIO to this level.
    Host(bool),
    /// The host had released SWDIO.
    Target,
}

/// How the simulated target answers an IDCODE request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// ACK OK, then this IDCODE with correct parity.
    IdCode(u32),
    /// ACK OK, then this IDCODE with the parity bit inverted.
    BadParity(u32),
    /// ACK OK, then this IDCODE and no parity bit, leaving the line to float.
    NoParity(u32),
    /// This (non-OK) ACK and nothing else.
    Ack(u8),
}

#[derive(Debug)]
pub struct Target {
    reply: Reply,
    high_run: u32,
    // Set by a line reset, cleared by the next one
    reset_done: bool,
    swd_mode: bool,
    window: u16,
    request: Option<(u8, u32)>,
    // The host's read-to-write turnaround cycle follows every reply
    turnaround: bool,
    pub requests: Vec<u8>,
}

impl Target {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            high_run: 0,
            reset_done: false,
            swd_mode: false,
            window: 0,
            request: None,
            turnaround: false,
            requests: Vec::new(),
        }
    }

    // Handle one host-driven bit.  Returns response bits to queue.
    fn host_bit(&mut self, bit: bool) -> Option<Vec<bool>> {
        self.window = (self.window >> 1) | ((bit as u16) << 15);

        if bit {
            self.high_run += 1;
            if self.high_run == 50 {
                self.reset_done = false;
                self.request = None;
            }
        } else {
            if self.high_run >= 50 {
                self.reset_done = true;
            }
            self.high_run = 0;
        }

        if self.turnaround {
            self.turnaround = false;
            return None;
        }

        if self.reset_done && self.window == 0xE79E {
            self.swd_mode = true;
            self.reset_done = false;
            self.request = None;
            return None;
        }

        if !(self.swd_mode && self.reset_done) || self.high_run >= 50 {
            return None;
        }

        match self.request {
            None if bit => {
                self.request = Some((1, 1));
                None
            }
            None => None,
            Some((value, count)) => {
                let value = value | ((bit as u8) << count);
                if count + 1 < 8 {
                    self.request = Some((value, count + 1));
                    return None;
                }
                self.request = None;
                self.requests.push(value);
                if value != 0xA5 {
                    return None;
                }
                self.turnaround = true;
                Some(self.response())
            }
        }
    }

    fn response(&self) -> Vec<bool> {
        // (ack, idcode, parity bit to send)
        let (ack, data) = match self.reply {
            Reply::IdCode(idcode) => (0b001, Some((idcode, Some(false)))),
            Reply::BadParity(idcode) => (0b001, Some((idcode, Some(true)))),
            Reply::NoParity(idcode) => (0b001, Some((idcode, None))),
            Reply::Ack(ack) => (ack, None),
        };

        let mut bits = bits_lsb_first(ack as u64, 3);
        if let Some((idcode, parity)) = data {
            bits.extend(bits_lsb_first(idcode as u64, 32));
            if let Some(corrupt) = parity {
                bits.push((idcode.count_ones() % 2 == 1) ^ corrupt);
            }
        }
        bits
    }
}

#[derive(Debug)]
pub struct Bus {
    swclk: bool,
    swdio_out: bool,
    host_driving: bool,
    line: bool,
    pub responses: VecDeque<bool>,
    pub cycles: Vec<Cycle>,
    pub target: Option<Target>,
    pub delay_ns: u64,
}

impl Bus {
    fn rising_edge(&mut self) {
        if self.host_driving {
            let bit = self.swdio_out;
            self.cycles.push(Cycle::Host(bit));
            // A host that drives over a pending response has abandoned it
            self.responses.clear();
            if let Some(target) = self.target.as_mut() {
                if let Some(bits) = target.host_bit(bit) {
                    self.responses.extend(bits);
                }
            }
        } else {
            self.cycles.push(Cycle::Target);
            self.line = self.responses.pop_front().unwrap_or(true);
        }
    }
}

pub type SharedBus = Rc<RefCell<Bus>>;

pub fn bus(target: Option<Target>) -> SharedBus {
    Rc::new(RefCell::new(Bus {
        swclk: false,
        swdio_out: false,
        host_driving: false,
        line: true,
        responses: VecDeque::new(),
        cycles: Vec::new(),
        target,
        delay_ns: 0,
    }))
}

pub struct SimSwdio(SharedBus);
pub struct SimSwclk(SharedBus);
pub struct SimDelay(SharedBus);

impl ErrorType for SimSwdio {
    type Error = Infallible;
}

impl OutputPin for SimSwdio {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().swdio_out = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().swdio_out = true;
        Ok(())
    }
}

impl InputPin for SimSwdio {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let bus = self.0.borrow();
        Ok(if bus.host_driving {
            bus.swdio_out
        } else {
            bus.line
        })
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl SwdioPin for SimSwdio {
    fn set_as_output(&mut self) {
        self.0.borrow_mut().host_driving = true;
    }

    fn set_as_input(&mut self) {
        self.0.borrow_mut().host_driving = false;
    }
}

impl ErrorType for SimSwclk {
    type Error = Infallible;
}

impl OutputPin for SimSwclk {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().swclk = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut bus = self.0.borrow_mut();
        if !bus.swclk {
            bus.swclk = true;
            bus.rising_edge();
        }
        Ok(())
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().delay_ns += ns as u64;
    }
}

pub fn link(bus: &SharedBus) -> SimLink {
    SwdLink::new(
        SimSwdio(bus.clone()),
        SimSwclk(bus.clone()),
        SimDelay(bus.clone()),
    )
}

pub fn session(bus: &SharedBus) -> SimSession {
    SwdSession::from_parts(
        SimSwdio(bus.clone()),
        SimSwclk(bus.clone()),
        SimDelay(bus.clone()),
    )
}

pub fn bits_lsb_first(value: u64, length: usize) -> Vec<bool> {
    (0..length).map(|ii| (value >> ii) & 1 == 1).collect()
}

pub fn host_bits(value: u64, length: usize) -> Vec<Cycle> {
    bits_lsb_first(value, length)
        .into_iter()
        .map(Cycle::Host)
        .collect()
}

pub fn host_level(level: bool, cycles: usize) -> Vec<Cycle> {
    vec![Cycle::Host(level); cycles]
}

pub fn target_cycles(cycles: usize) -> Vec<Cycle> {
    vec![Cycle::Target; cycles]
}

/// Every cycle a successful or failed handshake drives before the
/// turnaround to read the ACK, including the initial write-mode cycle, which
/// drives whatever level SWDIO was left at.
pub fn expected_preamble(initial_level: bool) -> Vec<Cycle> {
    let mut expected = vec![Cycle::Host(initial_level)];
    expected.extend(expected_wake());
    expected.extend(expected_line_reset());
    expected.extend(host_bits(0xE79E, 16));
    expected.extend(expected_line_reset());
    expected.extend(host_level(false, 4));
    expected.extend(host_bits(0xA5, 8));
    expected
}

pub fn expected_wake() -> Vec<Cycle> {
    let mut expected = host_level(true, 8);
    for byte in [
        0x92u8, 0xF3, 0x09, 0x62, 0x95, 0x2D, 0x85, 0x86, 0xE9, 0xAF, 0xDD, 0xE3, 0xA2, 0x0E,
        0xBC, 0x19,
    ] {
        expected.extend(host_bits(byte as u64, 8));
    }
    expected.extend(host_level(false, 4));
    expected.extend(host_bits(0x1A, 8));
    expected
}

pub fn expected_line_reset() -> Vec<Cycle> {
    let mut expected = host_level(true, 62);
    expected.extend(host_level(false, 4));
    expected
}
