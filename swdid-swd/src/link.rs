// Copyright (C) 2025 swdid contributors
//
// MIT License

//! SWD Link Driver
//!
//! This module implements the bit-level SWD primitives by bit-banging two
//! GPIO lines.  It provides [`SwdLink`], which is the only object that
//! touches SWCLK and SWDIO.
//!
//! Every primitive is built from [`SwdLink::clock_pulse()`]: SWCLK low, half
//! a period, SWCLK high, half a period.  The target samples SWDIO on the
//! rising edge, and changes its own output on the rising edge when it is
//! driving, so the host drives and samples SWDIO while SWCLK is high, before
//! the next pulse starts.
//!
//! All multi-bit fields are transferred least-significant bit first.

use core::convert::Infallible;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::Serialize;

use crate::Ack;
use crate::pins::SwdioPin;

/// Largest field that can be transferred by a single
/// [`SwdLink::write_bits()`] or [`SwdLink::read_bits()`] call.
pub const MAX_BITS: usize = u64::BITS as usize;

/// SWD clock speed setting.
///
/// This is the only timing parameter of the link.  The half period is busy
/// waited twice per clock pulse, so the real clock rate is somewhat lower
/// than the nominal one, by however long the pin operations take.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Speed {
    /// Aims to be roughly 500kHz clock
    #[default]
    Slow,

    /// Aims to be roughly 1MHz clock
    Medium,

    /// Aims to be roughly 2MHz clock
    Fast,

    /// Aims to be roughly 4MHz clock
    Turbo,
}

impl Speed {
    /// Returns the **approximate** speed in kHz for this SWD speed setting.
    pub fn speed_khz(&self) -> u32 {
        match self {
            Speed::Slow => 500,
            Speed::Medium => 1000,
            Speed::Fast => 2000,
            Speed::Turbo => 4000,
        }
    }

    /// Time SWCLK is held at each level during a clock pulse.
    pub fn half_period_ns(&self) -> u32 {
        1_000_000 / (2 * self.speed_khz())
    }
}

/// Which side currently drives SWDIO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// The host drives SWDIO.
    Write,

    /// The target drives SWDIO, and the host samples it.
    Read,
}

/// SWD Link object
///
/// Owns the SWDIO and SWCLK pins, and the delay provider used to time clock
/// pulses, for as long as it exists.  Use [`SwdLink::release()`] to get them
/// back.
///
/// The pins' error types must be [`Infallible`] - pin operations on the
/// supported platforms cannot fail.
///
/// Create using `SwdLink::new()` passing in the pins and a delay:
///
/// ```rust,ignore
/// use swdid_swd::SwdLink;
///
/// let link = SwdLink::new(swdio_pin, swclk_pin, delay);
/// ```
#[derive(Debug)]
pub struct SwdLink<IO, CLK, D> {
    swdio: IO,
    swclk: CLK,
    delay: D,
    direction: Direction,
    speed: Speed,
    half_period_ns: u32,
}

impl<IO, CLK, D> SwdLink<IO, CLK, D>
where
    IO: SwdioPin<Error = Infallible>,
    CLK: OutputPin<Error = Infallible>,
    D: DelayNs,
{
    /// Create a new SWD link, and configure both lines as outputs.
    ///
    /// Arguments:
    /// - `swdio`: The bidirectional SWDIO pin.
    /// - `swclk`: The SWCLK output pin.
    /// - `delay`: Used to busy wait each half clock period.
    pub fn new(swdio: IO, swclk: CLK, delay: D) -> Self {
        let speed = Speed::default();
        let mut link = Self {
            swdio,
            swclk,
            delay,
            direction: Direction::Write,
            speed,
            half_period_ns: speed.half_period_ns(),
        };
        link.init();
        link
    }

    // SWDIO keeps whatever level it last had - nothing is driven until the
    // first write.
    fn init(&mut self) {
        self.swdio.set_as_output();
        self.direction = Direction::Write;
        debug!("SWD link created, SWDIO and SWCLK outputs");
    }

    /// Give back the pins and delay provider.
    pub fn release(self) -> (IO, CLK, D) {
        (self.swdio, self.swclk, self.delay)
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
        self.half_period_ns = speed.half_period_ns();
        debug!("SWD speed set to {speed:?}");
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// One full clock cycle: SWCLK low, wait, SWCLK high, wait.
    #[inline]
    pub fn clock_pulse(&mut self) {
        let Ok(()) = self.swclk.set_low();
        self.delay.delay_ns(self.half_period_ns);
        let Ok(()) = self.swclk.set_high();
        self.delay.delay_ns(self.half_period_ns);
    }

    /// Issue `cycles` clock pulses without touching SWDIO.
    #[inline]
    pub fn clock(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.clock_pulse();
        }
    }

    /// Release SWDIO so the target can drive it.  Does not clock.
    #[inline]
    pub fn set_read_mode(&mut self) {
        self.swdio.set_as_input();
        self.direction = Direction::Read;
    }

    /// Take back SWDIO.  Switching to write always consumes one clock
    /// cycle before any data is driven, which is also the read-to-write
    /// turnaround.
    #[inline]
    pub fn set_write_mode(&mut self) {
        self.swdio.set_as_output();
        self.direction = Direction::Write;
        self.clock_pulse();
    }

    /// Write-to-read turnaround: release SWDIO and clock the one cycle gap
    /// before the target starts driving.
    #[inline]
    pub fn turn_around(&mut self) {
        self.set_read_mode();
        self.clock_pulse();
    }

    /// Drive SWDIO to a level, without clocking.
    #[inline]
    pub fn set_swdio(&mut self, high: bool) {
        debug_assert_eq!(
            self.direction,
            Direction::Write,
            "SWDIO driven while in read mode"
        );
        let Ok(()) = if high {
            self.swdio.set_high()
        } else {
            self.swdio.set_low()
        };
    }

    /// Write the low `length` bits of `value`, LSB first, one clock pulse
    /// per bit.  The link must be in write mode.
    ///
    /// Panics if `length` is more than [`MAX_BITS`].
    pub fn write_bits(&mut self, value: u64, length: usize) {
        assert!(length <= MAX_BITS, "{length} bits is more than a u64");
        trace!("Info:  Writing {length} bits: 0x{value:0X}");
        let mut data = value;
        for _ in 0..length {
            self.set_swdio(data & 1 == 1);
            self.clock_pulse();
            data >>= 1;
        }
    }

    /// Read `length` bits, LSB first, sampling SWDIO before each clock
    /// pulse.  The link must be in read mode.
    ///
    /// Panics if `length` is more than [`MAX_BITS`].
    pub fn read_bits(&mut self, length: usize) -> u64 {
        assert!(length <= MAX_BITS, "{length} bits is more than a u64");
        let mut data = 0u64;
        for ii in 0..length {
            if self.read_bit() {
                data |= 1 << ii;
            }
        }
        trace!("Info:  Read {length} bits: 0x{data:0X}");
        data
    }

    /// Read the 3-bit acknowledgement which follows a request's turnaround.
    ///
    /// `request` is the header that was sent, and is only used to log which
    /// command the acknowledgement answers.
    pub fn read_ack(&mut self, request: u8) -> Ack {
        let ack = Ack::from_bits(self.read_bits(Ack::BITS) as u8);
        match ack {
            Ack::Ok => trace!("Value: ACK {ack}  SWD: {request:#04X}"),
            _ => debug!("Value: ACK {ack} (0b{:03b})  SWD: {request:#04X}", ack.raw()),
        }
        ack
    }

    #[inline]
    fn read_bit(&mut self) -> bool {
        debug_assert_eq!(
            self.direction,
            Direction::Read,
            "SWDIO sampled while in write mode"
        );
        let Ok(bit) = self.swdio.is_high();
        self.clock_pulse();
        bit
    }
}
