// Copyright (C) 2025 swdid contributors
//
// MIT License

//! SWD Session Protocol
//!
//! This module composes the [`SwdLink`] primitives into the handshake that
//! takes a debug port from an unknown state (JTAG, dormant, or SWD) to SWD,
//! and reads its IDCODE.  It provides [`SwdSession`].

use core::convert::Infallible;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::Serialize;
use static_assertions::const_assert;

use swdid_core::{Cortex, IdCode};

use crate::link::{Speed, SwdLink};
use crate::pins::SwdioPin;
use crate::{SwdError, calculate_parity};

// 8+ cycles with SWDIO high to begin exiting dormant mode
pub const DORMANT_EXIT_SWDIO_HIGH_CYCLES: u32 = 8;

/// Selection alert sequence, transmitted byte by byte, each LSB first.
pub const SELECTION_ALERT_SEQUENCE: [u8; 16] = [
    0x92, 0xF3, 0x09, 0x62, 0x95, 0x2D, 0x85, 0x86, 0xE9, 0xAF, 0xDD, 0xE3, 0xA2, 0x0E, 0xBC, 0x19,
];

// 4 cycles with SWDIO low between the alert sequence and activation code
pub const DORMANT_EXIT_SWDIO_LOW_CYCLES: u32 = 4;

// Defined as 0b01011000 MSB, or 0b00011010 LSB first
pub const SWD_ACTIVATION_CODE_SEQUENCE: u8 = 0x1A;

// 50+ clock cycles with SWDIO high.  At least 52, plus 10 margin.
pub const LINE_RESET_SWDIO_HIGH_CYCLES: u32 = 52 + 10;

// Clock cycles with SWDIO low to terminate a line reset
pub const LINE_RESET_SWDIO_LOW_CYCLES: u32 = 4;

// JTAG-to-SWD sequence as documented: 0111100111100111
const JTAG_TO_SWD_DOCUMENTED: u16 = 0b0111_1001_1110_0111; // 0x79E7

/// JTAG-to-SWD sequence, reversed for SWD LSB-first transmission.
pub const JTAG_TO_SWD_SEQUENCE: u16 = JTAG_TO_SWD_DOCUMENTED.reverse_bits(); // 0xE79E

// Idle cycles with SWDIO low before the first request
pub const PRE_REQUEST_IDLE_CYCLES: u32 = 4;

/// IDCODE read request, fixed encoding.
///
/// This is the complete 8-bit header for a DP read of address 0x0: start=1,
/// APnDP=0, RnW=1, A[3:2]=00, parity=1, stop=0, park=1.  It is the only
/// request this crate issues - it is not a general packet builder.
pub const IDCODE_READ_REQUEST: u8 = 0xA5;

// Minimum 8 clocks after a single operation
pub const POST_SINGLE_OPERATION_CYCLES: u32 = 8;

const_assert!(LINE_RESET_SWDIO_HIGH_CYCLES >= 52);
const_assert!(LINE_RESET_SWDIO_LOW_CYCLES >= 2);
const_assert!(DORMANT_EXIT_SWDIO_HIGH_CYCLES >= 8);
const_assert!(JTAG_TO_SWD_SEQUENCE == 0xE79E);

/// Outcome of the most recent handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// No handshake has completed yet.
    #[default]
    Uninitialized,

    /// The target acknowledged the IDCODE request and its IDCODE was read.
    DeviceFound,

    /// The handshake failed.
    NoDevice,
}

/// SWD Session object
///
/// Exclusively owns an [`SwdLink`], and with it the SWD pins, and records
/// the result of the last handshake.  There is no global state, so any
/// number of sessions on different pins can coexist.
///
/// Create using `SwdSession::new()` passing in an [`SwdLink`] instance, or
/// [`SwdSession::from_parts()`]:
///
/// ```rust,ignore
/// use swdid_swd::SwdSession;
///
/// let mut session = SwdSession::from_parts(swdio_pin, swclk_pin, delay);
/// let idcode = session.run_handshake()?;
/// info!("IDCODE: {idcode:#}");
/// ```
#[derive(Debug)]
pub struct SwdSession<IO, CLK, D> {
    link: SwdLink<IO, CLK, D>,
    state: SessionState,
    idcode: Option<IdCode>,
    parity_error: bool,
}

impl<IO, CLK, D> SwdSession<IO, CLK, D>
where
    IO: SwdioPin<Error = Infallible>,
    CLK: OutputPin<Error = Infallible>,
    D: DelayNs,
{
    /// Creates a new SWD session using the given [`SwdLink`] instance.
    pub fn new(link: SwdLink<IO, CLK, D>) -> Self {
        Self {
            link,
            state: SessionState::Uninitialized,
            idcode: None,
            parity_error: false,
        }
    }

    /// Creates a new SWD session, and its link, from the pins and delay.
    pub fn from_parts(swdio: IO, swclk: CLK, delay: D) -> Self {
        Self::new(SwdLink::new(swdio, swclk, delay))
    }

    /// Runs the whole handshake: wake from dormant, line reset, JTAG-to-SWD,
    /// line reset, idle, then read IDCODE.
    ///
    /// Can be called repeatedly.  Each call starts from scratch, and
    /// discards the result of the previous one.
    ///
    /// Returns:
    /// - `Ok(IdCode)`: the target acknowledged the request.  The session is
    ///   now [`SessionState::DeviceFound`].  A parity mismatch on the IDCODE
    ///   is logged and reported by [`Self::parity_error()`], but does not
    ///   fail the handshake.
    /// - `Err(SwdError)`: the target did not return an OK acknowledgement.
    ///   The session is now [`SessionState::NoDevice`].
    pub fn run_handshake(&mut self) -> Result<IdCode, SwdError> {
        trace!("Exec:  SWD handshake");
        self.reset_internal_state();

        self.link.set_write_mode();
        self.wake_from_dormant();
        self.line_reset();
        self.jtag_to_swd();
        self.line_reset();
        self.idle_cycles(PRE_REQUEST_IDLE_CYCLES);

        match self.read_idcode() {
            Ok(idcode) => {
                info!("Value: Found device, IDCODE {idcode:#}");
                self.idcode = Some(idcode);
                self.state = SessionState::DeviceFound;
                Ok(idcode)
            }
            Err(e) => {
                debug!("Error: No device found: {e}");
                self.state = SessionState::NoDevice;
                Err(e)
            }
        }
    }

    // Resets internal state of the session.
    fn reset_internal_state(&mut self) {
        self.idcode = None;
        self.parity_error = false;
        self.state = SessionState::Uninitialized;
    }

    /// Sends the dormant-to-SWD wake sequence: 8 priming cycles with SWDIO
    /// high, the selection alert sequence, 4 cycles low, and the SWD
    /// activation code.
    ///
    /// Targets which are not dormant ignore this sequence.
    pub fn wake_from_dormant(&mut self) {
        trace!("Exec:  Selection alert and SWD activation");
        self.link.set_swdio(true);
        self.link.clock(DORMANT_EXIT_SWDIO_HIGH_CYCLES);

        for &byte in SELECTION_ALERT_SEQUENCE.iter() {
            self.link.write_bits(byte as u64, 8);
        }

        self.idle_cycles(DORMANT_EXIT_SWDIO_LOW_CYCLES);

        self.link.write_bits(SWD_ACTIVATION_CODE_SEQUENCE as u64, 8);
    }

    /// Performs a line reset: SWDIO high for
    /// [`LINE_RESET_SWDIO_HIGH_CYCLES`], low for
    /// [`LINE_RESET_SWDIO_LOW_CYCLES`], and finally left high.
    pub fn line_reset(&mut self) {
        trace!("Exec:  Line reset");
        self.link.set_swdio(true);
        self.link.clock(LINE_RESET_SWDIO_HIGH_CYCLES);

        self.link.set_swdio(false);
        self.link.clock(LINE_RESET_SWDIO_LOW_CYCLES);

        self.link.set_swdio(true);
    }

    /// Sends the 16-bit JTAG-to-SWD switching sequence.
    pub fn jtag_to_swd(&mut self) {
        trace!("Exec:  JTAG-to-SWD");
        self.link.write_bits(JTAG_TO_SWD_SEQUENCE as u64, 16);
    }

    /// Clocks `cycles` idle (zero) bits.
    pub fn idle_cycles(&mut self, cycles: u32) {
        self.link.set_swdio(false);
        self.link.clock(cycles);
    }

    /// Issues the IDCODE read request and reads the response.
    ///
    /// The target must already be in SWD mode and past a line reset, which
    /// [`Self::run_handshake()`] takes care of.  This does not update the
    /// session state, other than [`Self::parity_error()`].
    ///
    /// On return the link is back in write mode, with SWDIO low, whatever
    /// the outcome.
    pub fn read_idcode(&mut self) -> Result<IdCode, SwdError> {
        trace!("Exec:  DP Read IDCODE  SWD: {IDCODE_READ_REQUEST:#04X}");
        self.parity_error = false;
        self.link.write_bits(IDCODE_READ_REQUEST as u64, 8);

        self.link.turn_around();
        let ack = self.link.read_ack(IDCODE_READ_REQUEST);
        if let Err(e) = ack.check() {
            debug!("Error: DP Read IDCODE  {e}");
            // Turnaround, so the host drives SWDIO again
            self.finish_operation(0);
            return Err(e);
        }

        let data = self.link.read_bits(32) as u32;
        // Clocked even if the target does not drive it
        let parity = self.link.read_bits(1) == 1;
        self.finish_operation(POST_SINGLE_OPERATION_CYCLES);

        self.parity_error = calculate_parity(data) != parity;
        if self.parity_error {
            warn!("SWD read parity mismatch: data=0x{data:08X}, parity={parity}");
        }

        trace!("OK:    DP Read IDCODE            {data:#010X}");
        Ok(IdCode::from_u32(data))
    }

    // Turn the bus around to write and clock idle cycles with SWDIO low
    fn finish_operation(&mut self, idle_cycles: u32) {
        self.link.set_write_mode();
        self.idle_cycles(idle_cycles);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The IDCODE read by the last handshake, if it succeeded.
    pub fn idcode(&self) -> Option<IdCode> {
        self.idcode
    }

    /// The core type implied by the IDCODE, if a device was found and its
    /// IDCODE is a well-known one.
    pub fn cortex(&self) -> Option<Cortex> {
        self.idcode.and_then(Cortex::from_idcode)
    }

    /// Whether the parity bit following the last IDCODE read did not match
    /// the data.  The IDCODE is still reported.
    pub fn parity_error(&self) -> bool {
        self.parity_error
    }

    /// Whether the last handshake found a device.
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::DeviceFound
    }

    pub fn speed(&self) -> Speed {
        self.link.speed()
    }

    /// Sets the SWD clock speed.  Can be changed at any time, and applies
    /// from the next clock pulse.
    pub fn set_speed(&mut self, speed: Speed) {
        self.link.set_speed(speed);
    }

    pub fn link(&self) -> &SwdLink<IO, CLK, D> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut SwdLink<IO, CLK, D> {
        &mut self.link
    }

    /// Ends the session, giving back the pins and delay provider.
    pub fn release(self) -> (IO, CLK, D) {
        self.link.release()
    }
}
