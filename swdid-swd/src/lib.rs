// Copyright (C) 2025 swdid contributors
//
// MIT License

//! swdid-swd library
//!
//! A bit-banged ARM Serial Wire Debug (SWD) host, which wakes a target's
//! debug port, switches it to SWD, and reads its identification register
//! (IDCODE/DPIDR), using the
//! [ARM SWD protocol](https://developer.arm.com/documentation/ihi0031/latest/)
//!
//! It is `no_std`, needs no allocator, and is written against the
//! [`embedded-hal`](https://docs.rs/embedded-hal/1) 1.0 traits.  With the
//! `esp32c3` feature it can be created directly from
//! [`esp-hal`](https://docs.espressif.com/projects/rust/) GPIO pins.
//!
//! The following diagram shows the key `swdid-swd` concepts.
//!
//! ```text
//!   Application          |  Result<IdCode, SwdError>
//! ----------------------
//!      SwdSession         \
//! ----------------------   |--  SwdError / Ack
//!      SwdLink            /
//! ----------------------
//!  SwdioPin + OutputPin  >======================<       SWD Target
//!      + DelayNs             SWDIO/SWCLK/GND
//! ```
//!
//! * [`SwdSession`] runs the fixed wake / reset / JTAG-to-SWD / IDCODE
//!   handshake and records what it found.
//! * [`SwdLink`] implements the SWD wire primitives through bit-banging.
//! * [`SwdioPin`] is the one thing `embedded-hal` does not describe: a pin
//!   whose direction can be switched.
//!
//! ```rust,ignore
//! use swdid_swd::{SwdLink, SwdSession};
//!
//! let mut session = SwdSession::new(SwdLink::new(swdio, swclk, delay));
//! match session.run_handshake() {
//!     Ok(idcode) => info!("Found {idcode:#}"),
//!     Err(e) => warn!("No device: {e}"),
//! }
//! ```
//!
//! `swdid-swd` uses the [`swdid_core`] library for the [`IdCode`] type and
//! its decoding.

#![no_std]

pub mod link;
pub mod pins;
pub mod session;

#[doc(inline)]
pub use crate::link::{Direction, Speed, SwdLink};
#[doc(inline)]
pub use crate::pins::SwdioPin;
#[doc(inline)]
pub use crate::session::{SessionState, SwdSession};
#[doc(inline)]
pub use swdid_core::IdCode;

#[cfg(feature = "esp32c3")]
#[doc(inline)]
pub use crate::pins::from_pins;

use core::fmt;
use serde::Serialize;

/// SWD acknowledgement, the 3 bits the target returns after a request.
///
/// Only [`Ack::Ok`] means the request was accepted.  The other values are
/// kept distinct so that callers can tell a busy target ([`Ack::Wait`]) from
/// a faulted ([`Ack::Fault`]) or absent ([`Ack::Invalid`]) one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ack {
    /// 0b001 - request accepted.
    Ok,

    /// 0b010 - target busy.  SWD expects the request to be retried.
    Wait,

    /// 0b100 - target has a sticky error set.
    Fault,

    /// Any other value.  0b111 means SWDIO was high (pulled up, undriven)
    /// for the entire acknowledge phase, which is what an absent or
    /// unresponsive target looks like.
    Invalid(u8),
}

impl Ack {
    /// Number of bits in an acknowledgement.
    pub const BITS: usize = 3;

    pub const OK: u8 = 0b001;
    pub const WAIT: u8 = 0b010;
    pub const FAULT: u8 = 0b100;

    /// Decodes an acknowledgement from bits read LSB first.  Only the low 3
    /// bits are used.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            Self::OK => Ack::Ok,
            Self::WAIT => Ack::Wait,
            Self::FAULT => Ack::Fault,
            other => Ack::Invalid(other),
        }
    }

    /// The raw 3-bit value.
    pub fn raw(&self) -> u8 {
        match self {
            Ack::Ok => Self::OK,
            Ack::Wait => Self::WAIT,
            Ack::Fault => Self::FAULT,
            Ack::Invalid(bits) => *bits,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Ack::Ok)
    }

    /// Returns a string representation of the acknowledgement.
    pub fn as_str(&self) -> &'static str {
        match self {
            Ack::Ok => "OK",
            Ack::Wait => "WAIT",
            Ack::Fault => "FAULT",
            Ack::Invalid(_) => "invalid",
        }
    }

    /// `Ok(())` for [`Ack::Ok`], otherwise the [`SwdError`] to report.
    pub fn check(self) -> Result<(), SwdError> {
        match self {
            Ack::Ok => Ok(()),
            ack => Err(SwdError::AckRejected(ack)),
        }
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ack::Invalid(bits) => write!(f, "{} (0b{bits:03b})", self.as_str()),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

impl Serialize for Ack {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.raw())
    }
}

/// Core error type used by all swdid-swd objects
///
/// Errors are never retried by `swdid-swd` itself.  Methods are provided to
/// help callers decide what to do next:
///
/// - [`SwdError::requires_retry()`]
/// - [`SwdError::requires_reset()`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwdError {
    /// The target responded to a request with something other than an OK
    /// acknowledgement.  The acknowledgement received is included.
    ///
    /// For the IDCODE request this means no usable device was found.  A
    /// [`Ack::Wait`] may succeed if the whole handshake is re-run.
    ///
    /// Errors from this crate are built by [`Ack::check()`] and never hold
    /// [`Ack::Ok`].
    AckRejected(Ack),
}

impl SwdError {
    /// Returns true if the error requires a new handshake, and likely a
    /// target reset, to recover.
    pub fn requires_reset(&self) -> bool {
        !self.requires_retry()
    }

    /// Returns true if the error is a transient error that can be retried.
    /// This is just the `Wait` acknowledgement from the SWD target.
    pub fn requires_retry(&self) -> bool {
        matches!(self, SwdError::AckRejected(Ack::Wait))
    }

    /// The acknowledgement that caused this error.
    pub fn ack(&self) -> Ack {
        match self {
            SwdError::AckRejected(ack) => *ack,
        }
    }

    /// Returns a string representation of the error.
    pub fn as_str(&self) -> &'static str {
        match self {
            SwdError::AckRejected(Ack::Ok) => "OK ACK",
            SwdError::AckRejected(Ack::Wait) => "Wait ACK",
            SwdError::AckRejected(Ack::Fault) => "Fault ACK",
            SwdError::AckRejected(Ack::Invalid(_)) => "No ACK",
        }
    }
}

impl Serialize for SwdError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("SwdError", 2)?;

        let kind = match self {
            SwdError::AckRejected(Ack::Ok) => "ok ack",
            SwdError::AckRejected(Ack::Wait) => "wait ack",
            SwdError::AckRejected(Ack::Fault) => "fault ack",
            SwdError::AckRejected(Ack::Invalid(_)) => "no ack",
        };
        state.serialize_field("kind", kind)?;
        state.serialize_field("ack", &self.ack())?;
        state.end()
    }
}

impl fmt::Display for SwdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwdError::AckRejected(ack) => write!(f, "{}: {ack}", self.as_str()),
        }
    }
}

impl core::error::Error for SwdError {}

/// Calculate SWD parity - 1 for an odd number of bits set to 1, 0 otherwise.
pub(crate) fn calculate_parity<T>(value: T) -> bool
where
    T: Into<u64>,
{
    (value.into().count_ones() % 2) == 1
}
