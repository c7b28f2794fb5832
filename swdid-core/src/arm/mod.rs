// Copyright (C) 2025 swdid contributors
//
// MIT License

//! Contains ARM specific objects and routines

pub mod dp;

use core::fmt;
use serde::Serialize;
use static_assertions::const_assert;

use dp::IdCode;

/// ARM Cortex core type, as implied by the DPIDR of its debug port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cortex {
    /// Cortex-M0 / M0+ (DPv1 MINDP)
    M0,
    /// Cortex-M3
    M3,
    /// Cortex-M4 / M7
    M4,
    /// Cortex-M33
    M33,
}

// Every known DPIDR must carry the RAO bit
const_assert!(Cortex::IDCODE_M0.is_valid());
const_assert!(Cortex::IDCODE_M3.is_valid());
const_assert!(Cortex::IDCODE_M4.is_valid());
const_assert!(Cortex::IDCODE_M33.is_valid());

impl Cortex {
    pub const IDCODE_M0: IdCode = IdCode::from_u32(0x0BC1_2477);
    pub const IDCODE_M3: IdCode = IdCode::from_u32(0x1BA0_1477);
    pub const IDCODE_M4: IdCode = IdCode::from_u32(0x2BA0_1477);
    pub const IDCODE_M33: IdCode = IdCode::from_u32(0x4C01_3477);

    /// Returns the DPIDR IDCODE for this core type
    pub fn idcode(&self) -> IdCode {
        match self {
            Cortex::M0 => Self::IDCODE_M0,
            Cortex::M3 => Self::IDCODE_M3,
            Cortex::M4 => Self::IDCODE_M4,
            Cortex::M33 => Self::IDCODE_M33,
        }
    }

    /// Returns the core type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Cortex::M0 => "Cortex-M0",
            Cortex::M3 => "Cortex-M3",
            Cortex::M4 => "Cortex-M4",
            Cortex::M33 => "Cortex-M33",
        }
    }

    /// Classifies an IDCODE.  Only exact matches against the well-known
    /// values are recognised - a debug port with a different revision is
    /// reported as `None`.
    pub fn from_idcode(idcode: IdCode) -> Option<Cortex> {
        match idcode {
            Self::IDCODE_M0 => Some(Cortex::M0),
            Self::IDCODE_M3 => Some(Cortex::M3),
            Self::IDCODE_M4 => Some(Cortex::M4),
            Self::IDCODE_M33 => Some(Cortex::M33),
            _ => None,
        }
    }
}

impl fmt::Display for Cortex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARM {}", self.as_str())
    }
}
