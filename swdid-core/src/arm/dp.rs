// Copyright (C) 2025 swdid contributors
//
// MIT License

//! ARM Debug Port identification register

use core::fmt;
use serde::Serialize;

/// JEP106 designer code for ARM Ltd
const DESIGNER_ARM: u16 = 0x23B;

/// Part number used by ARM's own SW-DP / SWJ-DP implementations
const PART_ARM_DP: u8 = 0xBA;

/// ARM Debug Port IDCODE (DPIDR) register data
///
/// Layout:
///
/// ```text
///  31    28 27      20 19  17  16  15  12 11          1  0
/// +--------+----------+------+---+------+-------------+---+
/// |REVISION| PARTNO   | RES0 |MIN|VERSION|  DESIGNER  |RAO|
/// +--------+----------+------+---+------+-------------+---+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct IdCode(u32);

impl IdCode {
    pub const fn new(value: u32) -> Self {
        IdCode(value)
    }

    pub const fn from_u32(value: u32) -> Self {
        IdCode(value)
    }

    pub const fn data(&self) -> u32 {
        self.0
    }

    /// Get revision field (bits 31:28)
    pub const fn revision(&self) -> u8 {
        ((self.0 >> 28) & 0xF) as u8
    }

    /// Get part number (bits 27:20)
    pub const fn part_number(&self) -> u8 {
        ((self.0 >> 20) & 0xFF) as u8
    }

    /// Get MIN (bit 16) - set when the debug port implements the minimal
    /// debug port architecture
    pub const fn min(&self) -> bool {
        (self.0 & (1 << 16)) != 0
    }

    /// Get version (bits 15:12)
    pub const fn version(&self) -> u8 {
        ((self.0 >> 12) & 0xF) as u8
    }

    /// Get JEDEC designer ID (bits 11:1)
    pub const fn designer_id(&self) -> u16 {
        ((self.0 >> 1) & 0x7FF) as u16
    }

    /// JEP106 continuation code, the number of 0x7F bytes preceding the
    /// identity code (bits 11:8)
    pub const fn designer_continuation(&self) -> u8 {
        ((self.0 >> 8) & 0xF) as u8
    }

    /// JEP106 identity code, without parity (bits 7:1)
    pub const fn designer_identity(&self) -> u8 {
        ((self.0 >> 1) & 0x7F) as u8
    }

    /// Check if LSB is set (should always be 1 for valid IDCODE)
    pub const fn is_valid(&self) -> bool {
        (self.0 & 1) == 1
    }

    /// Get manufacturer name if known
    pub fn designer_name(&self) -> &'static str {
        match self.designer_id() {
            DESIGNER_ARM => "ARM Ltd",
            _ => "Unknown",
        }
    }

    /// Check if this is an ARM Debug Port
    pub fn is_arm_debug_port(&self) -> bool {
        self.designer_id() == DESIGNER_ARM && self.part_number() == PART_ARM_DP
    }

    /// Get part description if known
    pub fn part_description(&self) -> &'static str {
        if !self.is_arm_debug_port() {
            return "unknown";
        }
        match self.version() {
            0 => "ARM Debug Port v0",
            1 => "ARM Debug Port v1",
            2 => "ARM Debug Port v2",
            3 => "ARM Debug Port v3",
            _ => "Unknown ARM Debug Port Version",
        }
    }
}

impl From<u32> for IdCode {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl From<IdCode> for u32 {
    fn from(value: IdCode) -> Self {
        value.0
    }
}

impl fmt::Display for IdCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            if !self.is_valid() {
                return write!(f, "Invalid IDCODE: 0x{:08X} (LSB not set)", self.0);
            }

            write!(
                f,
                "0x{:08X} {} ({}, rev {})",
                self.0,
                self.part_description(),
                self.designer_name(),
                self.revision()
            )
        } else {
            write!(f, "0x{:08X}", self.0)
        }
    }
}

impl fmt::LowerHex for IdCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::UpperHex for IdCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}
