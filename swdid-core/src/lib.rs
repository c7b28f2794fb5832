// Copyright (C) 2025 swdid contributors
//
// MIT License

//! swdid-core - ARM debug port identification concepts.
//!
//! Designed to be used in conjunction with the `swdid-swd` library, which
//! reads the identification register from a target over ARM Serial Wire
//! Debug (SWD).  Nothing in this crate knows about the SWD wire protocol.
//!
//! * [`IdCode`] wraps the 32-bit Debug Port identification register
//!   (IDCODE, also known as DPIDR) and decodes its fields.
//! * [`Cortex`] classifies well-known DPIDR values by core type.
//!
//! This library is `no_std` and does not require an allocator.

#![no_std]

pub mod arm;

#[doc(inline)]
pub use crate::arm::Cortex;
#[doc(inline)]
pub use crate::arm::dp::IdCode;
