//! Primitives every other Silica crate builds on. Nothing in here allocates or
//! touches a global, so all of it is usable from boot code.

#![no_std]

pub mod cpu;
pub mod mmio;
pub mod shared;

pub use cpu::{enable_interrupts, halt};
pub use mmio::MmioRegister;
pub use shared::{with_traps_masked, TrapShared, TrapsMasked};
