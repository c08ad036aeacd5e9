//! Single dependency for Silica firmware. Pulls in the boot core and re-exports
//! the pieces an application touches.

#![no_std]

pub use arch_riscv;
pub use debug;
pub use foundation;

pub use arch_riscv::{trap_entry, TrapCause};
pub use foundation::{halt, mmio, with_traps_masked, MmioRegister, TrapShared, TrapsMasked};
