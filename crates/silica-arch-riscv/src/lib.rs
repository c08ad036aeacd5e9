//! RISC-V boot core: reset entry, `.data`/`.bss` setup and the fixed trap
//! vector table.
//!
//! The linker script MUST provide `_sidata`, `_sdata`, `_edata`, `_sbss`,
//! `_ebss` and place `.text.boot` at the reset address and `.vectortable` on a
//! 256-byte boundary. The application MUST provide `extern "C" fn main() -> !`.
//! `__stack_top` and `__global_pointer$` are optional.

#![no_std]
#![recursion_limit = "256"]

#[macro_use]
pub mod cause;

pub mod dispatch;
pub mod entry;
pub mod reloc;
pub mod vector;

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub mod boot;
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub mod handlers;

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
extern "C" {
    // Application entry, reached from `__bootstrap`.
    fn main() -> !;
}

pub use cause::{decode_trap, CauseKind, TrapCause, UnknownCause, Xlen, VECTOR_COUNT};
pub use dispatch::{FaultRecord, Hart, HartState, HaltRegisters, TrapBase, TrapOutcome, TrapRoute};
pub use riscv::register::mcause::{Exception, Interrupt, Trap};
pub use vector::{
    DispatchMode, Disposition, VectorTable, POLICY, VECTORED_ENTRY, VECTOR_TABLE_ALIGN,
};

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub use boot::{__bootstrap, _start};
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub use handlers::{__silica_halt, __silica_resume};
