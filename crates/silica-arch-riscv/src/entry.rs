//! Application-defined trap entries.
//!
//! ```ignore
//! extern "C" fn on_timer() { /* ... */ }
//! silica_arch_riscv::trap_entry!(MachineTimer => on_timer);
//! ```
//!
//! The entry name must be a `TrapCause` variant; it becomes the strong symbol
//! that replaces the weak default in that slot. The body runs with machine
//! interrupts masked and may use `TrapsMasked::assume`.

/// Registers the RISC-V C ABI lets a callee clobber, in frame order.
pub const CALLER_SAVED: [&str; 16] = [
    "ra", "t0", "t1", "t2", "a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7", "t3", "t4", "t5",
    "t6",
];

/// Bytes the entry prologue reserves below `sp`. Keeps `sp` 16-byte aligned.
pub const TRAP_FRAME_BYTES: usize = CALLER_SAVED.len() * core::mem::size_of::<usize>();

const _: () = assert!(TRAP_FRAME_BYTES % 16 == 0);

#[doc(hidden)]
#[macro_export]
macro_rules! __caller_saved {
    ($op:literal, $width:literal) => {
        concat!(
            $op, " ra, 0*", $width, "(sp)\n",
            $op, " t0, 1*", $width, "(sp)\n",
            $op, " t1, 2*", $width, "(sp)\n",
            $op, " t2, 3*", $width, "(sp)\n",
            $op, " a0, 4*", $width, "(sp)\n",
            $op, " a1, 5*", $width, "(sp)\n",
            $op, " a2, 6*", $width, "(sp)\n",
            $op, " a3, 7*", $width, "(sp)\n",
            $op, " a4, 8*", $width, "(sp)\n",
            $op, " a5, 9*", $width, "(sp)\n",
            $op, " a6, 10*", $width, "(sp)\n",
            $op, " a7, 11*", $width, "(sp)\n",
            $op, " t3, 12*", $width, "(sp)\n",
            $op, " t4, 13*", $width, "(sp)\n",
            $op, " t5, 14*", $width, "(sp)\n",
            $op, " t6, 15*", $width, "(sp)\n",
        )
    };
}

#[cfg(target_pointer_width = "64")]
#[doc(hidden)]
#[macro_export]
macro_rules! __trap_frame {
    (save) => {
        concat!("addi sp, sp, -16*8\n", $crate::__caller_saved!("sd", "8"))
    };
    (restore) => {
        concat!($crate::__caller_saved!("ld", "8"), "addi sp, sp, 16*8\n")
    };
}

#[cfg(not(target_pointer_width = "64"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __trap_frame {
    (save) => {
        concat!("addi sp, sp, -16*4\n", $crate::__caller_saved!("sw", "4"))
    };
    (restore) => {
        concat!($crate::__caller_saved!("lw", "4"), "addi sp, sp, 16*4\n")
    };
}

/// Defines the strong entry symbol for one trap cause.
#[macro_export]
macro_rules! trap_entry {
    ($entry:ident => $body:path) => {
        const _: $crate::TrapCause = $crate::TrapCause::$entry;
        const _: extern "C" fn() = $body;

        #[allow(non_snake_case)]
        #[unsafe(naked)]
        #[link_section = ".text.trap"]
        #[no_mangle]
        pub unsafe extern "C" fn $entry() {
            core::arch::naked_asm!(
                $crate::__trap_frame!(save),
                "call {body}",
                $crate::__trap_frame!(restore),
                "mret",
                body = sym $body,
            )
        }
    };
}
