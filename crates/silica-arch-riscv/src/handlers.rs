//! Default handlers and the weak per-cause entry symbols that reach them.

use core::arch::{global_asm, naked_asm};

/// No-op handler. Returns to `mepc` with every register as the hart left it.
///
/// # Safety
/// Trap entrypoint; must only be reached through the vector table.
#[unsafe(naked)]
#[link_section = ".text.trap"]
#[no_mangle]
pub unsafe extern "C" fn __silica_resume() {
    naked_asm!("mret")
}

/// Diagnostic handler. Leaves `mcause`, `mepc` and `mtval` in `t0`, `t1` and
/// `t2` for a debugger and parks the hart.
///
/// # Safety
/// Trap entrypoint; must only be reached through the vector table.
#[unsafe(naked)]
#[link_section = ".text.trap"]
#[no_mangle]
pub unsafe extern "C" fn __silica_halt() -> ! {
    naked_asm!(
        "   csrr    t0, mcause",
        "   csrr    t1, mepc",
        "   csrr    t2, mtval",
        "   j       .",
    )
}

macro_rules! default_handler {
    (Resume) => {
        "resume"
    };
    (Halt) => {
        "halt"
    };
}

macro_rules! define_default_entries {
    ($($name:ident = $slot:literal, $kind:ident($code:literal), $disp:ident;)*) => {
        global_asm!(
            concat!(
                ".pushsection .text.trap, \"ax\"\n",
                $(
                    ".balign 4\n",
                    ".weak ", stringify!($name), "\n",
                    ".type ", stringify!($name), ", @function\n",
                    stringify!($name), ":\n",
                    "    j {", default_handler!($disp), "}\n",
                    ".size ", stringify!($name), ", . - ", stringify!($name), "\n",
                )*
                ".popsection\n",
            ),
            resume = sym __silica_resume,
            halt = sym __silica_halt,
        );
    };
}

with_trap_causes!(define_default_entries);
