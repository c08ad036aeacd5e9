//! Reset entry: stack and `gp` setup, memory init, `mtvec`, then `main`.

use core::arch::naked_asm;

use crate::reloc::__silica_init_memory;
use crate::vector::DispatchMode;

/// Reset entry. Masks traps, initializes `.data`/`.bss`, installs the vector
/// table in `mtvec` and hands over to `__bootstrap`.
///
/// # Safety
/// Must only be entered by the hart at reset.
#[unsafe(naked)]
#[link_section = ".text.boot"]
#[no_mangle]
pub unsafe extern "C" fn _start() -> ! {
    naked_asm!(
        // Initialize global pointer first (RISC-V ABI requirement)
        ".weak __global_pointer$",
        ".hidden __global_pointer$",
        ".option push",
        ".option norelax",
        "   lla     gp, __global_pointer$",
        ".option pop",

        ".weak __stack_top",
        ".hidden __stack_top",
        "   lla     sp, __stack_top",
        "   andi    sp, sp, -16",

        // No trap may be taken until the table is installed.
        "   csrw    mie, zero",
        "   csrci   mstatus, {mie}",

        "   call    {init_memory}",

        "   lla     t0, __silica_vectors",
        "   ori     t0, t0, {mtvec_mode}",
        "   csrw    mtvec, t0",

        "   tail    {bootstrap}",

        mie = const foundation::cpu::MSTATUS_MIE,
        mtvec_mode = const DispatchMode::ACTIVE.mtvec_mode(),
        init_memory = sym __silica_init_memory,
        bootstrap = sym __bootstrap,
    )
}

/// # Safety
/// Must only be entered from `_start` during early boot.
#[unsafe(naked)]
#[no_mangle]
pub unsafe extern "C" fn __bootstrap() -> ! {
    naked_asm!(
        "   call    {trace_bootstrap}",
        "   call    {main}",

        // `main` is `-> !`; park the hart if it comes back anyway.
        "   j       .",

        trace_bootstrap = sym __boot_trace_bootstrap,
        main = sym crate::main,
    )
}

#[no_mangle]
extern "C" fn __boot_trace_bootstrap() {
    debug::writeln!(
        "[BOOT] memory ready, mtvec={} table",
        DispatchMode::ACTIVE.name()
    );
}
