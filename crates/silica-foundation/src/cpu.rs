use cfg_if::cfg_if;

/// `mstatus.MIE`: global machine-mode interrupt enable.
pub const MSTATUS_MIE: usize = 1 << 3;

cfg_if! {
    if #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))] {
        use core::arch::asm;

        /// Terminal state. Only a debugger or a reset gets the hart out of here.
        #[inline(always)]
        pub fn halt() -> ! {
            // `j .` is a single-instruction loop; `spin_loop()` emits nothing
            // without Zihintpause.
            unsafe { asm!("j .", options(noreturn, nomem, nostack)) }
        }

        /// # Safety
        /// Every handler reachable from the vector table must be ready to run,
        /// and any state they share with the caller must be behind `TrapShared`.
        #[inline]
        pub unsafe fn enable_interrupts() {
            asm!("csrsi mstatus, {mie}", mie = const MSTATUS_MIE, options(nostack));
        }

        /// Clears `mstatus.MIE`, returning whether it was set before.
        #[inline]
        pub fn mask_interrupts() -> bool {
            let prev: usize;
            unsafe {
                asm!(
                    "csrrci {prev}, mstatus, {mie}",
                    prev = out(reg) prev,
                    mie = const MSTATUS_MIE,
                    options(nostack),
                );
            }
            prev & MSTATUS_MIE != 0
        }

        /// # Safety
        /// `was_enabled` must come from the matching `mask_interrupts` call.
        #[inline]
        pub unsafe fn restore_interrupts(was_enabled: bool) {
            if was_enabled {
                enable_interrupts();
            }
        }
    } else {
        // Host builds have no traps; these keep the pure logic testable.

        pub fn halt() -> ! {
            loop {
                core::hint::spin_loop();
            }
        }

        /// # Safety
        /// No-op off target.
        pub unsafe fn enable_interrupts() {}

        pub fn mask_interrupts() -> bool {
            false
        }

        /// # Safety
        /// No-op off target.
        pub unsafe fn restore_interrupts(_was_enabled: bool) {}
    }
}
