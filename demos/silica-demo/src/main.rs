//! Silica demo firmware.
//!
//! Reads an initialized global (only correct if `.data` was relocated), writes
//! it to RAM through MMIO, then takes one machine software interrupt through
//! an application-defined entry that updates the same global.

#![cfg_attr(target_os = "none", no_std)]
#![no_main]

cfg_if::cfg_if! {
    if #[cfg(target_os = "none")] {
        use core::arch::asm;

        use silica::{foundation, mmio, trap_entry, with_traps_masked};
        use silica::{MmioRegister, TrapShared, TrapsMasked};

        const RAM_START: usize = 0x2000_0000;
        const RESULT: usize = RAM_START + 0x100;
        const DEBUG_PORT: usize = RAM_START + 0x200;

        const CLINT_MSIP: usize = 0x0200_0000;
        const MIE_MSIE: usize = 1 << 3;

        static MSIP: MmioRegister<u32> = unsafe { MmioRegister::new(CLINT_MSIP) };

        static OTHER_GLOBAL: TrapShared<u32> = TrapShared::new(42);
        static SOFT_INTERRUPTS: TrapShared<u32> = TrapShared::new(0);

        extern "C" fn on_machine_soft() {
            let mut masked = unsafe { TrapsMasked::assume() };
            SOFT_INTERRUPTS.with_mut(&mut masked, |count| *count += 1);
            OTHER_GLOBAL.set(&mut masked, 2);
            // Level-triggered: clear before mret or the trap is taken again.
            MSIP.write(0);
        }

        trap_entry!(MachineSoft => on_machine_soft);

        #[unsafe(no_mangle)]
        extern "C" fn main() -> ! {
            let cycles: usize;
            unsafe { asm!("rdcycle {0}", out(reg) cycles, options(nomem, nostack)) };
            debug::writeln!("[DEMO] main entered at cycle {}", cycles);

            let initial = with_traps_masked(|masked| OTHER_GLOBAL.get(masked));
            unsafe { mmio::write_volatile(RESULT, initial) };

            unsafe {
                asm!("csrs mie, {msie}", msie = in(reg) MIE_MSIE, options(nostack));
                foundation::enable_interrupts();
            }
            MSIP.write(1);

            loop {
                let (seen, value) = with_traps_masked(|masked| {
                    (SOFT_INTERRUPTS.get(masked), OTHER_GLOBAL.get(masked))
                });
                if seen > 0 {
                    unsafe { mmio::write_volatile(RESULT + 4, value) };
                    debug::writeln!("[DEMO] {} soft interrupt(s), global now {}", seen, value);
                    foundation::halt();
                }
            }
        }

        #[cfg(feature = "debug")]
        #[unsafe(no_mangle)]
        extern "C" fn __silica_debug_write(buf: *const u8, len: usize) {
            let bytes = unsafe { core::slice::from_raw_parts(buf, len) };
            for &byte in bytes {
                unsafe { mmio::write_volatile(DEBUG_PORT, byte) };
            }
        }

        #[panic_handler]
        fn panic(info: &core::panic::PanicInfo<'_>) -> ! {
            debug::writeln!("[PANIC] {}", info);
            foundation::halt()
        }
    } else {
        use silica::arch_riscv::{DispatchMode, POLICY};

        /// Host build: describe what the firmware image would install.
        #[unsafe(no_mangle)]
        extern "C" fn main() -> ! {
            println!("silica-demo: {} vector table", DispatchMode::ACTIVE.name());
            for (cause, disposition) in POLICY.iter() {
                println!(
                    "{:>4}  {:<22} {}",
                    cause.slot(),
                    cause,
                    disposition.handler_symbol()
                );
            }
            std::process::exit(0)
        }
    }
}
