//! The trap vector table.
//!
//! The table is a dense, `VECTOR_COUNT`-slot array in the `.vectortable`
//! section. Slot `i` dispatches `TrapCause` `i` to the entry symbol named after
//! the cause. The crate provides weak defaults for every entry symbol, see
//! `handlers`. Two encodings are supported:
//!
//! - pointer table (default): each slot is an XLEN-wide handler address; the
//!   hart loads `base + slot * XLEN/8` and jumps to it. `mtvec` mode bits 0.
//! - inline jump (`inline-jump` feature): each slot is a 4-byte `jal x0` and
//!   `mtvec` mode bits are 1. A vectored hart enters interrupts at
//!   `base + code * 4` but every exception at `base`, so slot 0 jumps to
//!   `__silica_vectored_entry`. That routine sends interrupt 0 to `UserSoft`
//!   and forwards exception `code` to slot `12 + code`. It uses `mscratch` to
//!   keep `t0` intact.

use crate::cause::{CauseKind, TrapCause, Xlen, VECTOR_COUNT};

/// Base alignment of the table. Covers 28 slots of 8 bytes.
pub const VECTOR_TABLE_ALIGN: usize = 256;

/// Width of one inline-jump slot. Compressed encodings are disabled there.
pub const JUMP_SLOT_WIDTH: u64 = 4;

/// Slot 0 target in an inline-jump table.
pub const VECTORED_ENTRY: &str = "__silica_vectored_entry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// No-op handler: `mret` straight back to the interrupted context.
    Resume,
    /// Diagnostic handler: latch `mcause`/`mepc`/`mtval` and halt.
    Halt,
}

impl Disposition {
    pub const fn handler_symbol(self) -> &'static str {
        match self {
            Disposition::Resume => "__silica_resume",
            Disposition::Halt => "__silica_halt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchMode {
    PointerTable,
    InlineJump,
}

impl DispatchMode {
    /// Encoding compiled into this build.
    pub const ACTIVE: DispatchMode = if cfg!(feature = "inline-jump") {
        DispatchMode::InlineJump
    } else {
        DispatchMode::PointerTable
    };

    pub const fn slot_width(self, xlen: Xlen) -> u64 {
        match self {
            DispatchMode::PointerTable => xlen.bytes(),
            DispatchMode::InlineJump => JUMP_SLOT_WIDTH,
        }
    }

    pub const fn table_bytes(self, xlen: Xlen) -> u64 {
        VECTOR_COUNT as u64 * self.slot_width(xlen)
    }

    pub const fn slot_offset(self, xlen: Xlen, cause: TrapCause) -> u64 {
        cause.slot() as u64 * self.slot_width(xlen)
    }

    /// Address of the slot serving `cause`.
    pub const fn slot_address(self, xlen: Xlen, base: u64, cause: TrapCause) -> u64 {
        base + self.slot_offset(xlen, cause)
    }

    /// Offset the hart reads (pointer table) or starts executing at (inline
    /// jump) when it takes `cause`. Vectored exceptions all enter at slot 0.
    pub const fn entry_offset(self, xlen: Xlen, cause: TrapCause) -> u64 {
        match (self, cause.kind()) {
            (DispatchMode::InlineJump, CauseKind::Exception) => 0,
            _ => self.slot_offset(xlen, cause),
        }
    }

    pub const fn entry_address(self, xlen: Xlen, base: u64, cause: TrapCause) -> u64 {
        base + self.entry_offset(xlen, cause)
    }

    /// Symbol slot `cause` must jump to or point at.
    pub const fn slot_target(self, cause: TrapCause) -> &'static str {
        match (self, cause) {
            (DispatchMode::InlineJump, TrapCause::UserSoft) => VECTORED_ENTRY,
            _ => cause.name(),
        }
    }

    /// `mtvec` MODE field.
    pub const fn mtvec_mode(self) -> usize {
        match self {
            DispatchMode::PointerTable => 0,
            DispatchMode::InlineJump => 1,
        }
    }

    /// Value to program into `mtvec` for a table at `base`.
    pub const fn mtvec(self, base: u64) -> u64 {
        base | self.mtvec_mode() as u64
    }

    pub const fn name(self) -> &'static str {
        match self {
            DispatchMode::PointerTable => "pointer-table",
            DispatchMode::InlineJump => "inline-jump",
        }
    }
}

#[repr(C, align(256))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorTable<H> {
    slots: [H; VECTOR_COUNT],
}

const _: () = assert!(core::mem::align_of::<VectorTable<usize>>() == VECTOR_TABLE_ALIGN);

impl<H: Copy> VectorTable<H> {
    /// `slots[i]` serves `TrapCause::ALL[i]`.
    pub const fn new(slots: [H; VECTOR_COUNT]) -> Self {
        Self { slots }
    }

    /// Routes every cause to `resume` or `halt` according to its disposition.
    pub const fn from_policy(resume: H, halt: H) -> Self {
        let mut slots = [resume; VECTOR_COUNT];
        let mut slot = 0;
        while slot < VECTOR_COUNT {
            if let Disposition::Halt = TrapCause::ALL[slot].disposition() {
                slots[slot] = halt;
            }
            slot += 1;
        }
        Self { slots }
    }

    #[inline]
    pub const fn entry(&self, cause: TrapCause) -> H {
        self.slots[cause.slot()]
    }

    pub const fn slots(&self) -> &[H; VECTOR_COUNT] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrapCause, H)> + '_ {
        TrapCause::ALL.iter().map(move |&cause| (cause, self.entry(cause)))
    }
}

/// Default routing of every slot.
pub const POLICY: VectorTable<Disposition> =
    VectorTable::from_policy(Disposition::Resume, Disposition::Halt);

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
mod table {
    #[cfg(not(feature = "inline-jump"))]
    pub type Handler = unsafe extern "C" fn();

    #[cfg(not(feature = "inline-jump"))]
    macro_rules! define_pointer_table {
        ($($name:ident = $slot:literal, $kind:ident($code:literal), $disp:ident;)*) => {
            #[allow(non_snake_case)]
            extern "C" {
                $(fn $name();)*
            }

            /// The table `mtvec` points at.
            #[allow(non_upper_case_globals)]
            #[link_section = ".vectortable"]
            #[no_mangle]
            #[used]
            pub static __silica_vectors: super::VectorTable<Handler> =
                super::VectorTable::new([$($name,)*]);
        };
    }

    #[cfg(not(feature = "inline-jump"))]
    with_trap_causes!(define_pointer_table);

    #[cfg(feature = "inline-jump")]
    macro_rules! define_jump_block {
        (UserSoft = 0, $k0:ident($c0:literal), $d0:ident;
         $($name:ident = $slot:literal, $kind:ident($code:literal), $disp:ident;)*) => {
            core::arch::global_asm!(
                concat!(
                    ".pushsection .vectortable, \"ax\"\n",
                    ".balign {align}\n",
                    ".option push\n",
                    ".option norvc\n",
                    ".globl __silica_vectors\n",
                    "__silica_vectors:\n",
                    "    j __silica_vectored_entry\n",
                    $("    j ", stringify!($name), "\n",)*
                    ".option pop\n",
                    ".size __silica_vectors, . - __silica_vectors\n",
                    ".popsection\n",
                ),
                align = const super::VECTOR_TABLE_ALIGN,
            );
        };
    }

    #[cfg(feature = "inline-jump")]
    with_trap_causes!(define_jump_block);

    /// Slot 0 of a vectored table. Exception `code` is counted down in `t0`
    /// and lands on local label `12 + code`, which restores `t0` and jumps to
    /// that slot. Codes past the table halt.
    #[cfg(feature = "inline-jump")]
    macro_rules! define_vectored_entry {
        ($($slot:literal)*) => {
            core::arch::global_asm!(concat!(
                ".pushsection .text.trap, \"ax\"\n",
                ".balign 4\n",
                ".globl __silica_vectored_entry\n",
                ".type __silica_vectored_entry, @function\n",
                "__silica_vectored_entry:\n",
                "    csrw mscratch, t0\n",
                "    csrr t0, mcause\n",
                "    bltz t0, 2f\n",
                $(
                    "    beqz t0, ", stringify!($slot), "f\n",
                    "    addi t0, t0, -1\n",
                )*
                "    csrr t0, mscratch\n",
                "    j __silica_halt\n",
                "2:\n",
                "    csrr t0, mscratch\n",
                "    j UserSoft\n",
                $(
                    stringify!($slot), ":\n",
                    "    csrr t0, mscratch\n",
                    "    j __silica_vectors + 4 * ", stringify!($slot), "\n",
                )*
                ".size __silica_vectored_entry, . - __silica_vectored_entry\n",
                ".popsection\n",
            ));
        };
    }

    #[cfg(feature = "inline-jump")]
    define_vectored_entry!(12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27);
}

#[cfg(all(
    any(target_arch = "riscv32", target_arch = "riscv64"),
    not(feature = "inline-jump")
))]
pub use table::{Handler, __silica_vectors};
