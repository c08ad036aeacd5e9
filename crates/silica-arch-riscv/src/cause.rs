//! The architectural trap causes, one per vector table slot.
//!
//! Interrupt slot `i` holds interrupt code `i`; exception slot `12 + c` holds
//! exception code `c`. Reserved codes keep their slot so the table stays dense.

use core::fmt;

use riscv::register::mcause::{Exception, Interrupt, Trap};

use crate::vector::Disposition;

pub const INTERRUPT_SLOTS: usize = 12;
pub const EXCEPTION_SLOTS: usize = 16;
pub const VECTOR_COUNT: usize = INTERRUPT_SLOTS + EXCEPTION_SLOTS;

/// Invokes `$callback!` with every cause in slot order:
/// `Name = slot, Kind(code), Disposition;`
macro_rules! with_trap_causes {
    ($callback:ident) => {
        $callback! {
            UserSoft = 0, Interrupt(0), Resume;
            SupervisorSoft = 1, Interrupt(1), Resume;
            ReservedInterrupt2 = 2, Interrupt(2), Resume;
            MachineSoft = 3, Interrupt(3), Resume;
            UserTimer = 4, Interrupt(4), Resume;
            SupervisorTimer = 5, Interrupt(5), Resume;
            ReservedInterrupt6 = 6, Interrupt(6), Resume;
            MachineTimer = 7, Interrupt(7), Resume;
            UserExternal = 8, Interrupt(8), Resume;
            SupervisorExternal = 9, Interrupt(9), Resume;
            ReservedInterrupt10 = 10, Interrupt(10), Resume;
            MachineExternal = 11, Interrupt(11), Resume;
            InstructionMisaligned = 12, Exception(0), Halt;
            InstructionFault = 13, Exception(1), Halt;
            IllegalInstruction = 14, Exception(2), Halt;
            Breakpoint = 15, Exception(3), Resume;
            LoadMisaligned = 16, Exception(4), Halt;
            LoadFault = 17, Exception(5), Halt;
            StoreMisaligned = 18, Exception(6), Halt;
            StoreFault = 19, Exception(7), Halt;
            UserEnvCall = 20, Exception(8), Resume;
            SupervisorEnvCall = 21, Exception(9), Resume;
            ReservedException10 = 22, Exception(10), Resume;
            MachineEnvCall = 23, Exception(11), Resume;
            InstructionPageFault = 24, Exception(12), Halt;
            LoadPageFault = 25, Exception(13), Halt;
            ReservedException14 = 26, Exception(14), Resume;
            StorePageFault = 27, Exception(15), Halt;
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CauseKind {
    Interrupt,
    Exception,
}

/// Register width, which fixes where the interrupt bit sits in `mcause` and
/// how wide a pointer-table slot is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Xlen {
    Rv32,
    Rv64,
}

impl Xlen {
    pub const NATIVE: Xlen = if usize::BITS == 64 { Xlen::Rv64 } else { Xlen::Rv32 };

    pub const fn bits(self) -> u32 {
        match self {
            Xlen::Rv32 => 32,
            Xlen::Rv64 => 64,
        }
    }

    pub const fn bytes(self) -> u64 {
        self.bits() as u64 / 8
    }

    pub const fn interrupt_bit(self) -> u64 {
        1 << (self.bits() - 1)
    }
}

macro_rules! define_trap_causes {
    ($($name:ident = $slot:literal, $kind:ident($code:literal), $disp:ident;)*) => {
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum TrapCause {
            $($name = $slot,)*
        }

        impl TrapCause {
            /// Every cause, in slot order.
            pub const ALL: [TrapCause; VECTOR_COUNT] = [$(TrapCause::$name,)*];

            /// Entry symbol name; also the variant name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(TrapCause::$name => stringify!($name),)*
                }
            }

            pub const fn kind(self) -> CauseKind {
                match self {
                    $(TrapCause::$name => CauseKind::$kind,)*
                }
            }

            /// Code within the interrupt or exception block.
            pub const fn code(self) -> usize {
                match self {
                    $(TrapCause::$name => $code,)*
                }
            }

            /// Default handler selected for this cause.
            pub const fn disposition(self) -> Disposition {
                match self {
                    $(TrapCause::$name => Disposition::$disp,)*
                }
            }
        }
    };
}

with_trap_causes!(define_trap_causes);

// Slot order is the table order the hardware indexes with.
const _: () = {
    let mut slot = 0;
    while slot < VECTOR_COUNT {
        let cause = TrapCause::ALL[slot];
        assert!(cause.slot() == slot);
        match cause.kind() {
            CauseKind::Interrupt => assert!(cause.code() == slot),
            CauseKind::Exception => assert!(cause.code() + INTERRUPT_SLOTS == slot),
        }
        slot += 1;
    }
};

impl TrapCause {
    #[inline]
    pub const fn slot(self) -> usize {
        self as usize
    }

    pub const fn from_slot(slot: usize) -> Option<Self> {
        if slot < VECTOR_COUNT {
            Some(Self::ALL[slot])
        } else {
            None
        }
    }

    pub const fn from_code(kind: CauseKind, code: usize) -> Option<Self> {
        match kind {
            CauseKind::Interrupt if code < INTERRUPT_SLOTS => Self::from_slot(code),
            CauseKind::Exception if code < EXCEPTION_SLOTS => Self::from_slot(INTERRUPT_SLOTS + code),
            _ => None,
        }
    }

    /// Decodes an `mcause` value as written by a hart of width `xlen`.
    pub const fn decode(mcause: u64, xlen: Xlen) -> Option<Self> {
        let interrupt_bit = xlen.interrupt_bit();
        let kind = if mcause & interrupt_bit != 0 {
            CauseKind::Interrupt
        } else {
            CauseKind::Exception
        };
        let code = mcause & !interrupt_bit;
        if code >= VECTOR_COUNT as u64 {
            return None;
        }
        Self::from_code(kind, code as usize)
    }

    #[inline]
    pub const fn from_mcause(mcause: usize) -> Option<Self> {
        Self::decode(mcause as u64, Xlen::NATIVE)
    }

    /// The `mcause` value the hardware writes for this cause.
    pub const fn encode(self, xlen: Xlen) -> u64 {
        match self.kind() {
            CauseKind::Interrupt => xlen.interrupt_bit() | self.code() as u64,
            CauseKind::Exception => self.code() as u64,
        }
    }

    #[inline]
    pub const fn is_interrupt(self) -> bool {
        matches!(self.kind(), CauseKind::Interrupt)
    }

    pub const fn is_reserved(self) -> bool {
        matches!(
            self,
            TrapCause::ReservedInterrupt2
                | TrapCause::ReservedInterrupt6
                | TrapCause::ReservedInterrupt10
                | TrapCause::ReservedException10
                | TrapCause::ReservedException14
        )
    }
}

impl fmt::Display for TrapCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCause(pub usize);

impl fmt::Display for UnknownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mcause {:#x} has no vector table slot", self.0)
    }
}

impl TryFrom<usize> for TrapCause {
    type Error = UnknownCause;

    fn try_from(mcause: usize) -> Result<Self, Self::Error> {
        Self::from_mcause(mcause).ok_or(UnknownCause(mcause))
    }
}

impl From<TrapCause> for Trap {
    fn from(cause: TrapCause) -> Self {
        match cause {
            TrapCause::SupervisorSoft => Trap::Interrupt(Interrupt::SupervisorSoft),
            TrapCause::MachineSoft => Trap::Interrupt(Interrupt::MachineSoft),
            TrapCause::SupervisorTimer => Trap::Interrupt(Interrupt::SupervisorTimer),
            TrapCause::MachineTimer => Trap::Interrupt(Interrupt::MachineTimer),
            TrapCause::SupervisorExternal => Trap::Interrupt(Interrupt::SupervisorExternal),
            TrapCause::MachineExternal => Trap::Interrupt(Interrupt::MachineExternal),
            c if c.is_interrupt() => Trap::Interrupt(Interrupt::Unknown),
            TrapCause::InstructionMisaligned => Trap::Exception(Exception::InstructionMisaligned),
            TrapCause::InstructionFault => Trap::Exception(Exception::InstructionFault),
            TrapCause::IllegalInstruction => Trap::Exception(Exception::IllegalInstruction),
            TrapCause::Breakpoint => Trap::Exception(Exception::Breakpoint),
            TrapCause::LoadMisaligned => Trap::Exception(Exception::LoadMisaligned),
            TrapCause::LoadFault => Trap::Exception(Exception::LoadFault),
            TrapCause::StoreMisaligned => Trap::Exception(Exception::StoreMisaligned),
            TrapCause::StoreFault => Trap::Exception(Exception::StoreFault),
            TrapCause::UserEnvCall => Trap::Exception(Exception::UserEnvCall),
            TrapCause::SupervisorEnvCall => Trap::Exception(Exception::SupervisorEnvCall),
            TrapCause::MachineEnvCall => Trap::Exception(Exception::MachineEnvCall),
            TrapCause::InstructionPageFault => Trap::Exception(Exception::InstructionPageFault),
            TrapCause::LoadPageFault => Trap::Exception(Exception::LoadPageFault),
            TrapCause::StorePageFault => Trap::Exception(Exception::StorePageFault),
            _ => Trap::Exception(Exception::Unknown),
        }
    }
}

/// Decodes `mcause` into the `riscv` crate's trap type. Causes with no slot
/// decode to the `Unknown` variant of their block.
#[inline]
pub fn decode_trap(mcause: usize) -> Trap {
    match TrapCause::from_mcause(mcause) {
        Some(cause) => cause.into(),
        None if mcause as u64 & Xlen::NATIVE.interrupt_bit() != 0 => {
            Trap::Interrupt(Interrupt::Unknown)
        }
        None => Trap::Exception(Exception::Unknown),
    }
}
