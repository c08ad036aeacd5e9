//! Executable model of what the hart does when it takes a trap: decode
//! `mcause`, enter the table where the hardware does, reach the cause's slot,
//! and run the default handler the table routes it to. Boot code never calls this; it backs host tooling and
//! lets the dispatch policy be checked without hardware.

use crate::cause::{TrapCause, Xlen};
use crate::vector::{DispatchMode, Disposition, VectorTable};

/// Fault-status CSRs as latched by the hart at trap time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultRecord {
    pub mcause: u64,
    pub mepc: u64,
    pub mtval: u64,
}

/// Where the diagnostic handler leaves the fault state for a debugger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HaltRegisters {
    pub t0: u64,
    pub t1: u64,
    pub t2: u64,
}

impl From<FaultRecord> for HaltRegisters {
    fn from(fault: FaultRecord) -> Self {
        // csrr t0, mcause; csrr t1, mepc; csrr t2, mtval
        Self {
            t0: fault.mcause,
            t1: fault.mepc,
            t2: fault.mtval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HartState {
    Running,
    Halted(HaltRegisters),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapOutcome {
    /// No-op handler ran; execution continues at `resume_pc` (= `mepc`).
    Resumed {
        cause: TrapCause,
        entry_address: u64,
        slot_address: u64,
        resume_pc: u64,
    },
    /// Diagnostic handler ran; the hart will not execute anything else.
    Halted {
        cause: TrapCause,
        entry_address: u64,
        slot_address: u64,
        registers: HaltRegisters,
    },
    /// `mcause` names no slot. Real hardware would index past the table.
    Unmapped { mcause: u64 },
    /// The hart was already halted and took nothing.
    AlreadyHalted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapBase {
    pub mode: DispatchMode,
    pub xlen: Xlen,
    pub base: u64,
}

impl TrapBase {
    pub const fn new(mode: DispatchMode, xlen: Xlen, base: u64) -> Self {
        Self { mode, xlen, base }
    }

    pub const fn mtvec(&self) -> u64 {
        self.mode.mtvec(self.base)
    }

    pub const fn slot_address(&self, cause: TrapCause) -> u64 {
        self.mode.slot_address(self.xlen, self.base, cause)
    }

    /// Where the hart lands first. Differs from the slot only for exceptions
    /// under vectored `mtvec`.
    pub const fn entry_address(&self, cause: TrapCause) -> u64 {
        self.mode.entry_address(self.xlen, self.base, cause)
    }

    /// Decodes `mcause` and locates its entry and slot.
    pub const fn resolve(&self, mcause: u64) -> Option<TrapRoute> {
        match TrapCause::decode(mcause, self.xlen) {
            Some(cause) => Some(TrapRoute {
                cause,
                entry_address: self.entry_address(cause),
                slot_address: self.slot_address(cause),
            }),
            None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapRoute {
    pub cause: TrapCause,
    pub entry_address: u64,
    pub slot_address: u64,
}

/// One hart, as far as trap handling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hart<'t> {
    trap_base: TrapBase,
    table: &'t VectorTable<Disposition>,
    state: HartState,
}

impl<'t> Hart<'t> {
    pub const fn new(trap_base: TrapBase, table: &'t VectorTable<Disposition>) -> Self {
        Self {
            trap_base,
            table,
            state: HartState::Running,
        }
    }

    pub const fn state(&self) -> HartState {
        self.state
    }

    pub fn take_trap(&mut self, fault: FaultRecord) -> TrapOutcome {
        if let HartState::Halted(_) = self.state {
            return TrapOutcome::AlreadyHalted;
        }

        let Some(TrapRoute {
            cause,
            entry_address,
            slot_address,
        }) = self.trap_base.resolve(fault.mcause)
        else {
            return TrapOutcome::Unmapped {
                mcause: fault.mcause,
            };
        };

        match self.table.entry(cause) {
            Disposition::Resume => TrapOutcome::Resumed {
                cause,
                entry_address,
                slot_address,
                resume_pc: fault.mepc,
            },
            Disposition::Halt => {
                let registers = HaltRegisters::from(fault);
                self.state = HartState::Halted(registers);
                TrapOutcome::Halted {
                    cause,
                    entry_address,
                    slot_address,
                    registers,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::POLICY;

    const RV32_TABLE: TrapBase = TrapBase::new(DispatchMode::PointerTable, Xlen::Rv32, 0x1000);

    #[test]
    fn test_illegal_instruction_halts_with_fault_state() {
        let mut hart = Hart::new(RV32_TABLE, &POLICY);
        let fault = FaultRecord {
            mcause: 2,
            mepc: 0x0000_0104,
            mtval: 0xffff_ffff,
        };

        let outcome = hart.take_trap(fault);
        let expected = HaltRegisters {
            t0: 2,
            t1: 0x0000_0104,
            t2: 0xffff_ffff,
        };
        assert_eq!(
            outcome,
            TrapOutcome::Halted {
                cause: TrapCause::IllegalInstruction,
                entry_address: 0x1000 + 48 + 8,
                slot_address: 0x1000 + 48 + 8,
                registers: expected,
            }
        );
        assert_eq!(hart.state(), HartState::Halted(expected));

        // Terminal: nothing further runs, not even a benign interrupt.
        let later = FaultRecord {
            mcause: 0x8000_0007,
            mepc: 0,
            mtval: 0,
        };
        assert_eq!(hart.take_trap(later), TrapOutcome::AlreadyHalted);
        assert_eq!(hart.state(), HartState::Halted(expected));
    }

    #[test]
    fn test_user_software_interrupt_resumes_unchanged() {
        let mut hart = Hart::new(RV32_TABLE, &POLICY);
        let fault = FaultRecord {
            mcause: 0x8000_0000,
            mepc: 0x0000_0230,
            mtval: 0,
        };
        assert_eq!(
            hart.take_trap(fault),
            TrapOutcome::Resumed {
                cause: TrapCause::UserSoft,
                entry_address: 0x1000,
                slot_address: 0x1000,
                resume_pc: 0x0000_0230,
            }
        );
        assert_eq!(hart.state(), HartState::Running);
    }

    #[test]
    fn test_reserved_interrupt_is_populated_noop() {
        let mut hart = Hart::new(RV32_TABLE, &POLICY);
        let outcome = hart.take_trap(FaultRecord {
            mcause: 0x8000_0002,
            mepc: 0x40,
            mtval: 0,
        });
        assert_eq!(
            outcome,
            TrapOutcome::Resumed {
                cause: TrapCause::ReservedInterrupt2,
                entry_address: 0x1000 + 2 * 4,
                slot_address: 0x1000 + 2 * 4,
                resume_pc: 0x40,
            }
        );
    }

    #[test]
    fn test_unmapped_cause() {
        let mut hart = Hart::new(RV32_TABLE, &POLICY);
        assert_eq!(
            hart.take_trap(FaultRecord {
                mcause: 24,
                mepc: 0,
                mtval: 0,
            }),
            TrapOutcome::Unmapped { mcause: 24 }
        );
        assert_eq!(hart.state(), HartState::Running);
    }

    #[test]
    fn test_every_fault_class_halts() {
        for cause in TrapCause::ALL {
            let mut hart = Hart::new(
                TrapBase::new(DispatchMode::InlineJump, Xlen::Rv64, 0x8000_0000),
                &POLICY,
            );
            let outcome = hart.take_trap(FaultRecord {
                mcause: cause.encode(Xlen::Rv64),
                mepc: 0x8000_1000,
                mtval: 0,
            });
            match (cause.disposition(), outcome) {
                (
                    Disposition::Halt,
                    TrapOutcome::Halted {
                        entry_address,
                        slot_address,
                        ..
                    },
                )
                | (
                    Disposition::Resume,
                    TrapOutcome::Resumed {
                        entry_address,
                        slot_address,
                        ..
                    },
                ) => {
                    assert_eq!(slot_address, 0x8000_0000 + 4 * cause.slot() as u64);
                    if cause.is_interrupt() {
                        assert_eq!(entry_address, slot_address);
                    } else {
                        assert_eq!(entry_address, 0x8000_0000);
                    }
                }
                other => panic!("{}: unexpected {:?}", cause, other),
            }
        }
    }

    #[test]
    fn test_vectored_illegal_instruction_enters_at_base_and_halts() {
        let base = 0x2000_0100;
        let mut hart = Hart::new(
            TrapBase::new(DispatchMode::InlineJump, Xlen::Rv32, base),
            &POLICY,
        );
        let fault = FaultRecord {
            mcause: 2,
            mepc: 0x1000_0040,
            mtval: 0x0000_0000,
        };

        // Slot 0 is shared with UserSoft, which would resume and re-trap forever.
        let outcome = hart.take_trap(fault);
        assert_eq!(
            outcome,
            TrapOutcome::Halted {
                cause: TrapCause::IllegalInstruction,
                entry_address: base,
                slot_address: base + 14 * 4,
                registers: HaltRegisters::from(fault),
            }
        );
        assert_eq!(hart.state(), HartState::Halted(HaltRegisters::from(fault)));

        // Interrupt 0 also enters at base but is a no-op.
        let mut hart = Hart::new(
            TrapBase::new(DispatchMode::InlineJump, Xlen::Rv32, base),
            &POLICY,
        );
        assert_eq!(
            hart.take_trap(FaultRecord {
                mcause: 0x8000_0000,
                mepc: 0x1000_0080,
                mtval: 0,
            }),
            TrapOutcome::Resumed {
                cause: TrapCause::UserSoft,
                entry_address: base,
                slot_address: base,
                resume_pc: 0x1000_0080,
            }
        );
    }

    #[test]
    fn test_mtvec_value() {
        assert_eq!(RV32_TABLE.mtvec(), 0x1000);
        assert_eq!(
            TrapBase::new(DispatchMode::InlineJump, Xlen::Rv32, 0x1000).mtvec(),
            0x1001
        );
    }
}
