//! One trap through the dispatch model.

use arch_riscv::{FaultRecord, Hart, TrapBase, TrapOutcome, POLICY, VECTORED_ENTRY};
use serde::Serialize;

use crate::config::TableSpec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    Resumed {
        cause: &'static str,
        slot: usize,
        entry_address: u64,
        slot_address: u64,
        resume_pc: u64,
    },
    Halted {
        cause: &'static str,
        slot: usize,
        entry_address: u64,
        slot_address: u64,
        t0: u64,
        t1: u64,
        t2: u64,
    },
    Unmapped {
        mcause: u64,
    },
    /// The hart had stopped before this trap.
    AlreadyHalted,
}

/// Runs `fault` on a hart fresh out of reset with the default policy.
pub fn resolve(spec: &TableSpec, fault: FaultRecord) -> Resolution {
    let mut hart = Hart::new(TrapBase::new(spec.mode, spec.xlen, spec.base), &POLICY);
    resolve_on(&mut hart, fault)
}

pub fn resolve_on(hart: &mut Hart<'_>, fault: FaultRecord) -> Resolution {
    match hart.take_trap(fault) {
        TrapOutcome::Resumed {
            cause,
            entry_address,
            slot_address,
            resume_pc,
        } => Resolution::Resumed {
            cause: cause.name(),
            slot: cause.slot(),
            entry_address,
            slot_address,
            resume_pc,
        },
        TrapOutcome::Halted {
            cause,
            entry_address,
            slot_address,
            registers,
        } => Resolution::Halted {
            cause: cause.name(),
            slot: cause.slot(),
            entry_address,
            slot_address,
            t0: registers.t0,
            t1: registers.t1,
            t2: registers.t2,
        },
        TrapOutcome::Unmapped { mcause } => Resolution::Unmapped { mcause },
        TrapOutcome::AlreadyHalted => Resolution::AlreadyHalted,
    }
}

fn route(slot: usize, entry_address: u64, slot_address: u64) -> String {
    if entry_address == slot_address {
        format!("slot {} at {:#x}", slot, slot_address)
    } else {
        format!(
            "entry {:#x} -> {} -> slot {} at {:#x}",
            entry_address, VECTORED_ENTRY, slot, slot_address
        )
    }
}

impl Resolution {
    pub fn render_text(&self) -> String {
        match self {
            Resolution::Resumed {
                cause,
                slot,
                entry_address,
                slot_address,
                resume_pc,
            } => format!(
                "{} -> {} -> __silica_resume, mret to {:#x}",
                cause,
                route(*slot, *entry_address, *slot_address),
                resume_pc
            ),
            Resolution::Halted {
                cause,
                slot,
                entry_address,
                slot_address,
                t0,
                t1,
                t2,
            } => format!(
                "{} -> {} -> __silica_halt, halted with t0={:#x} t1={:#x} t2={:#x}",
                cause,
                route(*slot, *entry_address, *slot_address),
                t0,
                t1,
                t2
            ),
            Resolution::Unmapped { mcause } => {
                format!("mcause {:#x} has no vector table slot", mcause)
            }
            Resolution::AlreadyHalted => "hart already halted, trap not taken".to_string(),
        }
    }
}
