//! Static description of the table for a given encoding, width and base.

use std::fmt::Write as _;

use arch_riscv::{CauseKind, TrapCause, POLICY, VECTORED_ENTRY};
use serde::Serialize;

use crate::config::TableSpec;

#[derive(Debug, Clone, Serialize)]
pub struct SlotReport {
    pub slot: usize,
    pub cause: &'static str,
    pub kind: &'static str,
    pub code: usize,
    pub mcause: u64,
    pub offset: u64,
    pub address: u64,
    /// Where the hart lands first; `base` for vectored exceptions.
    pub entry: u64,
    pub handler: &'static str,
    pub reserved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutReport {
    pub mode: &'static str,
    pub xlen: u32,
    pub base: u64,
    pub mtvec: u64,
    pub slot_width: u64,
    pub table_bytes: u64,
    pub slots: Vec<SlotReport>,
}

pub fn kind_name(kind: CauseKind) -> &'static str {
    match kind {
        CauseKind::Interrupt => "interrupt",
        CauseKind::Exception => "exception",
    }
}

impl LayoutReport {
    pub fn new(spec: &TableSpec) -> Self {
        let slots = POLICY
            .iter()
            .map(|(cause, disposition)| SlotReport {
                slot: cause.slot(),
                cause: cause.name(),
                kind: kind_name(cause.kind()),
                code: cause.code(),
                mcause: cause.encode(spec.xlen),
                offset: spec.mode.slot_offset(spec.xlen, cause),
                address: spec.mode.slot_address(spec.xlen, spec.base, cause),
                entry: spec.mode.entry_address(spec.xlen, spec.base, cause),
                handler: disposition.handler_symbol(),
                reserved: cause.is_reserved(),
            })
            .collect();

        Self {
            mode: spec.mode.name(),
            xlen: spec.xlen.bits(),
            base: spec.base,
            mtvec: spec.mode.mtvec(spec.base),
            slot_width: spec.mode.slot_width(spec.xlen),
            table_bytes: spec.mode.table_bytes(spec.xlen),
            slots,
        }
    }

    pub fn slot(&self, cause: TrapCause) -> &SlotReport {
        &self.slots[cause.slot()]
    }

    pub fn render_text(&self) -> String {
        let hex_width = (self.xlen / 4) as usize + 2;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} table, RV{}, base {:#x}, mtvec {:#x}, {} x {} bytes",
            self.mode,
            self.xlen,
            self.base,
            self.mtvec,
            self.slots.len(),
            self.slot_width
        );
        let _ = writeln!(
            out,
            "{:>4}  {:<22} {:>10}  {:>6}  {:<w$}  {}",
            "slot",
            "cause",
            "code",
            "offset",
            "address",
            "handler",
            w = hex_width
        );
        for slot in &self.slots {
            let code = format!("{}:{}", &slot.kind[..3], slot.code);
            let mut handler = if slot.reserved {
                format!("{} (reserved)", slot.handler)
            } else {
                slot.handler.to_string()
            };
            if slot.entry != slot.address {
                handler = format!("via {} -> {}", VECTORED_ENTRY, handler);
            }
            let _ = writeln!(
                out,
                "{:>4}  {:<22} {:>10}  {:>#6x}  {:#0w$x}  {}",
                slot.slot,
                slot.cause,
                code,
                slot.offset,
                slot.address,
                handler,
                w = hex_width
            );
        }
        out
    }
}
