//! Checks the `.vectortable` of a linked image against the cause table.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arch_riscv::{DispatchMode, TrapCause, Xlen, VECTOR_TABLE_ALIGN};
use object::{Architecture, Object, ObjectSection, ObjectSymbol, SectionIndex, SectionKind};
use serde::Serialize;
use tracing::{debug, warn};

pub const VECTOR_SECTION: &str = ".vectortable";

const JAL_OPCODE: u32 = 0x6f;

/// Decodes a `jal` into `(rd, offset)`.
pub fn decode_jal(insn: u32) -> Option<(u32, i64)> {
    if insn & 0x7f != JAL_OPCODE {
        return None;
    }
    let rd = (insn >> 7) & 0x1f;
    let imm = (((insn >> 31) & 0x1) << 20)
        | (((insn >> 12) & 0xff) << 12)
        | (((insn >> 20) & 0x1) << 11)
        | (((insn >> 21) & 0x3ff) << 1);
    // Sign-extend the 21-bit immediate.
    let offset = ((imm << 11) as i32 >> 11) as i64;
    Some((rd, offset))
}

/// Encodes `jal rd, offset`. `offset` must be even and within +-1 MiB.
pub fn encode_jal(rd: u32, offset: i32) -> u32 {
    let imm = offset as u32;
    (((imm >> 20) & 0x1) << 31)
        | (((imm >> 1) & 0x3ff) << 21)
        | (((imm >> 11) & 0x1) << 20)
        | (((imm >> 12) & 0xff) << 12)
        | ((rd & 0x1f) << 7)
        | JAL_OPCODE
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotCheck {
    pub slot: usize,
    pub cause: &'static str,
    pub target: Option<u64>,
    pub symbols: Vec<String>,
    /// Symbol the slot must reach.
    pub expected: &'static str,
    /// `weak` for the crate default, `strong` for an application entry,
    /// `vectored` for the shared slot 0 of a jump table.
    pub binding: Option<&'static str>,
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub mode: &'static str,
    pub xlen: u32,
    pub base: u64,
    pub section_size: u64,
    pub slots: Vec<SlotCheck>,
    pub problems: Vec<String>,
}

impl ImageReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn overrides(&self) -> impl Iterator<Item = &SlotCheck> + '_ {
        self.slots.iter().filter(|s| s.binding == Some("strong"))
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} at {:#x}: {} table, RV{}, {} bytes",
            VECTOR_SECTION, self.base, self.mode, self.xlen, self.section_size
        );
        for slot in &self.slots {
            let target = match slot.target {
                Some(addr) => format!("{:#x}", addr),
                None => "-".to_string(),
            };
            let _ = writeln!(
                out,
                "{:>4}  {:<22} {:>12}  {:<6}  {}",
                slot.slot,
                slot.cause,
                target,
                slot.binding.unwrap_or("?"),
                if slot.ok { "ok" } else { "MISMATCH" }
            );
        }
        if self.is_ok() {
            out.push_str("all slots resolve to their entry symbols\n");
        } else {
            for problem in &self.problems {
                let _ = writeln!(out, "error: {}", problem);
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
struct EntrySymbol {
    name: String,
    weak: bool,
}

pub fn inspect_file(path: &Path, mode: Option<DispatchMode>) -> Result<ImageReport> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    inspect_bytes(&data, mode).with_context(|| format!("failed to inspect {}", path.display()))
}

/// `mode` overrides detection; otherwise an executable `.vectortable` is taken
/// to hold jumps and anything else to hold pointers.
pub fn inspect_bytes(data: &[u8], mode: Option<DispatchMode>) -> Result<ImageReport> {
    let file = object::File::parse(data).context("not an object file")?;
    let xlen = match file.architecture() {
        Architecture::Riscv32 => Xlen::Rv32,
        Architecture::Riscv64 => Xlen::Rv64,
        other => bail!("not a RISC-V image ({:?})", other),
    };
    if !file.is_little_endian() {
        bail!("big-endian RISC-V images are not supported");
    }

    let section = file
        .section_by_name(VECTOR_SECTION)
        .with_context(|| format!("no {} section", VECTOR_SECTION))?;
    let mode = mode.unwrap_or(match section.kind() {
        SectionKind::Text => DispatchMode::InlineJump,
        _ => DispatchMode::PointerTable,
    });
    let base = section.address();
    let bytes = section
        .data()
        .with_context(|| format!("{} has no file contents", VECTOR_SECTION))?;
    debug!(base, size = bytes.len(), mode = mode.name(), "found vector table");

    let table_bytes = mode.table_bytes(xlen);
    if (bytes.len() as u64) < table_bytes {
        bail!(
            "{} holds {} bytes, a {} table needs {}",
            VECTOR_SECTION,
            bytes.len(),
            mode.name(),
            table_bytes
        );
    }

    let mut problems = Vec::new();
    if base % VECTOR_TABLE_ALIGN as u64 != 0 {
        problems.push(format!(
            "base {:#x} is not aligned to {} bytes",
            base, VECTOR_TABLE_ALIGN
        ));
    }

    let entries = entry_symbols(&file, section.index());
    debug!(count = entries.len(), "collected entry symbols");

    let mut slots = Vec::with_capacity(TrapCause::ALL.len());
    for cause in TrapCause::ALL {
        let offset = mode.slot_offset(xlen, cause) as usize;
        let target = match mode {
            DispatchMode::PointerTable => Some(read_pointer(bytes, offset, xlen)),
            DispatchMode::InlineJump => {
                let insn = read_u32(bytes, offset);
                match decode_jal(insn) {
                    Some((0, rel)) => {
                        let slot_addr = base + offset as u64;
                        Some(slot_addr.wrapping_add(rel as u64))
                    }
                    _ => {
                        problems.push(format!(
                            "slot {} ({}) holds {:#010x}, not a `j`",
                            cause.slot(),
                            cause,
                            insn
                        ));
                        None
                    }
                }
            }
        };

        let found = target.and_then(|addr| entries.get(&addr));
        let symbols: Vec<String> = found
            .map(|syms| syms.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default();
        let expected = mode.slot_target(cause);
        let entry = found.and_then(|syms| syms.iter().find(|s| s.name == expected));
        let binding = entry.map(|s| match (expected == cause.name(), s.weak) {
            (false, _) => "vectored",
            (true, true) => "weak",
            (true, false) => "strong",
        });
        let ok = entry.is_some();

        if let (false, Some(addr)) = (ok, target) {
            problems.push(format!(
                "slot {} ({}) targets {:#x} [{}], expected {}",
                cause.slot(),
                cause,
                addr,
                symbols.join(", "),
                expected
            ));
        }

        slots.push(SlotCheck {
            slot: cause.slot(),
            cause: cause.name(),
            target,
            symbols,
            expected,
            binding,
            ok,
        });
    }

    for problem in &problems {
        warn!("{}", problem);
    }

    Ok(ImageReport {
        mode: mode.name(),
        xlen: xlen.bits(),
        base,
        section_size: bytes.len() as u64,
        slots,
        problems,
    })
}

/// Text symbols by address, leaving out labels inside the table itself.
fn entry_symbols<'data>(
    file: &object::File<'data>,
    table: SectionIndex,
) -> BTreeMap<u64, Vec<EntrySymbol>> {
    let mut map: BTreeMap<u64, Vec<EntrySymbol>> = BTreeMap::new();
    for symbol in file.symbols() {
        if !symbol.is_definition() || symbol.section_index() == Some(table) {
            continue;
        }
        let Ok(name) = symbol.name() else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        map.entry(symbol.address()).or_default().push(EntrySymbol {
            name: name.to_string(),
            weak: symbol.is_weak(),
        });
    }
    map
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn read_pointer(bytes: &[u8], offset: usize, xlen: Xlen) -> u64 {
    match xlen {
        Xlen::Rv32 => read_u32(bytes, offset) as u64,
        Xlen::Rv64 => {
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[offset..offset + 8]);
            u64::from_le_bytes(word)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_encodings() {
        // j . / jal x0, 0
        assert_eq!(decode_jal(0x0000_006f), Some((0, 0)));
        // jal ra, 8
        assert_eq!(decode_jal(0x0080_00ef), Some((1, 8)));
        // j -4
        assert_eq!(decode_jal(0xffdf_f06f), Some((0, -4)));
        // addi x0, x0, 0
        assert_eq!(decode_jal(0x0000_0013), None);
    }

    #[test]
    fn test_encode_matches_decode_at_extremes() {
        for offset in [2, -2, 0x800, -0x800, 0x1000, 0xf_fffe, -0x10_0000] {
            assert_eq!(decode_jal(encode_jal(0, offset)), Some((0, offset as i64)));
        }
        assert_eq!(encode_jal(0, 0), 0x0000_006f);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(inspect_bytes(b"not an elf", None).is_err());
    }
}
