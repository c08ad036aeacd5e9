use std::io::Write;

use arch_riscv::{DispatchMode, TrapCause, Xlen, VECTORED_ENTRY};
use object::write::{Object, Symbol, SymbolSection};
use object::{
    Architecture, BinaryFormat, Endianness, SectionKind, SymbolFlags, SymbolKind, SymbolScope,
};
use silica_build::inspect::{encode_jal, inspect_bytes, inspect_file};

/// Entry stubs start this far into `.text`, so they never alias table slots.
const TEXT_OFFSET: u64 = 0x400;

/// Shared slot 0 routine, placed after the per-cause stubs.
const VECTORED_ADDRESS: u64 = TEXT_OFFSET + 4 * 28;

struct Image {
    xlen: Xlen,
    mode: DispatchMode,
    /// Causes given a strong entry symbol instead of the weak default.
    strong: Vec<TrapCause>,
    /// Slot whose contents are replaced with a target nobody defines.
    corrupt: Option<TrapCause>,
    /// Jump slot 0 straight to `UserSoft` instead of the vectored entry.
    direct_slot0: bool,
}

impl Image {
    fn new(xlen: Xlen, mode: DispatchMode) -> Self {
        Self {
            xlen,
            mode,
            strong: Vec::new(),
            corrupt: None,
            direct_slot0: false,
        }
    }

    fn entry_address(cause: TrapCause) -> u64 {
        TEXT_OFFSET + 4 * cause.slot() as u64
    }

    fn build(&self) -> Vec<u8> {
        let arch = match self.xlen {
            Xlen::Rv32 => Architecture::Riscv32,
            Xlen::Rv64 => Architecture::Riscv64,
        };
        let mut obj = Object::new(BinaryFormat::Elf, arch, Endianness::Little);

        let text = obj.add_section(Vec::new(), b".text".to_vec(), SectionKind::Text);
        let mut stubs = vec![0u8; TEXT_OFFSET as usize];
        for _ in 0..=TrapCause::ALL.len() {
            // j .
            stubs.extend_from_slice(&encode_jal(0, 0).to_le_bytes());
        }
        obj.append_section_data(text, &stubs, 4);

        obj.add_symbol(Symbol {
            name: VECTORED_ENTRY.as_bytes().to_vec(),
            value: VECTORED_ADDRESS,
            size: 4,
            kind: SymbolKind::Text,
            scope: SymbolScope::Linkage,
            weak: false,
            section: SymbolSection::Section(text),
            flags: SymbolFlags::None,
        });

        for cause in TrapCause::ALL {
            obj.add_symbol(Symbol {
                name: cause.name().as_bytes().to_vec(),
                value: Self::entry_address(cause),
                size: 4,
                kind: SymbolKind::Text,
                scope: SymbolScope::Linkage,
                weak: !self.strong.contains(&cause),
                section: SymbolSection::Section(text),
                flags: SymbolFlags::None,
            });
        }

        let (kind, table) = match self.mode {
            DispatchMode::PointerTable => (SectionKind::ReadOnlyData, self.pointer_slots()),
            DispatchMode::InlineJump => (SectionKind::Text, self.jump_slots()),
        };
        let section = obj.add_section(Vec::new(), b".vectortable".to_vec(), kind);
        obj.append_section_data(section, &table, 256);
        obj.add_symbol(Symbol {
            name: b"__silica_vectors".to_vec(),
            value: 0,
            size: table.len() as u64,
            kind: SymbolKind::Data,
            scope: SymbolScope::Linkage,
            weak: false,
            section: SymbolSection::Section(section),
            flags: SymbolFlags::None,
        });

        obj.write().unwrap()
    }

    fn target(&self, cause: TrapCause) -> u64 {
        if self.corrupt == Some(cause) {
            0x3ff0
        } else {
            Self::entry_address(cause)
        }
    }

    fn pointer_slots(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for cause in TrapCause::ALL {
            let target = self.target(cause);
            match self.xlen {
                Xlen::Rv32 => out.extend_from_slice(&(target as u32).to_le_bytes()),
                Xlen::Rv64 => out.extend_from_slice(&target.to_le_bytes()),
            }
        }
        out
    }

    fn jump_slots(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for cause in TrapCause::ALL {
            let slot_addr = 4 * cause.slot() as u64;
            let target = if cause == TrapCause::UserSoft && !self.direct_slot0 {
                VECTORED_ADDRESS
            } else {
                self.target(cause)
            };
            let offset = (target - slot_addr) as i32;
            out.extend_from_slice(&encode_jal(0, offset).to_le_bytes());
        }
        out
    }
}

#[test]
fn test_pointer_table_rv32() {
    let bytes = Image::new(Xlen::Rv32, DispatchMode::PointerTable).build();
    let report = inspect_bytes(&bytes, None).unwrap();

    assert!(report.is_ok(), "{:?}", report.problems);
    assert_eq!(report.mode, "pointer-table");
    assert_eq!(report.xlen, 32);
    assert_eq!(report.slots.len(), 28);
    let illegal = &report.slots[TrapCause::IllegalInstruction.slot()];
    assert_eq!(illegal.cause, "IllegalInstruction");
    assert_eq!(illegal.target, Some(TEXT_OFFSET + 14 * 4));
    assert_eq!(illegal.binding, Some("weak"));
    assert_eq!(report.overrides().count(), 0);
}

#[test]
fn test_inline_jump_rv64_detected_from_section_kind() {
    let bytes = Image::new(Xlen::Rv64, DispatchMode::InlineJump).build();
    let report = inspect_bytes(&bytes, None).unwrap();

    assert!(report.is_ok(), "{:?}", report.problems);
    assert_eq!(report.mode, "inline-jump");
    assert_eq!(report.xlen, 64);
    let last = &report.slots[27];
    assert_eq!(last.cause, "StorePageFault");
    assert_eq!(last.target, Some(TEXT_OFFSET + 27 * 4));

    let first = &report.slots[0];
    assert_eq!(first.target, Some(VECTORED_ADDRESS));
    assert_eq!(first.expected, VECTORED_ENTRY);
    assert_eq!(first.binding, Some("vectored"));
    assert_eq!(report.overrides().count(), 0);
}

#[test]
fn test_inline_slot0_bypassing_vectored_entry_fails() {
    // Every exception enters at slot 0 on a vectored hart; a direct jump to
    // UserSoft would resume faults in place.
    let mut image = Image::new(Xlen::Rv32, DispatchMode::InlineJump);
    image.direct_slot0 = true;
    let report = inspect_bytes(&image.build(), None).unwrap();

    assert!(!report.is_ok());
    assert_eq!(report.problems.len(), 1);
    assert!(report.problems[0].contains(VECTORED_ENTRY));
    assert!(!report.slots[0].ok);
    assert!(report.slots[TrapCause::IllegalInstruction.slot()].ok);
}

#[test]
fn test_pointer_table_slot0_is_user_soft() {
    let bytes = Image::new(Xlen::Rv32, DispatchMode::PointerTable).build();
    let report = inspect_bytes(&bytes, None).unwrap();
    assert_eq!(report.slots[0].expected, "UserSoft");
    assert_eq!(report.slots[0].binding, Some("weak"));
}

#[test]
fn test_strong_override_is_reported() {
    let mut image = Image::new(Xlen::Rv32, DispatchMode::PointerTable);
    image.strong.push(TrapCause::MachineSoft);
    let report = inspect_bytes(&image.build(), None).unwrap();

    assert!(report.is_ok());
    let overrides: Vec<&str> = report.overrides().map(|s| s.cause).collect();
    assert_eq!(overrides, ["MachineSoft"]);
}

#[test]
fn test_misrouted_slot_fails() {
    let mut image = Image::new(Xlen::Rv32, DispatchMode::InlineJump);
    image.corrupt = Some(TrapCause::LoadFault);
    let report = inspect_bytes(&image.build(), None).unwrap();

    assert!(!report.is_ok());
    assert_eq!(report.problems.len(), 1);
    assert!(report.problems[0].contains("LoadFault"));
    assert!(!report.slots[TrapCause::LoadFault.slot()].ok);
    assert!(report.slots[TrapCause::LoadMisaligned.slot()].ok);
}

#[test]
fn test_forced_mode_mismatch() {
    // Jumps read as pointers land nowhere.
    let bytes = Image::new(Xlen::Rv32, DispatchMode::InlineJump).build();
    let report = inspect_bytes(&bytes, Some(DispatchMode::PointerTable)).unwrap();
    assert_eq!(report.mode, "pointer-table");
    assert_eq!(report.problems.len(), 28);
}

#[test]
fn test_missing_table() {
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::Riscv32, Endianness::Little);
    let text = obj.add_section(Vec::new(), b".text".to_vec(), SectionKind::Text);
    obj.append_section_data(text, &encode_jal(0, 0).to_le_bytes(), 4);
    let err = inspect_bytes(&obj.write().unwrap(), None).unwrap_err();
    assert!(format!("{:#}", err).contains(".vectortable"));
}

#[test]
fn test_inspect_file_on_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&Image::new(Xlen::Rv64, DispatchMode::PointerTable).build())
        .unwrap();
    let report = inspect_file(file.path(), None).unwrap();
    assert!(report.is_ok(), "{:?}", report.problems);
    assert!(report
        .render_text()
        .ends_with("all slots resolve to their entry symbols\n"));
}
