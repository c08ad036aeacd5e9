use anyhow::{bail, Context, Result};
use arch_riscv::{DispatchMode, Xlen, VECTOR_TABLE_ALIGN};
use clap::{Args, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    PointerTable,
    InlineJump,
}

impl From<ModeArg> for DispatchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::PointerTable => DispatchMode::PointerTable,
            ModeArg::InlineJump => DispatchMode::InlineJump,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum XlenArg {
    Rv32,
    Rv64,
}

impl From<XlenArg> for Xlen {
    fn from(xlen: XlenArg) -> Self {
        match xlen {
            XlenArg::Rv32 => Xlen::Rv32,
            XlenArg::Rv64 => Xlen::Rv64,
        }
    }
}

/// Where the table sits and how it is encoded.
#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Vector table encoding
    #[arg(long, env = "SILICA_MODE", value_enum, default_value = "pointer-table")]
    pub mode: ModeArg,

    /// Register width of the target hart
    #[arg(long, env = "SILICA_XLEN", value_enum, default_value = "rv32")]
    pub xlen: XlenArg,

    /// Link address of `.vectortable` (decimal or 0x-prefixed hex)
    #[arg(long, env = "SILICA_VECTOR_BASE", value_parser = parse_address, default_value = "0")]
    pub base: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub mode: DispatchMode,
    pub xlen: Xlen,
    pub base: u64,
}

impl TableSpec {
    /// Fails if `base` could not hold a table: misaligned, or out of range for
    /// `xlen`.
    pub fn new(mode: DispatchMode, xlen: Xlen, base: u64) -> Result<Self> {
        if base % VECTOR_TABLE_ALIGN as u64 != 0 {
            bail!(
                "vector base {:#x} is not aligned to {} bytes",
                base,
                VECTOR_TABLE_ALIGN
            );
        }
        let end = base
            .checked_add(mode.table_bytes(xlen))
            .context("vector table wraps the address space")?;
        if xlen == Xlen::Rv32 && end > 1 << 32 {
            bail!("vector table at {:#x} does not fit an RV32 address space", base);
        }
        Ok(Self { mode, xlen, base })
    }
}

impl TryFrom<&TableArgs> for TableSpec {
    type Error = anyhow::Error;

    fn try_from(args: &TableArgs) -> Result<Self> {
        Self::new(args.mode.into(), args.xlen.into(), args.base)
    }
}

pub fn parse_address(s: &str) -> Result<u64> {
    let s = s.trim().replace('_', "");
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.with_context(|| format!("invalid address `{}`", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x2000_0000").unwrap(), 0x2000_0000);
        assert_eq!(parse_address("256").unwrap(), 256);
        assert_eq!(parse_address(" 0X100 ").unwrap(), 0x100);
        assert!(parse_address("0xzz").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_base_must_be_aligned() {
        assert!(TableSpec::new(DispatchMode::PointerTable, Xlen::Rv32, 0x8000_0100).is_ok());
        let err = TableSpec::new(DispatchMode::PointerTable, Xlen::Rv32, 0x8000_0104).unwrap_err();
        assert!(err.to_string().contains("not aligned"));
    }

    #[test]
    fn test_rv32_range() {
        assert!(TableSpec::new(DispatchMode::InlineJump, Xlen::Rv32, 0xffff_ff00).is_ok());
        assert!(TableSpec::new(DispatchMode::InlineJump, Xlen::Rv32, 0x1_0000_0000).is_err());
        assert!(TableSpec::new(DispatchMode::InlineJump, Xlen::Rv64, 0x1_0000_0000).is_ok());
    }
}
