use std::path::PathBuf;

use anyhow::{bail, Result};
use arch_riscv::FaultRecord;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use silica_build::config::ModeArg;
use silica_build::{
    inspect_file, parse_address, resolve, LayoutReport, TableArgs, TableSpec,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Invoked as `cargo silica <command>`.
#[derive(Parser)]
#[command(name = "cargo", bin_name = "cargo")]
enum Cargo {
    Silica(SilicaCli),
}

#[derive(Args)]
#[command(version, about = "Silica vector table tooling")]
struct SilicaCli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the slot table for an encoding, width and base
    Layout(LayoutArgs),
    /// Run one trap through the dispatch model
    Resolve(ResolveArgs),
    /// Check the vector table of a linked image
    Inspect(InspectArgs),
}

#[derive(Args)]
struct LayoutArgs {
    #[command(flatten)]
    table: TableArgs,
}

#[derive(Args)]
struct ResolveArgs {
    #[command(flatten)]
    table: TableArgs,

    /// Raw mcause value
    #[arg(long, value_parser = parse_address)]
    mcause: u64,

    /// Raw mepc value
    #[arg(long, value_parser = parse_address, default_value = "0")]
    mepc: u64,

    /// Raw mtval value
    #[arg(long, value_parser = parse_address, default_value = "0")]
    mtval: u64,
}

#[derive(Args)]
struct InspectArgs {
    /// Linked ELF image
    elf: PathBuf,

    /// Encoding to assume instead of detecting it from the section flags
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

fn run(cli: SilicaCli) -> Result<()> {
    match cli.command {
        Command::Layout(args) => {
            let spec = TableSpec::try_from(&args.table)?;
            let report = LayoutReport::new(&spec);
            emit(cli.json, &report, || report.render_text())
        }
        Command::Resolve(args) => {
            let spec = TableSpec::try_from(&args.table)?;
            let resolution = resolve(
                &spec,
                FaultRecord {
                    mcause: args.mcause,
                    mepc: args.mepc,
                    mtval: args.mtval,
                },
            );
            emit(cli.json, &resolution, || {
                format!("{}\n", resolution.render_text())
            })
        }
        Command::Inspect(args) => {
            info!("inspecting {}", args.elf.display());
            let report = inspect_file(&args.elf, args.mode.map(Into::into))?;
            emit(cli.json, &report, || report.render_text())?;
            if !report.is_ok() {
                bail!(
                    "{} problem(s) in {}",
                    report.problems.len(),
                    args.elf.display()
                );
            }
            Ok(())
        }
    }
}

fn main() {
    let Cargo::Silica(cli) = Cargo::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
