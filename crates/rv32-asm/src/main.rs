use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rv32_asm::{read_source, write_assembly, write_labels_json, write_program};
use rv32_lite::{AsmConfig, Assembler, OffsetUnit};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Unit {
    Bytes,
    HalfWords,
}

impl From<Unit> for OffsetUnit {
    fn from(u: Unit) -> Self {
        match u {
            Unit::Bytes => OffsetUnit::Bytes,
            Unit::HalfWords => OffsetUnit::HalfWords,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Tiny RV32 subset assembler", long_about = None)]
struct Cli {
    /// Input assembly file (one instruction per line, `label:` prefixes allowed)
    #[arg(value_name = "SOURCE")]
    input: PathBuf,
    /// Output file, one encoded word or error record per instruction; stdout when omitted
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Unit of literal (non-label) branch and jump offsets
    #[arg(long, value_enum, default_value_t = Unit::Bytes)]
    offset_unit: Unit,
    /// Also write the encoded words alone (error lines dropped) for the simulator
    #[arg(long, value_name = "FILE")]
    program_out: Option<PathBuf>,
    /// Export the label table to JSON (Vec<{ addr, name }>)
    #[arg(long, value_name = "FILE")]
    labels_out: Option<PathBuf>,
    /// Exit with an error status if any line failed
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let text = read_source(&cli.input)?;
    let asm = Assembler::new(AsmConfig { offset_unit: cli.offset_unit.into() }).assemble(&text);

    match &cli.output {
        Some(path) => write_assembly(path, &asm)?,
        None => print!("{}", asm.render()),
    }
    if let Some(path) = &cli.program_out {
        write_program(path, &asm)?;
    }
    if let Some(path) = &cli.labels_out {
        write_labels_json(path, &asm.labels)?;
    }

    let failed = asm.errors().count();
    if cli.strict {
        anyhow::ensure!(failed == 0, "{failed} line(s) failed to assemble");
    }
    Ok(())
}
