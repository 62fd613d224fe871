use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use rv32_lite::sim::{Machine, Program, Termination};
use rv32_lite::trace::{JsonTrace, TextTrace, TraceSink};
use rv32_lite::CpuConfig;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run an encoded RV32 subset program and write its execution trace"
)]
struct Opts {
    /// Program file: one 32-digit binary word per line
    #[arg(value_name = "PROGRAM")]
    input: PathBuf,
    /// Trace output file (truncated); stdout when omitted
    #[arg(value_name = "TRACE")]
    output: Option<PathBuf>,
    /// Trace format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// JSON file with a CpuConfig; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Initial stack pointer (hex or dec)
    #[arg(long, value_parser = parse_u32)]
    sp: Option<u32>,
    /// Stop after this many steps
    #[arg(long)]
    max_steps: Option<u64>,
    /// First address of the final memory dump (hex or dec)
    #[arg(long, value_parser = parse_u32)]
    dump_base: Option<u32>,
    /// Number of words in the final memory dump
    #[arg(long)]
    dump_words: Option<u32>,
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u32>()?)
    }
}

fn load_config(opts: &Opts) -> Result<CpuConfig> {
    let mut cfg = match &opts.config {
        Some(path) => {
            let txt = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&txt).with_context(|| format!("parsing {}", path.display()))?
        }
        None => CpuConfig::default(),
    };
    if let Some(sp) = opts.sp {
        cfg.initial_sp = sp;
    }
    if opts.max_steps.is_some() {
        cfg.max_steps = opts.max_steps;
    }
    if let Some(base) = opts.dump_base {
        cfg.dump_base = base;
    }
    if let Some(n) = opts.dump_words {
        cfg.dump_words = n;
    }
    Ok(cfg)
}

fn run_with<T: TraceSink>(machine: &mut Machine, sink: &mut T) -> Result<()> {
    let summary = machine.run(sink)?;
    if let Termination::Faulted(trap) = &summary.termination {
        eprintln!("[ERROR] {trap}");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let opts = Opts::parse();
    let cfg = load_config(&opts)?;

    let text = std::fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;
    let program = Program::parse(&text).with_context(|| format!("in {}", opts.input.display()))?;
    let mut machine = Machine::new(program, cfg);

    match (&opts.output, opts.format) {
        (Some(path), OutputFormat::Text) => run_with(&mut machine, &mut TextTrace::create(path)?)?,
        (Some(path), OutputFormat::Json) => {
            let f = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            run_with(&mut machine, &mut JsonTrace::new(BufWriter::new(f)))?
        }
        (None, OutputFormat::Text) => run_with(&mut machine, &mut TextTrace::new(io::stdout().lock()))?,
        (None, OutputFormat::Json) => run_with(&mut machine, &mut JsonTrace::new(io::stdout().lock()))?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_u32_hex_and_dec() {
        assert_eq!(parse_u32("0x10000").unwrap(), 0x10000);
        assert_eq!(parse_u32("380").unwrap(), 380);
        assert!(parse_u32("sp").is_err());
    }
}
