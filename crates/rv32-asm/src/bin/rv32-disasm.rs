use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use rv32_asm::read_program;
use rv32_lite::decoder::Decoder;
use rv32_lite::disasm::fmt_decoded;
use rv32_lite::isa::rv32::Rv32Decoder;

#[derive(Parser, Debug)]
#[command(author, version, about = "List an encoded RV32 subset program as assembly")]
struct Opts {
    /// Program file: one 32-digit binary word per line
    #[arg(value_name = "PROGRAM")]
    input: PathBuf,
    /// Show the raw word next to each instruction
    #[arg(long)]
    show_bits: bool,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let prog = read_program(&opts.input)?;
    let dec = Rv32Decoder::new();
    for (i, w) in prog.words().iter().enumerate() {
        let pc = (i as u32) * 4;
        let text = match dec.decode(w.bits()) {
            Some(d) => fmt_decoded(&d),
            None => format!(".word {:#010x}", w.bits()),
        };
        if opts.show_bits {
            println!("{pc:#010x}: {w}  {text}");
        } else {
            println!("{pc:#010x}: {text}");
        }
    }
    Ok(())
}
