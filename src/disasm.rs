use crate::decoder::{Decoded, Op};
use crate::instructions::{register_name as reg, Format};

/// Renders `d` in the assembler's own syntax; B/J offsets as signed byte counts.
pub fn fmt_decoded(d: &Decoded) -> String {
    let mn = d.op.mnemonic();
    match d.op.format() {
        Format::R => format!("{mn} {}, {}, {}", reg(d.rd), reg(d.rs1), reg(d.rs2)),
        Format::I if d.op == Op::Lw => mem(mn, reg(d.rd), d),
        Format::I => format!("{mn} {}, {}, {}", reg(d.rd), reg(d.rs1), d.imm),
        Format::S => mem(mn, reg(d.rs2), d),
        Format::B => format!("{mn} {}, {}, {:+}", reg(d.rs1), reg(d.rs2), d.imm),
        Format::J => format!("{mn} {}, {:+}", reg(d.rd), d.imm),
    }
}

fn mem(mn: &str, r: &str, d: &Decoded) -> String {
    format!("{mn} {r}, {}({})", d.imm, reg(d.rs1))
}
