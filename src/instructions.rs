use serde::{Deserialize, Serialize};

use crate::decoder::Op;

/// Field layout of an encoded word; also fixes the operand arity in source form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    R,
    I,
    S,
    B,
    J,
}

pub const OPCODE_OP: u32 = 0b011_0011;
pub const OPCODE_OP_IMM: u32 = 0b001_0011;
pub const OPCODE_LOAD: u32 = 0b000_0011;
pub const OPCODE_JALR: u32 = 0b110_0111;
pub const OPCODE_STORE: u32 = 0b010_0011;
pub const OPCODE_BRANCH: u32 = 0b110_0011;
pub const OPCODE_JAL: u32 = 0b110_1111;

pub const FUNCT7_SUB: u32 = 0b010_0000;

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Op,
    pub mnemonic: &'static str,
    pub format: Format,
    pub opcode: u32,
    pub funct3: u32,
    pub funct7: u32,
}

const fn desc(
    op: Op,
    mnemonic: &'static str,
    format: Format,
    opcode: u32,
    funct3: u32,
    funct7: u32,
) -> InstrDesc {
    InstrDesc { op, mnemonic, format, opcode, funct3, funct7 }
}

// Indexed by `Op as usize`; keep the order in sync with the `Op` declaration.
pub const TABLE: &[InstrDesc] = &[
    desc(Op::Add, "add", Format::R, OPCODE_OP, 0b000, 0),
    desc(Op::Sub, "sub", Format::R, OPCODE_OP, 0b000, FUNCT7_SUB),
    desc(Op::Slt, "slt", Format::R, OPCODE_OP, 0b010, 0),
    desc(Op::Srl, "srl", Format::R, OPCODE_OP, 0b101, 0),
    desc(Op::Or, "or", Format::R, OPCODE_OP, 0b110, 0),
    desc(Op::And, "and", Format::R, OPCODE_OP, 0b111, 0),
    desc(Op::Addi, "addi", Format::I, OPCODE_OP_IMM, 0b000, 0),
    desc(Op::Lw, "lw", Format::I, OPCODE_LOAD, 0b010, 0),
    desc(Op::Jalr, "jalr", Format::I, OPCODE_JALR, 0b000, 0),
    desc(Op::Sw, "sw", Format::S, OPCODE_STORE, 0b010, 0),
    desc(Op::Beq, "beq", Format::B, OPCODE_BRANCH, 0b000, 0),
    desc(Op::Bne, "bne", Format::B, OPCODE_BRANCH, 0b001, 0),
    desc(Op::Blt, "blt", Format::B, OPCODE_BRANCH, 0b100, 0),
    desc(Op::Jal, "jal", Format::J, OPCODE_JAL, 0b000, 0),
];

/// Case-insensitive mnemonic lookup.
pub fn lookup(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE
        .iter()
        .find(|d| d.mnemonic.eq_ignore_ascii_case(mnemonic))
}

/// ABI register names, indexed by register number.
pub const REGISTER_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", //
    "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5", //
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", //
    "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6",
];

/// Register name to 5-bit index. Accepts ABI names, `fp` and `x0`..`x31`.
pub fn register(name: &str) -> Option<u8> {
    if name == "fp" {
        return Some(8);
    }
    if let Some(idx) = REGISTER_NAMES.iter().position(|&r| r == name) {
        return Some(idx as u8);
    }
    let num = name.strip_prefix('x')?;
    // reject "x01" style spellings so each register has one numeric name
    if num.len() > 1 && num.starts_with('0') {
        return None;
    }
    num.parse::<u8>().ok().filter(|&n| n < 32)
}

pub fn register_name(idx: u8) -> &'static str {
    REGISTER_NAMES[(idx & 0x1F) as usize]
}
