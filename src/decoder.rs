use serde::{Deserialize, Serialize};

use crate::instructions::{Format, InstrDesc, TABLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    Add,
    Sub,
    Slt,
    Srl,
    Or,
    And,
    Addi,
    Lw,
    Jalr,
    Sw,
    Beq,
    Bne,
    Blt,
    Jal,
}

impl Op {
    pub fn desc(self) -> &'static InstrDesc {
        &TABLE[self as usize]
    }

    pub fn format(self) -> Format {
        self.desc().format
    }

    pub fn mnemonic(self) -> &'static str {
        self.desc().mnemonic
    }
}

/// One instruction with every field unpacked. Fields a format does not carry are 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub op: Op,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm: i32, // sign-extended; byte offset for B/J
}

impl Decoded {
    pub fn r(op: Op, rd: u8, rs1: u8, rs2: u8) -> Self {
        Self { op, rd, rs1, rs2, imm: 0 }
    }

    pub fn i(op: Op, rd: u8, rs1: u8, imm: i32) -> Self {
        Self { op, rd, rs1, rs2: 0, imm }
    }

    pub fn s(op: Op, rs1: u8, rs2: u8, imm: i32) -> Self {
        Self { op, rd: 0, rs1, rs2, imm }
    }

    pub fn b(op: Op, rs1: u8, rs2: u8, offset: i32) -> Self {
        Self { op, rd: 0, rs1, rs2, imm: offset }
    }

    pub fn j(op: Op, rd: u8, offset: i32) -> Self {
        Self { op, rd, rs1: 0, rs2: 0, imm: offset }
    }

    pub fn opcode(&self) -> u32 {
        self.op.desc().opcode
    }

    pub fn funct3(&self) -> u32 {
        self.op.desc().funct3
    }

    pub fn funct7(&self) -> u32 {
        self.op.desc().funct7
    }
}

pub trait Decoder {
    fn decode(&self, raw32: u32) -> Option<Decoded>;
}

/// Two's-complement sign extension of the low `bits` bits of `value`.
#[inline]
pub fn sign_extend(value: u32, bits: u32) -> i32 {
    let s = 32 - bits;
    ((value << s) as i32) >> s
}
