use crate::decoder::{sign_extend, Decoded, Decoder, Op};
use crate::instructions::{
    Format, FUNCT7_SUB, OPCODE_BRANCH, OPCODE_JAL, OPCODE_JALR, OPCODE_LOAD, OPCODE_OP,
    OPCODE_OP_IMM, OPCODE_STORE,
};

/// Decoder for the RV32 subset produced by [`crate::encoder`].
///
/// Field positions mirror the packing in `encoder::pack` exactly; immediates are
/// sign-extended from their native width (12 bits for I/S, 13 for B, 21 for J).
#[derive(Debug, Default, Clone, Copy)]
pub struct Rv32Decoder;

impl Rv32Decoder {
    pub fn new() -> Self {
        Self
    }
}

/// Raw field slices shared by every format.
#[derive(Debug, Clone, Copy)]
struct Fields {
    opcode: u32,
    rd: u8,
    funct3: u32,
    rs1: u8,
    rs2: u8,
    funct7: u32,
}

impl Fields {
    fn split(raw: u32) -> Self {
        Self {
            opcode: raw & 0x7F,
            rd: ((raw >> 7) & 0x1F) as u8,
            funct3: (raw >> 12) & 0x7,
            rs1: ((raw >> 15) & 0x1F) as u8,
            rs2: ((raw >> 20) & 0x1F) as u8,
            funct7: raw >> 25,
        }
    }
}

pub fn format_of(opcode: u32) -> Option<Format> {
    match opcode {
        OPCODE_OP => Some(Format::R),
        OPCODE_OP_IMM | OPCODE_LOAD | OPCODE_JALR => Some(Format::I),
        OPCODE_STORE => Some(Format::S),
        OPCODE_BRANCH => Some(Format::B),
        OPCODE_JAL => Some(Format::J),
        _ => None,
    }
}

fn imm_i(raw: u32) -> i32 {
    sign_extend(raw >> 20, 12)
}

fn imm_s(raw: u32) -> i32 {
    let hi7 = raw >> 25;
    let lo5 = (raw >> 7) & 0x1F;
    sign_extend((hi7 << 5) | lo5, 12)
}

fn imm_b(raw: u32) -> i32 {
    let b12 = (raw >> 31) & 0x1;
    let b11 = (raw >> 7) & 0x1;
    let b10_5 = (raw >> 25) & 0x3F;
    let b4_1 = (raw >> 8) & 0xF;
    sign_extend((b12 << 12) | (b11 << 11) | (b10_5 << 5) | (b4_1 << 1), 13)
}

fn imm_j(raw: u32) -> i32 {
    let b20 = (raw >> 31) & 0x1;
    let b10_1 = (raw >> 21) & 0x3FF;
    let b11 = (raw >> 20) & 0x1;
    let b19_12 = (raw >> 12) & 0xFF;
    sign_extend((b20 << 20) | (b19_12 << 12) | (b11 << 11) | (b10_1 << 1), 21)
}

impl Decoder for Rv32Decoder {
    fn decode(&self, raw32: u32) -> Option<Decoded> {
        let f = Fields::split(raw32);
        match format_of(f.opcode)? {
            Format::R => {
                let op = match (f.funct3, f.funct7) {
                    (0b000, 0) => Op::Add,
                    (0b000, FUNCT7_SUB) => Op::Sub,
                    (0b010, 0) => Op::Slt,
                    (0b101, 0) => Op::Srl,
                    (0b110, 0) => Op::Or,
                    (0b111, 0) => Op::And,
                    _ => return None,
                };
                Some(Decoded::r(op, f.rd, f.rs1, f.rs2))
            }
            Format::I => {
                let op = match (f.opcode, f.funct3) {
                    (OPCODE_OP_IMM, 0b000) => Op::Addi,
                    (OPCODE_LOAD, 0b010) => Op::Lw,
                    (OPCODE_JALR, 0b000) => Op::Jalr,
                    _ => return None,
                };
                Some(Decoded::i(op, f.rd, f.rs1, imm_i(raw32)))
            }
            Format::S => {
                if f.funct3 != 0b010 {
                    return None;
                }
                Some(Decoded::s(Op::Sw, f.rs1, f.rs2, imm_s(raw32)))
            }
            Format::B => {
                let op = match f.funct3 {
                    0b000 => Op::Beq,
                    0b001 => Op::Bne,
                    0b100 => Op::Blt,
                    _ => return None,
                };
                Some(Decoded::b(op, f.rs1, f.rs2, imm_b(raw32)))
            }
            Format::J => Some(Decoded::j(Op::Jal, f.rd, imm_j(raw32))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_words() {
        let dec = Rv32Decoder::new();
        // addi a0, zero, 5
        assert_eq!(dec.decode(0x0050_0513), Some(Decoded::i(Op::Addi, 10, 0, 5)));
        // sub a0, a1, a2
        assert_eq!(dec.decode(0x40C5_8533), Some(Decoded::r(Op::Sub, 10, 11, 12)));
        // jal ra, +8
        assert_eq!(dec.decode(0x0080_00EF), Some(Decoded::j(Op::Jal, 1, 8)));
        // beq zero, zero, 0
        assert_eq!(dec.decode(0x0000_0063), Some(Decoded::b(Op::Beq, 0, 0, 0)));
    }

    #[test]
    fn unknown_opcode_and_funct_are_rejected() {
        let dec = Rv32Decoder::new();
        assert!(dec.decode(0x0000_0000).is_none());
        assert!(dec.decode(0x0000_0037).is_none()); // lui is not in the subset
        assert!(dec.decode(0x0000_5063).is_none()); // bge funct3
        assert!(dec.decode(0x4000_7033).is_none()); // and with funct7 set
    }
}
