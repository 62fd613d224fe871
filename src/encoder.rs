use crate::asm::LabelTable;
use crate::decoder::Decoded;
use crate::instructions::Format;
use crate::validator::{check_offset, AsmError, Imm, Validated};
use crate::word::EncodedWord;

/// Result of encoding one validated instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    Word(EncodedWord),
    /// Target label not in the table yet; re-encode once the table is complete.
    Unresolved { label: String },
}

/// Packs every field of `d` into its format's bit layout.
///
/// B and J immediates are byte offsets; bit 0 is not stored.
pub fn pack(d: &Decoded) -> EncodedWord {
    let desc = d.op.desc();
    let opcode = desc.opcode & 0x7F;
    let f3 = desc.funct3 & 0x7;
    let f7 = desc.funct7 & 0x7F;
    let rd = (d.rd as u32) & 0x1F;
    let rs1 = (d.rs1 as u32) & 0x1F;
    let rs2 = (d.rs2 as u32) & 0x1F;
    let imm = d.imm as u32;

    let raw = match desc.format {
        Format::R => (f7 << 25) | (rs2 << 20) | (rs1 << 15) | (f3 << 12) | (rd << 7) | opcode,
        Format::I => ((imm & 0xFFF) << 20) | (rs1 << 15) | (f3 << 12) | (rd << 7) | opcode,
        Format::S => {
            let hi7 = (imm >> 5) & 0x7F;
            let lo5 = imm & 0x1F;
            (hi7 << 25) | (rs2 << 20) | (rs1 << 15) | (f3 << 12) | (lo5 << 7) | opcode
        }
        Format::B => {
            let b12 = (imm >> 12) & 0x1;
            let b11 = (imm >> 11) & 0x1;
            let b10_5 = (imm >> 5) & 0x3F;
            let b4_1 = (imm >> 1) & 0xF;
            (b12 << 31)
                | (b10_5 << 25)
                | (rs2 << 20)
                | (rs1 << 15)
                | (f3 << 12)
                | (b4_1 << 8)
                | (b11 << 7)
                | opcode
        }
        Format::J => {
            let b20 = (imm >> 20) & 0x1;
            let b10_1 = (imm >> 1) & 0x3FF;
            let b11 = (imm >> 11) & 0x1;
            let b19_12 = (imm >> 12) & 0xFF;
            (b20 << 31) | (b10_1 << 21) | (b11 << 20) | (b19_12 << 12) | (rd << 7) | opcode
        }
    };
    EncodedWord::new(raw)
}

fn offset_bits(format: Format) -> u32 {
    match format {
        Format::J => 21,
        _ => 13,
    }
}

/// Encodes `v` placed at `address`, resolving a label target against `labels`.
///
/// A label missing from `labels` yields [`Encoding::Unresolved`]; deciding
/// whether that is final is up to the caller.
pub fn encode(v: &Validated, address: u32, labels: &LabelTable) -> Result<Encoding, AsmError> {
    let imm = match &v.imm {
        Imm::Value(imm) => *imm,
        Imm::Label(name) => {
            let Some(target) = labels.get(name) else {
                return Ok(Encoding::Unresolved { label: name.clone() });
            };
            let offset = target as i64 - address as i64;
            check_offset(offset, offset_bits(v.op.format()))?
        }
    };
    let d = Decoded { op: v.op, rd: v.rd, rs1: v.rs1, rs2: v.rs2, imm };
    Ok(Encoding::Word(pack(&d)))
}
