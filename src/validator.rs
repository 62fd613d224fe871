//! Operand checking ahead of encoding.
//!
//! [`validate`] takes a mnemonic and its operand tokens and either rejects the
//! line with an [`AsmError`] or returns the operands already resolved to
//! register indices and integers, so the encoder never re-parses text.

use serde::{Deserialize, Serialize};

use crate::decoder::Op;
use crate::instructions::{self, Format, InstrDesc};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("Unrecognized instruction: {0}")]
    UnknownInstruction(String),
    #[error("Incorrect number of arguments for {mnemonic}, expected {expected}, found {found}")]
    ArgumentCountMismatch {
        mnemonic: String,
        expected: usize,
        found: usize,
    },
    #[error("Invalid register '{register}' in {mnemonic} instruction")]
    UnknownRegister { mnemonic: String, register: String },
    #[error("Immediate value {value} out of range for {bits}-bit field: [{min}, {max}]")]
    ImmediateOutOfRange {
        value: i64,
        bits: u32,
        min: i64,
        max: i64,
    },
    #[error("Invalid immediate value '{0}'")]
    InvalidImmediate(String),
    #[error("Malformed memory operand '{0}', expected offset(register)")]
    MalformedMemoryOperand(String),
    #[error("Offset {0} is not a multiple of 2")]
    MisalignedOffset(i64),
    #[error("Undefined label: {0}")]
    UnresolvedLabel(String),
    #[error("Invalid label name '{0}'")]
    InvalidLabel(String),
    #[error("Duplicate label '{0}'")]
    DuplicateLabel(String),
}

/// How a literal (non-label) branch/jump offset is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffsetUnit {
    /// The literal is the byte offset.
    #[default]
    Bytes,
    /// The literal counts 2-byte units and is doubled before use.
    HalfWords,
}

impl OffsetUnit {
    /// `None` when the scaled value does not fit an `i64`.
    fn scale(self, literal: i64) -> Option<i64> {
        match self {
            OffsetUnit::Bytes => Some(literal),
            OffsetUnit::HalfWords => literal.checked_mul(2),
        }
    }
}

/// Immediate operand: either known now or a label resolved by the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Imm {
    Value(i32),
    Label(String),
}

/// Operands after validation, in field terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub op: Op,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm: Imm,
}

/// Token count including the mnemonic.
pub fn expected_tokens(desc: &InstrDesc) -> usize {
    match (desc.format, desc.op) {
        (Format::R, _) => 4,
        (Format::I, Op::Lw) => 3,
        (Format::I, _) => 4,
        (Format::S, _) => 3,
        (Format::B, _) => 4,
        (Format::J, _) => 3,
    }
}

/// Signed range of a `bits`-wide two's-complement field.
pub fn field_range(bits: u32) -> (i64, i64) {
    (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
}

pub fn check_range(value: i64, bits: u32) -> Result<i32, AsmError> {
    let (min, max) = field_range(bits);
    if value < min || value > max {
        return Err(AsmError::ImmediateOutOfRange { value, bits, min, max });
    }
    Ok(value as i32)
}

/// Checks a branch/jump byte offset for the B (13-bit) or J (21-bit) field.
pub fn check_offset(offset: i64, bits: u32) -> Result<i32, AsmError> {
    let v = check_range(offset, bits)?;
    if offset % 2 != 0 {
        return Err(AsmError::MisalignedOffset(offset));
    }
    Ok(v)
}

/// Parses a signed decimal or `0x` hexadecimal integer.
pub fn parse_int(tok: &str) -> Option<i64> {
    let t = tok.trim();
    let (neg, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    if body.is_empty() || body.starts_with(['+', '-']) {
        return None;
    }
    let mag = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        // from_str_radix would take a sign after the prefix
        if hex.starts_with(['+', '-']) {
            return None;
        }
        i64::from_str_radix(hex, 16).ok()?
    } else {
        body.parse::<i64>().ok()?
    };
    Some(if neg { -mag } else { mag })
}

pub fn is_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '.' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Splits `imm(reg)` into its offset and base-register text.
fn split_mem(tok: &str) -> Result<(&str, &str), AsmError> {
    let malformed = || AsmError::MalformedMemoryOperand(tok.to_string());
    let (off, rest) = tok.split_once('(').ok_or_else(malformed)?;
    let base = rest.strip_suffix(')').ok_or_else(malformed)?;
    if base.contains(['(', ')']) {
        return Err(malformed());
    }
    Ok((off.trim(), base.trim()))
}

struct Ctx<'a> {
    mnemonic: &'a str,
}

impl Ctx<'_> {
    fn reg(&self, tok: &str) -> Result<u8, AsmError> {
        instructions::register(tok).ok_or_else(|| AsmError::UnknownRegister {
            mnemonic: self.mnemonic.to_string(),
            register: tok.to_string(),
        })
    }

    fn imm12(&self, tok: &str) -> Result<i32, AsmError> {
        let v = parse_int(tok).ok_or_else(|| AsmError::InvalidImmediate(tok.to_string()))?;
        check_range(v, 12)
    }

    fn mem(&self, tok: &str) -> Result<(i32, u8), AsmError> {
        let (off, base) = split_mem(tok)?;
        let base = self.reg(base)?;
        let off = if off.is_empty() { 0 } else { self.imm12(off)? };
        Ok((off, base))
    }

    /// Literal offsets are range-checked now; label targets are deferred.
    fn target(&self, tok: &str, bits: u32, unit: OffsetUnit) -> Result<Imm, AsmError> {
        if let Some(v) = parse_int(tok) {
            let Some(offset) = unit.scale(v) else {
                let (min, max) = field_range(bits);
                return Err(AsmError::ImmediateOutOfRange { value: v, bits, min, max });
            };
            return check_offset(offset, bits).map(Imm::Value);
        }
        if is_label_name(tok) {
            Ok(Imm::Label(tok.to_string()))
        } else {
            Err(AsmError::InvalidImmediate(tok.to_string()))
        }
    }
}

/// Validates one instruction. `tokens[0]` is the mnemonic.
pub fn validate(tokens: &[&str], unit: OffsetUnit) -> Result<Validated, AsmError> {
    let mnemonic = tokens.first().copied().unwrap_or_default();
    let desc = instructions::lookup(mnemonic)
        .ok_or_else(|| AsmError::UnknownInstruction(mnemonic.to_string()))?;

    let expected = expected_tokens(desc);
    if tokens.len() != expected {
        return Err(AsmError::ArgumentCountMismatch {
            mnemonic: desc.mnemonic.to_string(),
            expected,
            found: tokens.len(),
        });
    }

    let cx = Ctx { mnemonic: desc.mnemonic };
    let op = desc.op;
    let v = match desc.format {
        Format::R => Validated {
            op,
            rd: cx.reg(tokens[1])?,
            rs1: cx.reg(tokens[2])?,
            rs2: cx.reg(tokens[3])?,
            imm: Imm::Value(0),
        },
        Format::I if op == Op::Lw => {
            let rd = cx.reg(tokens[1])?;
            let (off, base) = cx.mem(tokens[2])?;
            Validated { op, rd, rs1: base, rs2: 0, imm: Imm::Value(off) }
        }
        Format::I => {
            let rd = cx.reg(tokens[1])?;
            let rs1 = cx.reg(tokens[2])?;
            Validated { op, rd, rs1, rs2: 0, imm: Imm::Value(cx.imm12(tokens[3])?) }
        }
        Format::S => {
            let rs2 = cx.reg(tokens[1])?;
            let (off, base) = cx.mem(tokens[2])?;
            Validated { op, rd: 0, rs1: base, rs2, imm: Imm::Value(off) }
        }
        Format::B => {
            let rs1 = cx.reg(tokens[1])?;
            let rs2 = cx.reg(tokens[2])?;
            Validated { op, rd: 0, rs1, rs2, imm: cx.target(tokens[3], 13, unit)? }
        }
        Format::J => {
            let rd = cx.reg(tokens[1])?;
            Validated { op, rd, rs1: 0, rs2: 0, imm: cx.target(tokens[2], 21, unit)? }
        }
    };
    Ok(v)
}
