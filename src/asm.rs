//! Two-pass assembler driver.
//!
//! The forward scan assigns each instruction a byte address (4 per line,
//! starting at 0), records labels, validates, and encodes everything whose
//! target is already known. Forward label references stay `Pending` until
//! [`Assembler::resolve`] re-encodes them against the completed table. Since
//! every instruction is 4 bytes, addresses never move between passes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::encoder::{encode, Encoding};
use crate::validator::{is_label_name, validate, AsmError, OffsetUnit, Validated};
use crate::word::EncodedWord;

pub const COMMENT_MARKER: char = '#';

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTable {
    labels: BTreeMap<String, u32>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.labels.get(name).copied()
    }

    /// Records `name`; a redefinition is rejected and the first address kept.
    pub fn define(&mut self, name: &str, addr: u32) -> Result<(), AsmError> {
        if !is_label_name(name) {
            return Err(AsmError::InvalidLabel(name.to_string()));
        }
        if self.labels.contains_key(name) {
            return Err(AsmError::DuplicateLabel(name.to_string()));
        }
        self.labels.insert(name.to_string(), addr);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AsmConfig {
    pub offset_unit: OffsetUnit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(EncodedWord),
    Pending(String),
}

#[derive(Debug, Clone)]
pub struct AssemblyInstruction {
    pub mnemonic: String,
    pub operands: Vec<String>,
    pub source: String,
    pub address: u32,
    pub state: Resolution,
    pub validated: Validated,
}

/// One entry of the forward scan, in program order.
#[derive(Debug, Clone)]
pub enum Item {
    Instr(AssemblyInstruction),
    /// `address` is `None` for a failing label-only line.
    Error {
        address: Option<u32>,
        source: String,
        error: AsmError,
    },
}

#[derive(Debug, Clone)]
pub struct Scan {
    pub items: Vec<Item>,
    pub labels: LabelTable,
}

impl Scan {
    pub fn pending(&self) -> impl Iterator<Item = &AssemblyInstruction> {
        self.items.iter().filter_map(|it| match it {
            Item::Instr(ins) if matches!(ins.state, Resolution::Pending(_)) => Some(ins),
            _ => None,
        })
    }
}

/// One output line: an encoded word or an inline error record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmLine {
    Word {
        address: u32,
        source: String,
        word: EncodedWord,
    },
    Error {
        address: Option<u32>,
        source: String,
        error: AsmError,
    },
}

impl fmt::Display for AsmLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmLine::Word { word, .. } => write!(f, "{word}"),
            AsmLine::Error { source, error, .. } => {
                write!(f, "Error processing line: {source} -> {error}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub lines: Vec<AsmLine>,
    pub labels: LabelTable,
}

impl Assembly {
    /// Encoded words only, error records skipped; this is simulator input.
    pub fn words(&self) -> Vec<EncodedWord> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                AsmLine::Word { word, .. } => Some(*word),
                AsmLine::Error { .. } => None,
            })
            .collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &AsmError)> {
        self.lines.iter().filter_map(|l| match l {
            AsmLine::Error { source, error, .. } => Some((source.as_str(), error)),
            AsmLine::Word { .. } => None,
        })
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Full assembler output, one line per entry.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for l in &self.lines {
            out.push_str(&l.to_string());
            out.push('\n');
        }
        out
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT_MARKER) {
        Some(p) => &line[..p],
        None => line,
    }
}

/// Splits on commas and whitespace.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Assembler {
    cfg: AsmConfig,
}

impl Assembler {
    pub fn new(cfg: AsmConfig) -> Self {
        Self { cfg }
    }

    /// Forward scan: addresses, labels, validation and first encoding attempt.
    pub fn scan(&self, source: &str) -> Scan {
        let mut labels = LabelTable::new();
        let mut items = Vec::new();
        let mut address = 0u32;

        for line in source.lines() {
            let text = strip_comment(line).trim();
            if text.is_empty() {
                continue;
            }
            let (label, body) = match text.split_once(':') {
                Some((l, rest)) => (Some(l.trim()), rest.trim()),
                None => (None, text),
            };

            if let Some(name) = label {
                if let Err(error) = labels.define(name, address) {
                    warn!(line = text, %error, "label rejected");
                    let has_instr = !body.is_empty();
                    items.push(Item::Error {
                        address: has_instr.then_some(address),
                        source: text.to_string(),
                        error,
                    });
                    if has_instr {
                        address = address.wrapping_add(4);
                    }
                    continue;
                }
                debug!(label = name, addr = address, "label defined");
            }

            if body.is_empty() {
                continue;
            }
            items.push(self.scan_instruction(body, address, &labels));
            address = address.wrapping_add(4);
        }

        Scan { items, labels }
    }

    fn scan_instruction(&self, body: &str, address: u32, labels: &LabelTable) -> Item {
        let tokens = tokenize(body);
        let attempt = validate(&tokens, self.cfg.offset_unit)
            .and_then(|v| encode(&v, address, labels).map(|enc| (v, enc)));
        match attempt {
            Ok((validated, enc)) => {
                let state = match enc {
                    Encoding::Word(w) => Resolution::Resolved(w),
                    Encoding::Unresolved { label } => {
                        debug!(addr = address, label = %label, "deferred forward reference");
                        Resolution::Pending(label)
                    }
                };
                Item::Instr(AssemblyInstruction {
                    mnemonic: tokens[0].to_ascii_lowercase(),
                    operands: tokens[1..].iter().map(|t| t.to_string()).collect(),
                    source: body.to_string(),
                    address,
                    state,
                    validated,
                })
            }
            Err(error) => {
                warn!(addr = address, line = body, %error, "instruction rejected");
                Item::Error { address: Some(address), source: body.to_string(), error }
            }
        }
    }

    /// Deferred pass: re-encodes pending instructions against the final table.
    pub fn resolve(&self, scan: Scan) -> Assembly {
        let labels = scan.labels;
        let lines = scan
            .items
            .into_iter()
            .map(|item| match item {
                Item::Error { address, source, error } => AsmLine::Error { address, source, error },
                Item::Instr(ins) => finish(ins, &labels),
            })
            .collect();
        Assembly { lines, labels }
    }

    pub fn assemble(&self, source: &str) -> Assembly {
        self.resolve(self.scan(source))
    }
}

fn finish(ins: AssemblyInstruction, labels: &LabelTable) -> AsmLine {
    let AssemblyInstruction { source, address, state, validated, .. } = ins;
    let result = match state {
        Resolution::Resolved(word) => Ok(word),
        Resolution::Pending(_) => match encode(&validated, address, labels) {
            Ok(Encoding::Word(word)) => Ok(word),
            Ok(Encoding::Unresolved { label }) => Err(AsmError::UnresolvedLabel(label)),
            Err(e) => Err(e),
        },
    };
    match result {
        Ok(word) => AsmLine::Word { address, source, word },
        Err(error) => {
            warn!(addr = address, line = %source, %error, "unresolved instruction");
            AsmLine::Error { address: Some(address), source, error }
        }
    }
}

/// Assembles with the default configuration.
pub fn assemble(source: &str) -> Assembly {
    Assembler::default().assemble(source)
}
