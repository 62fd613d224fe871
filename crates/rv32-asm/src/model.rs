use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use rv32_lite::{Assembly, LabelTable, Program};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelKV {
    pub addr: u32,
    pub name: String,
}

pub fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn read_program(path: &Path) -> Result<Program> {
    let text = read_source(path)?;
    Program::parse(&text).with_context(|| format!("in {}", path.display()))
}

/// Full assembler output, error records included.
pub fn write_assembly(path: &Path, asm: &Assembly) -> Result<()> {
    std::fs::write(path, asm.render()).with_context(|| format!("writing {}", path.display()))
}

/// Encoded words only; the file is valid simulator input.
pub fn write_program(path: &Path, asm: &Assembly) -> Result<()> {
    let mut out = String::new();
    for w in asm.words() {
        out.push_str(&w.to_string());
        out.push('\n');
    }
    std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

pub fn labels_kv(labels: &LabelTable) -> Vec<LabelKV> {
    let mut v: Vec<LabelKV> = labels
        .iter()
        .map(|(name, addr)| LabelKV { addr, name: name.to_string() })
        .collect();
    v.sort_by_key(|kv| kv.addr);
    v
}

pub fn write_labels_json(path: &Path, labels: &LabelTable) -> Result<()> {
    let json = serde_json::to_string_pretty(&labels_kv(labels))?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32_lite::assemble;

    #[test]
    fn program_file_skips_error_lines() {
        let asm = assemble("addi a0, zero, 5\nfoo a0, a1, a2\nadd a1, a0, a0\n");
        let path = std::env::temp_dir().join("_rv32_asm_program.txt");
        write_program(&path, &asm).unwrap();
        let prog = read_program(&path).unwrap();
        assert_eq!(prog.len(), 2);
        assert_eq!(prog.words(), asm.words().as_slice());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn labels_sorted_by_address() {
        let asm = assemble("start: addi a0, zero, 1\nloop: beq a0, zero, end\nend: jal zero, loop\n");
        let kv = labels_kv(&asm.labels);
        let names: Vec<&str> = kv.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["start", "loop", "end"]);
        assert_eq!(kv[2].addr, 8);
    }
}
