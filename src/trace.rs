use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// PC and register file after one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pc: u32,
    pub regs: [u32; 32],
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0b{:032b}", self.pc)?;
        for r in &self.regs {
            write!(f, " 0b{r:032b}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpEntry {
    pub addr: u32,
    pub value: u32,
}

impl fmt::Display for DumpEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}:0b{:032b}", self.addr, self.value)
    }
}

/// Final view of the data-memory window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDump {
    pub memory: Vec<DumpEntry>,
}

impl MemoryDump {
    pub fn get(&self, addr: u32) -> Option<u32> {
        self.memory.iter().find(|e| e.addr == addr).map(|e| e.value)
    }
}

impl From<Vec<(u32, u32)>> for MemoryDump {
    fn from(words: Vec<(u32, u32)>) -> Self {
        Self {
            memory: words
                .into_iter()
                .map(|(addr, value)| DumpEntry { addr, value })
                .collect(),
        }
    }
}

impl fmt::Display for MemoryDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.memory {
            writeln!(f, "{e}")?;
        }
        Ok(())
    }
}

/// Consumer of the simulator's observable output.
pub trait TraceSink {
    fn snapshot(&mut self, s: &Snapshot) -> Result<()>;
    fn memory_dump(&mut self, d: &MemoryDump) -> Result<()>;
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Plain-text trace: one line per snapshot, then the dump lines.
pub struct TextTrace<W: Write> {
    out: W,
}

impl<W: Write> TextTrace<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TextTrace<BufWriter<File>> {
    /// Truncates (or creates) `path`. The file is closed when the trace is dropped.
    pub fn create(path: &Path) -> Result<Self> {
        let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        Ok(Self::new(BufWriter::new(f)))
    }
}

impl<W: Write> TraceSink for TextTrace<W> {
    fn snapshot(&mut self, s: &Snapshot) -> Result<()> {
        writeln!(self.out, "{s}")?;
        Ok(())
    }

    fn memory_dump(&mut self, d: &MemoryDump) -> Result<()> {
        write!(self.out, "{d}")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// JSON-lines trace: one object per snapshot, one for the dump.
pub struct JsonTrace<W: Write> {
    out: W,
}

impl<W: Write> JsonTrace<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TraceSink for JsonTrace<W> {
    fn snapshot(&mut self, s: &Snapshot) -> Result<()> {
        serde_json::to_writer(&mut self.out, s)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn memory_dump(&mut self, d: &MemoryDump) -> Result<()> {
        serde_json::to_writer(&mut self.out, d)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub snapshots: Vec<Snapshot>,
    pub dump: Option<MemoryDump>,
}

impl Recorder {
    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }
}

impl TraceSink for Recorder {
    fn snapshot(&mut self, s: &Snapshot) -> Result<()> {
        self.snapshots.push(*s);
        Ok(())
    }

    fn memory_dump(&mut self, d: &MemoryDump) -> Result<()> {
        self.dump = Some(d.clone());
        Ok(())
    }
}
