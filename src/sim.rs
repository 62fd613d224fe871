//! Fetch-decode-execute driver.

use anyhow::Result;
use serde::Serialize;
use tracing::{info, trace, warn};

use crate::cpu::{Cpu, CpuConfig, RunState, Trap};
use crate::decoder::Decoder;
use crate::disasm::fmt_decoded;
use crate::exec::{Executor, Flow, IntExecutor};
use crate::isa::rv32::Rv32Decoder;
use crate::memory::{Bus, SparseMemory};
use crate::trace::{MemoryDump, TraceSink};
use crate::word::{EncodedWord, ParseWordError};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {source}")]
pub struct ProgramError {
    pub line: usize,
    #[source]
    pub source: ParseWordError,
}

/// Instruction store; word `i` sits at byte address `4 * i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    words: Vec<EncodedWord>,
}

impl Program {
    pub fn new(words: Vec<EncodedWord>) -> Self {
        Self { words }
    }

    /// Parses one 32-digit binary literal per non-blank line.
    pub fn parse(text: &str) -> Result<Self, ProgramError> {
        let mut words = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let w = line
                .parse::<EncodedWord>()
                .map_err(|source| ProgramError { line: i + 1, source })?;
            words.push(w);
        }
        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[EncodedWord] {
        &self.words
    }

    /// `None` once `pc` runs past the last word.
    pub fn fetch(&self, pc: u32) -> Option<u32> {
        self.words.get((pc / 4) as usize).map(|w| w.bits())
    }
}

impl From<Vec<EncodedWord>> for Program {
    fn from(words: Vec<EncodedWord>) -> Self {
        Self::new(words)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Termination {
    Halted,
    Faulted(Trap),
    /// PC left the instruction store.
    Exhausted,
    StepLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub termination: Termination,
    pub steps: u64,
    pub pc: u32,
}

/// Owns the machine state for one run.
pub struct Machine<B: Bus = SparseMemory, D: Decoder = Rv32Decoder, X: Executor = IntExecutor> {
    pub cpu: Cpu,
    pub mem: B,
    program: Program,
    dec: D,
    exec: X,
}

impl Machine {
    pub fn new(program: Program, cfg: CpuConfig) -> Self {
        Self::with_parts(program, cfg, SparseMemory::new(), Rv32Decoder::new(), IntExecutor)
    }
}

impl<B: Bus, D: Decoder, X: Executor> Machine<B, D, X> {
    pub fn with_parts(program: Program, cfg: CpuConfig, mem: B, dec: D, exec: X) -> Self {
        Self { cpu: Cpu::new(cfg), mem, program, dec, exec }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// One fetch-decode-execute cycle. `None` when there is nothing left to
    /// run: the CPU is no longer running or PC is past the program.
    pub fn step(&mut self) -> Option<Result<Flow, Trap>> {
        if !self.cpu.is_running() {
            return None;
        }
        let pc = self.cpu.pc;
        if pc % 4 != 0 {
            let trap = Trap::MisalignedPc { pc };
            self.cpu.state = RunState::Faulted(trap.clone());
            return Some(Err(trap));
        }
        let raw = self.program.fetch(pc)?;
        if tracing::enabled!(tracing::Level::TRACE) {
            let text = self.dec.decode(raw).map(|d| fmt_decoded(&d));
            trace!(pc, raw, insn = ?text, "step");
        }
        Some(self.cpu.step(raw, &mut self.mem, &self.dec, &self.exec))
    }

    fn dump(&self) -> MemoryDump {
        let cfg = &self.cpu.cfg;
        let words = (0..cfg.dump_words)
            .map(|i| {
                let addr = cfg.dump_base.wrapping_add(i * 4);
                (addr, self.mem.read_u32(addr))
            })
            .collect::<Vec<_>>();
        MemoryDump::from(words)
    }

    /// Runs to completion, emitting a snapshot per completed step and the memory dump at the end.
    pub fn run<T: TraceSink>(&mut self, sink: &mut T) -> Result<RunSummary> {
        let termination = loop {
            if let Some(limit) = self.cpu.cfg.max_steps {
                if self.cpu.steps >= limit {
                    break Termination::StepLimit;
                }
            }
            match self.step() {
                None => break Termination::Exhausted,
                Some(Ok(Flow::Next)) => sink.snapshot(&self.cpu.snapshot())?,
                Some(Ok(Flow::Halt)) => {
                    sink.snapshot(&self.cpu.snapshot())?;
                    break Termination::Halted;
                }
                Some(Err(trap)) => {
                    warn!(%trap, "execution faulted");
                    break Termination::Faulted(trap);
                }
            }
        };
        sink.memory_dump(&self.dump())?;
        sink.finish()?;

        let summary = RunSummary {
            termination,
            steps: self.cpu.steps,
            pc: self.cpu.pc,
        };
        info!(
            steps = summary.steps,
            pc = summary.pc,
            termination = ?summary.termination,
            "run finished"
        );
        Ok(summary)
    }
}

/// Runs `program` on a fresh machine with default parts.
pub fn run_program<T: TraceSink>(
    program: Program,
    cfg: CpuConfig,
    sink: &mut T,
) -> Result<(RunSummary, Machine)> {
    let mut m = Machine::new(program, cfg);
    let summary = m.run(sink)?;
    Ok((summary, m))
}
