use serde::{Deserialize, Serialize};

use crate::decoder::Decoder;
use crate::exec::{Executor, Flow};
use crate::memory::Bus;
use crate::trace::Snapshot;

pub const REG_SP: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    pub initial_sp: u32,
    pub dump_base: u32,
    pub dump_words: u32,
    pub max_steps: Option<u64>,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            initial_sp: 380,
            dump_base: 0x0001_0000,
            dump_words: 32, // 0x0001_0000..0x0001_0080
            max_steps: None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trap {
    /// `raw` did not decode: unknown opcode, or a known opcode with a funct3/funct7 outside the subset.
    #[error(
        "Unsupported instruction {raw:#010x} at {pc:#010x} (opcode {opcode:07b}, funct3 {:03b}, funct7 {:07b})",
        funct3_of(.raw),
        funct7_of(.raw)
    )]
    UnsupportedOpcode { pc: u32, opcode: u8, raw: u32 },
    #[error("Unaligned access at {addr:#010x} (pc {pc:#010x})")]
    Unaligned { pc: u32, addr: u32 },
    #[error("Misaligned program counter {pc:#010x}")]
    MisalignedPc { pc: u32 },
}

fn funct3_of(raw: &u32) -> u32 {
    (raw >> 12) & 0x7
}

fn funct7_of(raw: &u32) -> u32 {
    raw >> 25
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Halted,
    Faulted(Trap),
}

/// Machine state: PC, register file and run state. Data memory lives behind a [`Bus`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    pub pc: u32,
    pub regs: [u32; 32],
    pub state: RunState,
    pub steps: u64,
    pub cfg: CpuConfig,
}

impl Cpu {
    pub fn new(cfg: CpuConfig) -> Self {
        let mut regs = [0; 32];
        regs[REG_SP] = cfg.initial_sp;
        Self {
            pc: 0,
            regs,
            state: RunState::Running,
            steps: 0,
            cfg,
        }
    }

    pub fn reset(&mut self, reset_pc: u32) {
        *self = Self::new(self.cfg);
        self.pc = reset_pc;
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    #[inline]
    pub fn reg(&self, idx: u8) -> u32 {
        self.regs[(idx & 0x1F) as usize]
    }

    /// Writes to x0 are discarded.
    #[inline]
    pub fn set_reg(&mut self, idx: u8, val: u32) {
        let idx = (idx & 0x1F) as usize;
        if idx != 0 {
            self.regs[idx] = val;
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot { pc: self.pc, regs: self.regs }
    }

    /// Executes one already-fetched word.
    ///
    /// A fault moves the CPU to `Faulted` and leaves PC and registers as they
    /// were; a virtual halt moves it to `Halted`.
    pub fn step<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        raw32: u32,
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> Result<Flow, Trap> {
        let pc = self.pc;
        let result = dec
            .decode(raw32)
            .ok_or(Trap::UnsupportedOpcode {
                pc,
                opcode: (raw32 & 0x7F) as u8,
                raw: raw32,
            })
            .and_then(|d| exec.exec(self, bus, d));
        self.regs[0] = 0;
        match &result {
            Ok(Flow::Next) => {}
            Ok(Flow::Halt) => self.state = RunState::Halted,
            Err(trap) => self.state = RunState::Faulted(trap.clone()),
        }
        self.steps += 1;
        result
    }
}
