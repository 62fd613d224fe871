pub mod asm;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod encoder;
pub mod exec;
pub mod instructions;
pub mod memory;
pub mod sim;
pub mod trace;
pub mod validator;
pub mod word;

pub mod isa {
    pub mod rv32; // RV32I subset
}

pub use asm::{assemble, AsmConfig, AsmLine, Assembler, Assembly, LabelTable};
pub use cpu::{Cpu, CpuConfig, RunState, Trap};
pub use memory::{Bus, SparseMemory};
pub use sim::{Machine, Program, RunSummary, Termination};
pub use validator::{AsmError, OffsetUnit};
pub use word::EncodedWord;
