use crate::cpu::{Cpu, Trap};
use crate::decoder::{Decoded, Op};
use crate::memory::Bus;

/// What the run loop does after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Next,
    Halt,
}

pub trait Executor {
    /// Applies `d` to `cpu`, including the PC update.
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: Decoded) -> Result<Flow, Trap>;
}

/// Integer executor for the RV32 subset.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntExecutor;

fn effective_addr(cpu: &Cpu, d: &Decoded) -> Result<u32, Trap> {
    let addr = cpu.reg(d.rs1).wrapping_add(d.imm as u32);
    if addr % 4 != 0 {
        return Err(Trap::Unaligned { pc: cpu.pc, addr });
    }
    Ok(addr)
}

impl Executor for IntExecutor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: Decoded) -> Result<Flow, Trap> {
        let pc = cpu.pc;
        let next = pc.wrapping_add(4);
        let a = cpu.reg(d.rs1);
        let b = cpu.reg(d.rs2);

        match d.op {
            Op::Add | Op::Sub | Op::Slt | Op::Srl | Op::Or | Op::And => {
                let res = match d.op {
                    Op::Add => a.wrapping_add(b),
                    Op::Sub => a.wrapping_sub(b),
                    Op::Slt => ((a as i32) < (b as i32)) as u32,
                    Op::Srl => a >> (b & 0x1F),
                    Op::Or => a | b,
                    _ => a & b,
                };
                cpu.set_reg(d.rd, res);
                cpu.pc = next;
            }
            Op::Addi => {
                cpu.set_reg(d.rd, a.wrapping_add(d.imm as u32));
                cpu.pc = next;
            }
            Op::Lw => {
                let addr = effective_addr(cpu, &d)?;
                cpu.set_reg(d.rd, bus.read_u32(addr));
                cpu.pc = next;
            }
            Op::Sw => {
                let addr = effective_addr(cpu, &d)?;
                bus.write_u32(addr, b);
                cpu.pc = next;
            }
            Op::Beq | Op::Bne | Op::Blt => {
                let taken = match d.op {
                    Op::Beq => a == b,
                    Op::Bne => a != b,
                    _ => (a as i32) < (b as i32),
                };
                if taken && d.imm == 0 && d.rs1 == 0 && d.rs2 == 0 {
                    return Ok(Flow::Halt);
                }
                cpu.pc = if taken { pc.wrapping_add(d.imm as u32) } else { next };
            }
            Op::Jal => {
                cpu.set_reg(d.rd, next);
                cpu.pc = pc.wrapping_add(d.imm as u32);
            }
            Op::Jalr => {
                // rs1 was read before the link write, so rd == rs1 is fine
                let target = a.wrapping_add(d.imm as u32) & !1;
                cpu.set_reg(d.rd, next);
                cpu.pc = target;
            }
        }
        Ok(Flow::Next)
    }
}
