use pretty_assertions::assert_eq;
use rv32_lite::sim::{run_program, Program, Termination};
use rv32_lite::trace::Recorder;
use rv32_lite::{assemble, CpuConfig, RunSummary};

fn run(src: &str) -> (RunSummary, Recorder) {
    let asm = assemble(src);
    assert!(!asm.has_errors(), "{}", asm.render());
    let mut rec = Recorder::default();
    let (summary, _) = run_program(Program::new(asm.words()), CpuConfig::default(), &mut rec).unwrap();
    (summary, rec)
}

#[test]
fn addi_then_add() {
    let (summary, rec) = run("addi a0, zero, 5\nadd a1, a0, a0\n");
    let last = rec.last().unwrap();
    assert_eq!(last.regs[10], 5);
    assert_eq!(last.regs[11], 10);
    assert_eq!(last.pc, 8);
    assert_eq!(rec.snapshots.len(), 2);
    assert_eq!(summary.termination, Termination::Exhausted);
}

#[test]
fn stack_pointer_is_preset() {
    let (_, rec) = run("addi t0, sp, 0");
    let last = rec.last().unwrap();
    assert_eq!(last.regs[2], 380);
    assert_eq!(last.regs[5], 380);
}

#[test]
fn virtual_halt_stops_the_trace() {
    let (summary, rec) = run("addi a0, zero, 1\nbeq zero, zero, 0\naddi a0, zero, 2\n");
    assert_eq!(summary.termination, Termination::Halted);
    assert_eq!(summary.steps, 2);
    assert_eq!(rec.snapshots.len(), 2);
    let last = rec.last().unwrap();
    assert_eq!(last.pc, 4);
    assert_eq!(last.regs[10], 1);
}

#[test]
fn self_targeting_label_halts() {
    let (summary, rec) = run("addi a0, zero, 7\nhalt: beq zero, zero, halt\n");
    assert_eq!(summary.termination, Termination::Halted);
    assert_eq!(rec.last().unwrap().regs[10], 7);
}

#[test]
fn empty_program_still_dumps_memory() {
    let mut rec = Recorder::default();
    let (summary, _) = run_program(Program::default(), CpuConfig::default(), &mut rec).unwrap();
    assert_eq!(summary.termination, Termination::Exhausted);
    assert!(rec.snapshots.is_empty());
    let dump = rec.dump.unwrap();
    assert_eq!(dump.memory.len(), 32);
    assert_eq!(dump.memory[0].addr, 0x0001_0000);
    assert_eq!(dump.memory[31].addr, 0x0001_007C);
}

#[test]
fn step_limit_ends_an_endless_loop() {
    let asm = assemble("loop: jal zero, loop\n");
    let cfg = CpuConfig { max_steps: Some(5), ..CpuConfig::default() };
    let mut rec = Recorder::default();
    let (summary, _) = run_program(Program::new(asm.words()), cfg, &mut rec).unwrap();
    assert_eq!(summary.termination, Termination::StepLimit);
    assert_eq!(rec.snapshots.len(), 5);
    assert!(rec.dump.is_some());
}
