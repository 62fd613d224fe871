use pretty_assertions::assert_eq;
use rv32_lite::sim::{run_program, Program, Termination};
use rv32_lite::trace::Recorder;
use rv32_lite::{assemble, CpuConfig, Trap};

fn run(src: &str) -> (Termination, Recorder) {
    let asm = assemble(src);
    assert!(!asm.has_errors(), "{}", asm.render());
    let mut rec = Recorder::default();
    let (summary, _) = run_program(Program::new(asm.words()), CpuConfig::default(), &mut rec).unwrap();
    (summary.termination, rec)
}

#[test]
fn jal_and_jalr_call_return() {
    let (term, rec) = run(
        "       jal ra, func
                addi a1, zero, 1
                beq zero, zero, 0
         func:  addi a0, zero, 7
                jalr zero, ra, 0",
    );
    assert_eq!(term, Termination::Halted);
    assert_eq!(rec.snapshots.len(), 5);
    let last = rec.last().unwrap();
    assert_eq!(last.regs[1], 4);
    assert_eq!(last.regs[10], 7);
    assert_eq!(last.regs[11], 1);
    assert_eq!(rec.snapshots[0].pc, 12);
}

#[test]
fn jal_negative_literal() {
    let (term, rec) = run(
        "jal zero, 8
         beq zero, zero, 0
         addi a0, zero, 3
         jal zero, -8",
    );
    assert_eq!(term, Termination::Halted);
    assert_eq!(rec.last().unwrap().regs[10], 3);
    assert_eq!(rec.last().unwrap().pc, 4);
}

#[test]
fn jalr_clears_bit_zero() {
    let (term, rec) = run("addi t0, zero, 13\njalr ra, t0, 0\naddi a0, zero, 1\nbeq zero, zero, 0\n");
    assert_eq!(term, Termination::Halted);
    let last = rec.last().unwrap();
    assert_eq!(last.regs[1], 8);
    assert_eq!(last.regs[10], 0);
    assert_eq!(last.pc, 12);
}

#[test]
fn jalr_reads_base_before_linking() {
    let (term, rec) = run("addi ra, zero, 12\njalr ra, ra, 0\naddi a0, zero, 1\nbeq zero, zero, 0\n");
    assert_eq!(term, Termination::Halted);
    let last = rec.last().unwrap();
    assert_eq!(last.regs[1], 8);
    assert_eq!(last.regs[10], 0);
}

#[test]
fn jalr_to_half_word_faults() {
    let (term, rec) = run("addi t0, zero, 6\njalr zero, t0, 0\n");
    assert_eq!(term, Termination::Faulted(Trap::MisalignedPc { pc: 6 }));
    // the jump itself completed and was traced
    assert_eq!(rec.snapshots.len(), 2);
}
