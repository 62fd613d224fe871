use pretty_assertions::assert_eq;
use rv32_lite::decoder::{Decoder, Op};
use rv32_lite::isa::rv32::Rv32Decoder;
use rv32_lite::sim::{run_program, Program, Termination};
use rv32_lite::trace::Recorder;
use rv32_lite::{assemble, CpuConfig, EncodedWord, Trap};

fn run(src: &str) -> (Termination, Recorder) {
    let asm = assemble(src);
    assert!(!asm.has_errors(), "{}", asm.render());
    let mut rec = Recorder::default();
    let (summary, _) = run_program(Program::new(asm.words()), CpuConfig::default(), &mut rec).unwrap();
    (summary.termination, rec)
}

const COUNT_LOOP: &str = "
    addi t0, zero, 3
    addi a0, zero, 0
loop:
    addi a0, a0, 2
    addi t0, t0, -1
    bne t0, zero, loop
    beq zero, zero, 0
";

#[test]
fn bne_loop_runs_to_halt() {
    let (term, rec) = run(COUNT_LOOP);
    assert_eq!(term, Termination::Halted);
    assert_eq!(rec.snapshots.len(), 2 + 3 * 3 + 1);
    let last = rec.last().unwrap();
    assert_eq!(last.regs[10], 6);
    assert_eq!(last.regs[5], 0);
    assert_eq!(last.pc, 20);
}

#[test]
fn backward_branch_has_negative_offset() {
    let asm = assemble(COUNT_LOOP);
    let bne = asm.words()[4];
    assert_eq!(bne.bits() >> 31, 1, "sign bit of the B immediate");
    let d = Rv32Decoder::new().decode(bne.bits()).unwrap();
    assert_eq!(d.op, Op::Bne);
    assert_eq!(d.imm, -8);
}

#[test]
fn forward_beq_skips() {
    let (term, rec) = run("addi a0, zero, 1\nbeq a0, a0, skip\naddi a0, zero, 99\nskip: addi a1, zero, 2\n");
    assert_eq!(term, Termination::Exhausted);
    assert_eq!(rec.snapshots.len(), 3);
    let last = rec.last().unwrap();
    assert_eq!((last.regs[10], last.regs[11]), (1, 2));
}

#[test]
fn literal_offset_is_in_bytes() {
    let (_, rec) = run("beq zero, zero, 8\naddi a0, zero, 1\naddi a1, zero, 1\n");
    let last = rec.last().unwrap();
    assert_eq!((last.regs[10], last.regs[11]), (0, 1));
}

#[test]
fn blt_compares_signed() {
    let (term, rec) = run(
        "addi t0, zero, -5
         blt t0, zero, neg
         addi a0, zero, 1
         beq zero, zero, 0
neg:     addi a0, zero, 2
         beq zero, zero, 0",
    );
    assert_eq!(term, Termination::Halted);
    assert_eq!(rec.last().unwrap().regs[10], 2);
}

#[test]
fn untaken_zero_branch_does_not_halt() {
    let (term, rec) = run("bne zero, zero, 0\naddi a0, zero, 1\n");
    assert_eq!(term, Termination::Exhausted);
    assert_eq!(rec.snapshots.len(), 2);
    assert_eq!(rec.last().unwrap().regs[10], 1);
}

#[test]
fn zero_offset_on_other_registers_spins() {
    // taken, offset 0, but not x0/x0: loops in place until the step cap
    let asm = assemble("beq a0, a0, 0\n");
    let cfg = CpuConfig { max_steps: Some(3), ..CpuConfig::default() };
    let mut rec = Recorder::default();
    let (summary, _) = run_program(Program::new(asm.words()), cfg, &mut rec).unwrap();
    assert_eq!(summary.termination, Termination::StepLimit);
    assert!(rec.snapshots.iter().all(|s| s.pc == 0));
}

#[test]
fn unsupported_opcode_faults_and_dumps() {
    let addi = assemble("addi a0, zero, 1").words()[0];
    let lui = EncodedWord::new(0x0000_0537); // lui a0, 0
    let mut rec = Recorder::default();
    let (summary, m) = run_program(Program::new(vec![addi, lui, addi]), CpuConfig::default(), &mut rec).unwrap();
    assert_eq!(
        summary.termination,
        Termination::Faulted(Trap::UnsupportedOpcode { pc: 4, opcode: 0x37, raw: 0x537 })
    );
    assert_eq!(rec.snapshots.len(), 1);
    assert!(rec.dump.is_some());
    assert_eq!(m.cpu.pc, 4);
    assert!(!m.cpu.is_running());
}
