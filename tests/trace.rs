use pretty_assertions::assert_eq;
use rv32_lite::sim::{run_program, Program};
use rv32_lite::trace::{JsonTrace, MemoryDump, Snapshot, TextTrace};
use rv32_lite::{assemble, CpuConfig};

const PROG: &str = "addi a0, zero, 5\nbeq zero, zero, 0\n";

fn zero_pad(n: u32) -> String {
    format!("0b{n:032b}")
}

#[test]
fn snapshot_line_format() {
    let mut regs = [0u32; 32];
    regs[2] = 380;
    let line = Snapshot { pc: 4, regs }.to_string();
    let fields: Vec<&str> = line.split(' ').collect();
    assert_eq!(fields.len(), 33);
    assert_eq!(fields[0], zero_pad(4));
    assert_eq!(fields[3], "0b00000000000000000000000101111100");
}

#[test]
fn dump_line_format() {
    let dump = MemoryDump::from(vec![(0x0001_0000, 5), (0x0001_0004, 0xFFFF_FFFF)]);
    assert_eq!(
        dump.to_string(),
        "0x00010000:0b00000000000000000000000000000101\n\
         0x00010004:0b11111111111111111111111111111111\n"
    );
}

#[test]
fn text_trace_to_file() {
    let path = std::env::temp_dir().join(format!("rv32-lite-trace-{}.txt", std::process::id()));
    {
        let mut sink = TextTrace::create(&path).unwrap();
        run_program(Program::new(assemble(PROG).words()), CpuConfig::default(), &mut sink).unwrap();
    }
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2 + 32);
    assert!(lines[0].starts_with(&zero_pad(4)));
    assert!(lines[1].starts_with(&zero_pad(4)), "halt leaves pc on the branch");
    assert_eq!(lines[2], "0x00010000:0b00000000000000000000000000000000");
    assert_eq!(lines[33], "0x0001007C:0b00000000000000000000000000000000");
}

#[test]
fn json_trace_lines_parse() {
    let mut sink = JsonTrace::new(Vec::new());
    run_program(Program::new(assemble(PROG).words()), CpuConfig::default(), &mut sink).unwrap();
    let out = String::from_utf8(sink.into_inner()).unwrap();

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    let first: Snapshot = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first.regs[10], 5);
    let dump: MemoryDump = serde_json::from_str(lines[2]).unwrap();
    assert_eq!(dump.memory.len(), 32);
}
