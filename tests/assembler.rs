// tests/assembler.rs
use tomasulo_rust::assembler::assemble;
use tomasulo_rust::isa::instructions::Opcode;
use tomasulo_rust::SimulatorError;

/// Parser coverage: operand grammars, immediate bases, label resolution,
/// the EOP cutoff, and the fatal error classes.

#[test]
fn test_r_type_operands() {
    let program = assemble("ADD R1, R2, R3\nEOP\n").unwrap();
    let add = &program[0];
    assert_eq!(add.opcode, Opcode::Add);
    assert_eq!(add.dest, Some(1));
    assert_eq!(add.src1, Some(2));
    assert_eq!(add.src2, Some(3));
}

#[test]
fn test_fp_r_type_operands() {
    let program = assemble("MULTS F4 F5 F6\nEOP\n").unwrap();
    let mults = &program[0];
    assert_eq!(mults.opcode, Opcode::Mults);
    assert_eq!(mults.dest, Some(4));
    assert_eq!(mults.src1, Some(5));
    assert_eq!(mults.src2, Some(6));
}

#[test]
fn test_immediate_bases() {
    let program = assemble("ADDI R1 R0 0xFF\nSUBI R2 R0 010\nADDI R3 R0 42\nEOP\n").unwrap();
    assert_eq!(program[0].immediate, Some(255), "0x prefix is hexadecimal");
    assert_eq!(program[1].immediate, Some(8), "leading zero is octal");
    assert_eq!(program[2].immediate, Some(42), "plain decimal");
}

#[test]
fn test_negative_immediate_wraps() {
    let program = assemble("ADDI R1 R0 -1\nEOP\n").unwrap();
    assert_eq!(program[0].immediate, Some(u32::MAX));
}

#[test]
fn test_load_operands() {
    let program = assemble("LW R5 0x10(R2)\nLWS F6 8(R3)\nEOP\n").unwrap();
    let lw = &program[0];
    assert_eq!(lw.dest, Some(5));
    assert_eq!(lw.immediate, Some(0x10));
    assert_eq!(lw.src1, Some(2), "src1 is the base register");

    let lws = &program[1];
    assert_eq!(lws.opcode, Opcode::Lws);
    assert_eq!(lws.dest, Some(6));
    assert_eq!(lws.immediate, Some(8));
    assert_eq!(lws.src1, Some(3));
}

#[test]
fn test_store_operands() {
    let program = assemble("SW R5 0x10(R2)\nSWS F1 0x20(R0)\nEOP\n").unwrap();
    let sw = &program[0];
    assert_eq!(sw.src1, Some(5), "src1 is the value register");
    assert_eq!(sw.src2, Some(2), "src2 is the base register");
    assert_eq!(sw.immediate, Some(0x10));
    assert_eq!(sw.dest, None, "stores have no architectural destination");

    let sws = &program[1];
    assert_eq!(sws.src1, Some(1));
    assert_eq!(sws.src2, Some(0));
}

#[test]
fn test_backward_label_displacement() {
    let program = assemble("loop: ADDI R1 R1 1\nBNEZ R1 loop\nEOP\n").unwrap();
    // (0 - 1 - 1) * 4 = -8
    assert_eq!(program[1].immediate, Some((-8i32) as u32));
    assert_eq!(program[1].src1, Some(1));
    assert_eq!(program[1].label.as_deref(), Some("loop"));
}

#[test]
fn test_forward_label_displacement() {
    let program = assemble("BEQZ R1 done\nADDI R2 R0 1\ndone: ADDI R3 R0 2\nEOP\n").unwrap();
    // (2 - 0 - 1) * 4 = 4
    assert_eq!(program[0].immediate, Some(4));
}

#[test]
fn test_label_on_its_own_line() {
    let program = assemble("JUMP end\nADDI R1 R0 1\nend:\nADDI R2 R0 2\nEOP\n").unwrap();
    // the label binds to the instruction that follows it
    assert_eq!(program[0].immediate, Some(4));
    assert_eq!(program[2].opcode, Opcode::Addi);
}

#[test]
fn test_zero_displacement_branch() {
    let program = assemble("BEQZ R1 next\nnext: ADDI R2 R0 1\nEOP\n").unwrap();
    assert_eq!(program[0].immediate, Some(0));
}

#[test]
fn test_eop_cuts_off_trailing_text() {
    let program = assemble("ADDI R1 R0 1\nEOP\nthis is not assembly\n").unwrap();
    assert_eq!(program.len(), 2);
    assert_eq!(program[1].opcode, Opcode::Eop);
}

#[test]
fn test_blank_lines_are_skipped() {
    let program = assemble("\nADDI R1 R0 1\n\n\nEOP\n").unwrap();
    assert_eq!(program.len(), 2);
}

#[test]
fn test_unknown_opcode_is_fatal() {
    match assemble("BOGUS R1 R2 R3\nEOP\n") {
        Err(SimulatorError::InvalidOpcode(mnemonic)) => assert_eq!(mnemonic, "BOGUS"),
        other => panic!("expected InvalidOpcode, got {:?}", other),
    }
}

#[test]
fn test_lowercase_mnemonic_is_rejected() {
    assert!(matches!(
        assemble("add R1 R2 R3\nEOP\n"),
        Err(SimulatorError::InvalidOpcode(_))
    ));
}

#[test]
fn test_unresolved_label_is_fatal() {
    match assemble("BNEZ R1 nowhere\nEOP\n") {
        Err(SimulatorError::UnresolvedLabel(label)) => assert_eq!(label, "nowhere"),
        other => panic!("expected UnresolvedLabel, got {:?}", other),
    }
}

#[test]
fn test_malformed_operand_reports_line() {
    match assemble("ADDI R1 R0 1\nADD R1, R2\nEOP\n") {
        Err(SimulatorError::InvalidOperand { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected InvalidOperand, got {:?}", other),
    }
}

#[test]
fn test_out_of_range_register_is_rejected() {
    assert!(matches!(
        assemble("ADD R1 R2 R32\nEOP\n"),
        Err(SimulatorError::InvalidOperand { .. })
    ));
}

#[test]
fn test_assemble_file_round_trip() {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "ADDI R1 R0 5").unwrap();
    writeln!(file, "EOP").unwrap();

    let program = tomasulo_rust::assembler::assemble_file(file.path()).unwrap();
    assert_eq!(program.len(), 2);
    assert_eq!(program[0].opcode, Opcode::Addi);
}
