// tests/ooo_simulator.rs
use tomasulo_rust::isa::instructions::UnitKind;
use tomasulo_rust::ooo_simulator::config::SimulatorConfig;
use tomasulo_rust::{Simulator, UNDEFINED};

/// Test suite for the out-of-order pipeline: end-to-end scenarios covering
/// single-instruction timing, rename serialization, mispredict recovery,
/// memory round trips, dual issue, and structural stalls.

/// Helper: the minimal single-issue machine used by the timing scenarios.
fn tiny_config() -> SimulatorConfig {
    SimulatorConfig::new(4096, 2, 1, 0, 0, 0).with_unit(UnitKind::Integer, 2, 1)
}

/// Helper: a roomier machine with one unit of every kind.
fn full_config() -> SimulatorConfig {
    SimulatorConfig::new(4096, 8, 2, 2, 2, 2)
        .with_unit(UnitKind::Integer, 1, 1)
        .with_unit(UnitKind::Adder, 3, 1)
        .with_unit(UnitKind::Multiplier, 5, 1)
        .with_unit(UnitKind::Divider, 10, 1)
        .with_unit(UnitKind::Memory, 1, 1)
}

fn setup(config: &SimulatorConfig, program: &str) -> Simulator {
    let mut simulator = Simulator::new(config);
    simulator
        .load_program_source(program, 0)
        .expect("program should assemble");
    simulator
}

#[test]
fn test_single_addi_pipeline_timing() {
    let mut simulator = setup(&tiny_config(), "ADDI R1 R0 5\nEOP\n");
    simulator.set_int_register(0, 0);

    simulator.run(0).unwrap();

    assert_eq!(simulator.get_int_register(1), 5, "R1 should contain 5");
    assert_eq!(simulator.get_instructions_committed(), 1);
    assert_eq!(
        simulator.get_clock_cycles(),
        5,
        "commit at cycle 4 plus the halt cycle"
    );
    assert!((simulator.get_ipc() - 0.2).abs() < 1e-6, "IPC should be 0.2");

    let entry = &simulator.execution_log[0];
    assert_eq!(entry.issue, Some(1));
    assert_eq!(entry.exe, Some(2));
    assert_eq!(entry.wr, Some(3));
    assert_eq!(entry.commit, Some(4));
}

#[test]
fn test_raw_hazard_serialized_by_rename() {
    let mut simulator = setup(&tiny_config(), "ADDI R1 R0 3\nADDI R2 R1 4\nEOP\n");
    simulator.set_int_register(0, 0);

    simulator.run(0).unwrap();

    assert_eq!(simulator.get_int_register(1), 3, "R1 should contain 3");
    assert_eq!(simulator.get_int_register(2), 7, "R2 should contain 3 + 4");

    let first = &simulator.execution_log[0];
    assert_eq!((first.issue, first.exe), (Some(1), Some(2)));
    assert_eq!((first.wr, first.commit), (Some(3), Some(4)));

    // the dependent instruction picks its operand off the broadcast in
    // cycle 3 and dispatches the cycle after
    let second = &simulator.execution_log[1];
    assert_eq!(second.issue, Some(2));
    assert_eq!(second.exe, Some(4));
    assert_eq!(second.wr, Some(5));
    assert_eq!(second.commit, Some(6));
}

#[test]
fn test_mispredict_flush_discards_wrong_path() {
    let program = "\
ADDI R1 R0 1
BNEZ R1 target
ADDI R2 R0 99
target: ADDI R3 R0 7
EOP
";
    let mut simulator = setup(&full_config(), program);
    simulator.set_int_register(0, 0);

    simulator.run(0).unwrap();

    assert_eq!(simulator.get_branch_mispredictions(), 1);
    assert_eq!(
        simulator.get_int_register(2),
        UNDEFINED,
        "the wrong-path ADDI must never commit"
    );
    assert_eq!(simulator.get_int_register(3), 7, "R3 should contain 7");

    // after the flush and re-steer everything drained through commit
    assert_eq!(simulator.rob.len(), 0);
    for reg in 0..32 {
        assert_eq!(simulator.get_int_register_tag(reg), UNDEFINED);
    }
    // committed: ADDI R1, BNEZ, ADDI R3
    assert_eq!(simulator.get_instructions_committed(), 3);
}

#[test]
fn test_store_load_round_trip() {
    let program = "\
LWS F1 0x14(R0)
SWS F1 0x20(R0)
LWS F2 0x20(R0)
EOP
";
    let mut simulator = setup(&full_config(), program);
    simulator.set_int_register(0, 0);
    simulator.write_memory(0x14, 10.0f32.to_bits());

    simulator.run(0).unwrap();

    assert_eq!(simulator.get_fp_register(1), 10.0, "F1 should load 10.0");
    assert_eq!(
        simulator.get_fp_register(2),
        10.0,
        "F2 should observe the committed store"
    );
    assert_eq!(
        simulator.read_memory(0x20),
        10.0f32.to_bits(),
        "memory[0x20..0x23] should encode 10.0 little-endian"
    );
    assert_eq!(simulator.memory.read_byte(0x20), 10.0f32.to_bits() as u8);
}

#[test]
fn test_dual_issue_front_end() {
    let program = "\
ADDI R1 R0 1
ADDI R2 R0 2
ADDI R3 R0 3
ADDI R4 R0 4
EOP
";
    let dual = SimulatorConfig::new(4096, 8, 4, 0, 0, 0)
        .with_issue_width(2)
        .with_unit(UnitKind::Integer, 1, 2);
    let mut simulator = setup(&dual, program);
    simulator.set_int_register(0, 0);
    simulator.run(0).unwrap();

    for reg in 1..=4 {
        assert_eq!(simulator.get_int_register(reg), reg as u32);
    }
    // exactly two instructions issue per cycle for two cycles
    let issues: Vec<Option<u32>> = simulator
        .execution_log
        .iter()
        .map(|entry| entry.issue)
        .collect();
    assert_eq!(issues, vec![Some(1), Some(1), Some(2), Some(2)]);

    // the wider front end beats the same program on a single-issue machine
    let single = SimulatorConfig::new(4096, 8, 4, 0, 0, 0).with_unit(UnitKind::Integer, 1, 1);
    let mut reference = setup(&single, program);
    reference.set_int_register(0, 0);
    reference.run(0).unwrap();
    assert!(
        simulator.get_ipc() > reference.get_ipc(),
        "dual issue IPC {} should exceed single issue IPC {}",
        simulator.get_ipc(),
        reference.get_ipc()
    );
}

#[test]
fn test_structural_stall_on_single_multiplier() {
    let program = "\
MULTS F3 F1 F2
MULTS F4 F1 F2
EOP
";
    let config = SimulatorConfig::new(4096, 8, 1, 1, 2, 1)
        .with_unit(UnitKind::Integer, 1, 1)
        .with_unit(UnitKind::Multiplier, 10, 1);
    let mut simulator = setup(&config, program);
    simulator.set_fp_register(1, 2.0);
    simulator.set_fp_register(2, 3.0);

    simulator.run(0).unwrap();

    assert_eq!(simulator.get_fp_register(3), 6.0);
    assert_eq!(simulator.get_fp_register(4), 6.0);

    let first = &simulator.execution_log[0];
    let second = &simulator.execution_log[1];
    assert_eq!(first.exe, Some(2));
    assert_eq!(first.wr, Some(11), "latency 10 writes back 9 cycles later");
    // unit reuse is not allowed in the release cycle itself
    assert_eq!(
        second.exe,
        Some(12),
        "second MULTS dispatches the cycle after the multiplier is released"
    );
}

#[test]
fn test_ipc_matches_counters() {
    let mut simulator = setup(&full_config(), "ADDI R1 R0 3\nADDI R2 R1 4\nEOP\n");
    simulator.set_int_register(0, 0);
    simulator.run(0).unwrap();

    let stats = simulator.stats();
    assert_eq!(stats.instructions_committed, simulator.get_instructions_committed());
    assert_eq!(stats.clock_cycles, simulator.get_clock_cycles());
    assert!(
        (stats.ipc - stats.instructions_committed as f32 / stats.clock_cycles as f32).abs() < 1e-6
    );
}

#[test]
fn test_jump_redirects_fetch() {
    let program = "\
ADDI R1 R0 1
JUMP skip
ADDI R2 R0 99
skip: ADDI R3 R0 7
EOP
";
    let mut simulator = setup(&full_config(), program);
    simulator.set_int_register(0, 0);
    simulator.run(0).unwrap();

    assert_eq!(simulator.get_int_register(2), UNDEFINED);
    assert_eq!(simulator.get_int_register(3), 7);
    assert_eq!(
        simulator.get_branch_mispredictions(),
        1,
        "JUMP always mispredicts a not-taken front end"
    );
}

#[test]
fn test_backward_branch_loop() {
    // count R1 down from 3; the BNEZ at the end of the loop is taken twice
    let program = "\
ADDI R1 R0 3
loop: SUBI R1 R1 1
BNEZ R1 loop
ADDI R2 R0 42
EOP
";
    let mut simulator = setup(&full_config(), program);
    simulator.set_int_register(0, 0);
    simulator.run(0).unwrap();

    assert_eq!(simulator.get_int_register(1), 0);
    assert_eq!(simulator.get_int_register(2), 42);
    assert_eq!(simulator.get_branch_mispredictions(), 2);
    // 1x ADDI, 3x SUBI, 3x BNEZ, 1x ADDI
    assert_eq!(simulator.get_instructions_committed(), 8);
}

#[test]
fn test_fp_pipeline_with_adder_latency() {
    let program = "\
ADDS F3 F1 F2
SUBS F4 F3 F1
EOP
";
    let mut simulator = setup(&full_config(), program);
    simulator.set_fp_register(1, 1.5);
    simulator.set_fp_register(2, 2.25);
    simulator.run(0).unwrap();

    assert_eq!(simulator.get_fp_register(3), 3.75);
    assert_eq!(simulator.get_fp_register(4), 2.25);

    let first = &simulator.execution_log[0];
    assert_eq!(first.exe, Some(2));
    assert_eq!(first.wr, Some(4), "latency 3 writes back 2 cycles later");
}

#[test]
fn test_integer_mult_div_use_fp_unit_pool() {
    let program = "\
MULT R3 R1 R2
DIV R4 R1 R2
EOP
";
    let mut simulator = setup(&full_config(), program);
    simulator.set_int_register(1, 12);
    simulator.set_int_register(2, 4);
    simulator.run(0).unwrap();

    assert_eq!(simulator.get_int_register(3), 48);
    assert_eq!(simulator.get_int_register(4), 3);
}
