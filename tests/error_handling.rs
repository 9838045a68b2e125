// tests/error_handling.rs
use tomasulo_rust::isa::instructions::UnitKind;
use tomasulo_rust::ooo_simulator::config::SimulatorConfig;
use tomasulo_rust::{Simulator, SimulatorError};

/// Fatal error classes: configurations that cannot execute the program, and
/// I/O failures. Resource exhaustion is exercised in edge_cases.rs since it
/// stalls rather than fails.

#[test]
fn test_no_execution_units_is_fatal() {
    let config = SimulatorConfig::new(1024, 4, 2, 2, 2, 2);
    let mut simulator = Simulator::new(&config);
    simulator
        .load_program_source("ADDI R1 R0 1\nEOP\n", 0)
        .unwrap();

    match simulator.run(0) {
        Err(SimulatorError::NoExecutionUnits) => {},
        other => panic!("expected NoExecutionUnits, got {:?}", other),
    }
}

#[test]
fn test_missing_unit_kind_is_fatal() {
    // integer unit present, but the program needs the memory unit
    let config = SimulatorConfig::new(1024, 4, 2, 2, 2, 2).with_unit(UnitKind::Integer, 1, 1);
    let mut simulator = Simulator::new(&config);
    simulator
        .load_program_source("LW R1 0x10(R0)\nEOP\n", 0)
        .unwrap();
    simulator.set_int_register(0, 0);

    match simulator.run(0) {
        Err(SimulatorError::MissingExecutionUnit(kind)) => assert_eq!(kind, "MEMORY"),
        other => panic!("expected MissingExecutionUnit, got {:?}", other),
    }
}

#[test]
fn test_missing_divider_is_fatal() {
    let config = SimulatorConfig::new(1024, 4, 2, 2, 2, 2)
        .with_unit(UnitKind::Integer, 1, 1)
        .with_unit(UnitKind::Multiplier, 5, 1);
    let mut simulator = Simulator::new(&config);
    simulator
        .load_program_source("DIVS F1 F2 F3\nEOP\n", 0)
        .unwrap();
    simulator.set_fp_register(2, 6.0);
    simulator.set_fp_register(3, 2.0);

    match simulator.run(0) {
        Err(SimulatorError::MissingExecutionUnit(kind)) => assert_eq!(kind, "DIVIDER"),
        other => panic!("expected MissingExecutionUnit, got {:?}", other),
    }
}

#[test]
fn test_load_program_io_error() {
    let config = SimulatorConfig::default();
    let mut simulator = Simulator::new(&config);
    assert!(matches!(
        simulator.load_program("/nonexistent/program.asm", 0),
        Err(SimulatorError::IoError(_))
    ));
}

#[test]
fn test_parser_error_propagates_through_load() {
    let config = SimulatorConfig::default();
    let mut simulator = Simulator::new(&config);
    assert!(matches!(
        simulator.load_program_source("FROB R1 R2 R3\nEOP\n", 0),
        Err(SimulatorError::InvalidOpcode(_))
    ));
}

#[test]
fn test_config_json_round_trip() {
    use std::io::Write;

    let config = SimulatorConfig::new(4096, 16, 3, 2, 2, 4)
        .with_issue_width(2)
        .with_unit(UnitKind::Integer, 1, 2)
        .with_unit(UnitKind::Memory, 3, 1);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(config.to_json().as_bytes()).unwrap();

    let loaded = SimulatorConfig::from_json_file(file.path()).unwrap();
    assert_eq!(loaded.rob_size, 16);
    assert_eq!(loaded.issue_width, 2);
    assert_eq!(loaded.units.len(), 2);
    assert_eq!(loaded.units[1].kind, UnitKind::Memory);
}

#[test]
fn test_malformed_config_json_is_fatal() {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{ not json").unwrap();

    assert!(matches!(
        SimulatorConfig::from_json_file(file.path()),
        Err(SimulatorError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_error_messages_identify_the_problem() {
    let message = SimulatorError::MissingExecutionUnit("MEMORY").to_string();
    assert!(message.contains("MEMORY"), "message was {:?}", message);

    let message = SimulatorError::UnresolvedLabel("loop".to_string()).to_string();
    assert!(message.contains("loop"));

    let message = SimulatorError::InvalidOperand {
        line: 7,
        text: "ADD R1".to_string(),
    }
    .to_string();
    assert!(message.contains('7'));
}
