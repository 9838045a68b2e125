use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum SimulatorError {
    // Parser errors
    InvalidOpcode(String),
    InvalidOperand { line: usize, text: String },
    UnresolvedLabel(String),

    // Configuration errors
    NoExecutionUnits,
    MissingExecutionUnit(&'static str),
    InvalidConfiguration(String),

    // System errors
    IoError(std::io::Error),
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorError::InvalidOpcode(mnemonic) => {
                write!(f, "Invalid opcode: {}", mnemonic)
            },
            SimulatorError::InvalidOperand { line, text } => {
                write!(f, "Malformed operand on line {}: {}", line, text)
            },
            SimulatorError::UnresolvedLabel(label) => {
                write!(f, "Unresolved branch label: {}", label)
            },
            SimulatorError::NoExecutionUnits => {
                write!(f, "Simulator does not have any execution units")
            },
            SimulatorError::MissingExecutionUnit(kind) => {
                write!(f, "No execution unit of type {} configured", kind)
            },
            SimulatorError::InvalidConfiguration(reason) => {
                write!(f, "Invalid configuration: {}", reason)
            },
            SimulatorError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for SimulatorError {}

impl From<std::io::Error> for SimulatorError {
    fn from(error: std::io::Error) -> Self {
        SimulatorError::IoError(error)
    }
}
