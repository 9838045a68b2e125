pub mod instructions;

pub use instructions::{Instruction, Opcode, Stage, StationClass, UnitKind};
