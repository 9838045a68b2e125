pub mod assembler;

pub use assembler::{assemble, assemble_file};
