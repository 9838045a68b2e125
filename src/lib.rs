// Copyright (c) 2024 The tomasulo-rust developers
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// lib.rs
//
// This file is the main library file for the tomasulo-rust project.
// It re-exports the assembler, isa, and ooo_simulator modules.

pub mod assembler;
pub mod errors;
pub mod isa;
pub mod ooo_simulator;

/// Sentinel meaning "not set" for pc, tag, immediate, register value, cycle
/// counter, and destination fields at the external boundary.
pub const UNDEFINED: u32 = 0xFFFF_FFFF;

// Re-export important types for easier access
pub use crate::assembler::assemble;
pub use crate::errors::SimulatorError;
pub use crate::isa::instructions::{Instruction, Opcode};
pub use crate::ooo_simulator::config::SimulatorConfig;
pub use crate::ooo_simulator::simulator::Simulator;
