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

// instructions.rs
//
// This file contains the instruction set definitions for the out-of-order
// simulator. It defines the Opcode enum with its classification helpers,
// the decoded Instruction record produced by the assembler, and the pure
// ALU evaluator shared by the integer, floating-point, and branch units.

use crate::UNDEFINED;
use std::fmt;

/// The 24 architectural opcodes plus NOP. Integer and floating-point
/// variants share the same mnemonics as the assembly source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Lw,
    Sw,
    Add,
    Addi,
    Sub,
    Subi,
    Xor,
    And,
    Mult,
    Div,
    Beqz,
    Bnez,
    Bltz,
    Bgtz,
    Blez,
    Bgez,
    Jump,
    Eop,
    Lws,
    Sws,
    Adds,
    Subs,
    Mults,
    Divs,
    Nop,
}

/// Reservation-station classes. Load buffers are modeled as a fourth
/// station class rather than a separate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationClass {
    Integer,
    Add,
    Mult,
    Load,
}

impl StationClass {
    pub fn label(&self) -> &'static str {
        match self {
            StationClass::Integer => "Int",
            StationClass::Add => "Add",
            StationClass::Mult => "Mult",
            StationClass::Load => "Load",
        }
    }
}

/// Execution unit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnitKind {
    Integer,
    Adder,
    Multiplier,
    Divider,
    Memory,
}

impl UnitKind {
    pub fn label(&self) -> &'static str {
        match self {
            UnitKind::Integer => "INTEGER",
            UnitKind::Adder => "ADDER",
            UnitKind::Multiplier => "MULTIPLIER",
            UnitKind::Divider => "DIVIDER",
            UnitKind::Memory => "MEMORY",
        }
    }
}

/// Pipeline stages an in-flight instruction moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Issue,
    Execute,
    WriteResult,
    Commit,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Issue => "ISSUE",
            Stage::Execute => "EXE",
            Stage::WriteResult => "WR",
            Stage::Commit => "COMMIT",
        }
    }
}

impl Opcode {
    pub const MNEMONICS: [(&'static str, Opcode); 25] = [
        ("LW", Opcode::Lw),
        ("SW", Opcode::Sw),
        ("ADD", Opcode::Add),
        ("ADDI", Opcode::Addi),
        ("SUB", Opcode::Sub),
        ("SUBI", Opcode::Subi),
        ("XOR", Opcode::Xor),
        ("AND", Opcode::And),
        ("MULT", Opcode::Mult),
        ("DIV", Opcode::Div),
        ("BEQZ", Opcode::Beqz),
        ("BNEZ", Opcode::Bnez),
        ("BLTZ", Opcode::Bltz),
        ("BGTZ", Opcode::Bgtz),
        ("BLEZ", Opcode::Blez),
        ("BGEZ", Opcode::Bgez),
        ("JUMP", Opcode::Jump),
        ("EOP", Opcode::Eop),
        ("LWS", Opcode::Lws),
        ("SWS", Opcode::Sws),
        ("ADDS", Opcode::Adds),
        ("SUBS", Opcode::Subs),
        ("MULTS", Opcode::Mults),
        ("DIVS", Opcode::Divs),
        ("NOP", Opcode::Nop),
    ];

    /// Looks up a (case-sensitive) assembly mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        Self::MNEMONICS
            .iter()
            .find(|(name, _)| *name == mnemonic)
            .map(|(_, op)| *op)
    }

    pub fn mnemonic(&self) -> &'static str {
        Self::MNEMONICS
            .iter()
            .find(|(_, op)| op == self)
            .map(|(name, _)| *name)
            .unwrap_or("?")
    }

    /// Conditional branches and the unconditional JUMP.
    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            Opcode::Beqz
                | Opcode::Bnez
                | Opcode::Bltz
                | Opcode::Bgtz
                | Opcode::Blez
                | Opcode::Bgez
                | Opcode::Jump
        )
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Opcode::Lw | Opcode::Sw | Opcode::Lws | Opcode::Sws)
    }

    pub fn is_load(&self) -> bool {
        matches!(self, Opcode::Lw | Opcode::Lws)
    }

    pub fn is_store(&self) -> bool {
        matches!(self, Opcode::Sw | Opcode::Sws)
    }

    /// Register-register integer ALU forms.
    pub fn is_int_r(&self) -> bool {
        matches!(
            self,
            Opcode::Add | Opcode::Sub | Opcode::Xor | Opcode::And | Opcode::Mult | Opcode::Div
        )
    }

    /// Register-immediate integer ALU forms.
    pub fn is_int_imm(&self) -> bool {
        matches!(self, Opcode::Addi | Opcode::Subi)
    }

    pub fn is_int_alu(&self) -> bool {
        self.is_int_r() || self.is_int_imm()
    }

    pub fn is_fp_alu(&self) -> bool {
        matches!(self, Opcode::Adds | Opcode::Subs | Opcode::Mults | Opcode::Divs)
    }

    /// Reservation-station class required at issue, or None for opcodes
    /// that never enter the window (EOP, NOP).
    pub fn station_class(&self) -> Option<StationClass> {
        match self {
            Opcode::Adds | Opcode::Subs => Some(StationClass::Add),
            Opcode::Mult | Opcode::Div | Opcode::Mults | Opcode::Divs => Some(StationClass::Mult),
            op if op.is_int_alu() || op.is_branch() => Some(StationClass::Integer),
            op if op.is_memory() => Some(StationClass::Load),
            _ => None,
        }
    }

    /// Execution unit kind required at dispatch, or None for opcodes that
    /// never execute.
    pub fn unit_kind(&self) -> Option<UnitKind> {
        match self {
            Opcode::Add | Opcode::Addi | Opcode::Sub | Opcode::Subi | Opcode::Xor | Opcode::And => {
                Some(UnitKind::Integer)
            },
            op if op.is_branch() => Some(UnitKind::Integer),
            op if op.is_memory() => Some(UnitKind::Memory),
            Opcode::Adds | Opcode::Subs => Some(UnitKind::Adder),
            Opcode::Mult | Opcode::Mults => Some(UnitKind::Multiplier),
            Opcode::Div | Opcode::Divs => Some(UnitKind::Divider),
            _ => None,
        }
    }

    /// True when the destination register is a floating-point register.
    pub fn writes_fp_register(&self) -> bool {
        self.is_fp_alu() || *self == Opcode::Lws
    }

    /// True when the destination register is an integer register.
    pub fn writes_int_register(&self) -> bool {
        self.is_int_alu() || *self == Opcode::Lw
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// A decoded assembly instruction. Register numbers keep the meaning of
/// their assembly position: for stores src1 is the value register and src2
/// the base; for loads src1 is the base. The label survives resolution for
/// debugging only; branch displacement lives in `immediate`.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub dest: Option<usize>,
    pub src1: Option<usize>,
    pub src2: Option<usize>,
    pub immediate: Option<u32>,
    pub label: Option<String>,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            dest: None,
            src1: None,
            src2: None,
            immediate: None,
            label: None,
        }
    }

    pub fn nop() -> Self {
        Self::new(Opcode::Nop)
    }

    pub fn eop() -> Self {
        Self::new(Opcode::Eop)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        let bank = |fp: bool| if fp { "F" } else { "R" };
        match self.opcode {
            op if op.is_int_r() || op.is_fp_alu() => write!(
                f,
                " {}{} {}{} {}{}",
                bank(op.is_fp_alu()),
                self.dest.unwrap_or(0),
                bank(op.is_fp_alu()),
                self.src1.unwrap_or(0),
                bank(op.is_fp_alu()),
                self.src2.unwrap_or(0),
            ),
            op if op.is_int_imm() => write!(
                f,
                " R{} R{} {}",
                self.dest.unwrap_or(0),
                self.src1.unwrap_or(0),
                self.immediate.unwrap_or(UNDEFINED),
            ),
            op if op.is_load() => write!(
                f,
                " {}{} {}(R{})",
                bank(op == Opcode::Lws),
                self.dest.unwrap_or(0),
                self.immediate.unwrap_or(UNDEFINED),
                self.src1.unwrap_or(0),
            ),
            op if op.is_store() => write!(
                f,
                " {}{} {}(R{})",
                bank(op == Opcode::Sws),
                self.src1.unwrap_or(0),
                self.immediate.unwrap_or(UNDEFINED),
                self.src2.unwrap_or(0),
            ),
            Opcode::Jump => match &self.label {
                Some(label) => write!(f, " {}", label),
                None => write!(f, " {}", self.immediate.unwrap_or(UNDEFINED) as i32),
            },
            op if op.is_branch() => match &self.label {
                Some(label) => write!(f, " R{} {}", self.src1.unwrap_or(0), label),
                None => write!(
                    f,
                    " R{} {}",
                    self.src1.unwrap_or(0),
                    self.immediate.unwrap_or(UNDEFINED) as i32
                ),
            },
            _ => Ok(()),
        }
    }
}

/// Evaluates an ALU, branch, or jump operation over raw 32-bit operands.
/// Branches return the next fetch address (taken target or fall-through);
/// use `branch_taken` to decide the outcome. Loads and stores are handled
/// by the memory unit, not here.
pub fn alu(opcode: Opcode, value1: u32, value2: u32, immediate: u32, pc: u32) -> u32 {
    match opcode {
        Opcode::Add | Opcode::Addi => value1.wrapping_add(value2),
        Opcode::Sub | Opcode::Subi => value1.wrapping_sub(value2),
        Opcode::Xor => value1 ^ value2,
        Opcode::And => value1 & value2,
        Opcode::Mult => value1.wrapping_mul(value2),
        // A zero divisor is left unspecified by the architecture; latch the
        // sentinel instead of faulting so the batch stays deterministic.
        Opcode::Div => value1.checked_div(value2).unwrap_or(UNDEFINED),
        Opcode::Adds => (f32::from_bits(value1) + f32::from_bits(value2)).to_bits(),
        Opcode::Subs => (f32::from_bits(value1) - f32::from_bits(value2)).to_bits(),
        Opcode::Mults => (f32::from_bits(value1) * f32::from_bits(value2)).to_bits(),
        Opcode::Divs => (f32::from_bits(value1) / f32::from_bits(value2)).to_bits(),
        Opcode::Jump => pc.wrapping_add(4).wrapping_add(immediate),
        op if op.is_branch() => {
            if branch_taken(op, value1) {
                pc.wrapping_add(4).wrapping_add(immediate)
            } else {
                pc.wrapping_add(4)
            }
        },
        _ => UNDEFINED,
    }
}

/// Branch outcome for the signed comparison against zero. JUMP is always
/// taken.
pub fn branch_taken(opcode: Opcode, value1: u32) -> bool {
    let reg = value1 as i32;
    match opcode {
        Opcode::Beqz => reg == 0,
        Opcode::Bnez => reg != 0,
        Opcode::Bltz => reg < 0,
        Opcode::Bgtz => reg > 0,
        Opcode::Blez => reg <= 0,
        Opcode::Bgez => reg >= 0,
        Opcode::Jump => true,
        _ => false,
    }
}
