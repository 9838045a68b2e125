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

// assembler.rs
//
// This file contains the assembly loader for the out-of-order simulator.
// One instruction per line, optional leading "label:" token, case-sensitive
// mnemonics. Branch labels are resolved to signed relative displacements
// in a second pass.

use crate::errors::SimulatorError;
use crate::isa::instructions::{Instruction, Opcode};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Parses an assembly source into instruction memory. Parsing stops at the
/// first EOP; anything after it is ignored.
pub fn assemble(source: &str) -> Result<Vec<Instruction>, SimulatorError> {
    let mut instructions = Vec::new();
    let mut labels: HashMap<String, usize> = HashMap::new();

    for (line_index, raw_line) in source.lines().enumerate() {
        let line_nr = line_index + 1;
        let mut line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        // optional leading "label:" token
        if let Some(first) = line.split_whitespace().next() {
            if let Some(label) = first.strip_suffix(':') {
                labels.insert(label.to_string(), instructions.len());
                line = line[first.len()..].trim_start();
                if line.is_empty() {
                    continue;
                }
            }
        }

        let mut tokens = line.split_whitespace();
        let mnemonic = match tokens.next() {
            Some(token) => token,
            None => continue,
        };
        let opcode = Opcode::from_mnemonic(mnemonic)
            .ok_or_else(|| SimulatorError::InvalidOpcode(mnemonic.to_string()))?;

        let operands: Vec<&str> = tokens
            .flat_map(|t| t.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        let instruction = decode_operands(opcode, &operands, line_nr, raw_line)?;
        let is_eop = instruction.opcode == Opcode::Eop;
        instructions.push(instruction);
        if is_eop {
            break;
        }
    }

    resolve_labels(&mut instructions, &labels)?;
    Ok(instructions)
}

/// Loads and assembles a program file.
pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Vec<Instruction>, SimulatorError> {
    let source = fs::read_to_string(path)?;
    assemble(&source)
}

fn decode_operands(
    opcode: Opcode,
    operands: &[&str],
    line_nr: usize,
    raw_line: &str,
) -> Result<Instruction, SimulatorError> {
    let malformed = || SimulatorError::InvalidOperand {
        line: line_nr,
        text: raw_line.trim().to_string(),
    };
    let operand = |index: usize| operands.get(index).copied().ok_or_else(malformed);

    let mut instruction = Instruction::new(opcode);
    match opcode {
        // OP Rd, Rs, Rt
        op if op.is_int_r() || op.is_fp_alu() => {
            instruction.dest = Some(parse_register(operand(0)?).ok_or_else(malformed)?);
            instruction.src1 = Some(parse_register(operand(1)?).ok_or_else(malformed)?);
            instruction.src2 = Some(parse_register(operand(2)?).ok_or_else(malformed)?);
        },
        // OP Rd, Rs, imm
        op if op.is_int_imm() => {
            instruction.dest = Some(parse_register(operand(0)?).ok_or_else(malformed)?);
            instruction.src1 = Some(parse_register(operand(1)?).ok_or_else(malformed)?);
            instruction.immediate = Some(parse_immediate(operand(2)?).ok_or_else(malformed)?);
        },
        // OP Rd, imm(Rs)
        op if op.is_load() => {
            instruction.dest = Some(parse_register(operand(0)?).ok_or_else(malformed)?);
            let (offset, base) = parse_memory_operand(operand(1)?).ok_or_else(malformed)?;
            instruction.immediate = Some(offset);
            instruction.src1 = Some(base);
        },
        // OP Rs, imm(Rt) -- Rs is the value, Rt the base
        op if op.is_store() => {
            instruction.src1 = Some(parse_register(operand(0)?).ok_or_else(malformed)?);
            let (offset, base) = parse_memory_operand(operand(1)?).ok_or_else(malformed)?;
            instruction.immediate = Some(offset);
            instruction.src2 = Some(base);
        },
        // OP Rs, label
        Opcode::Beqz | Opcode::Bnez | Opcode::Bltz | Opcode::Bgtz | Opcode::Blez | Opcode::Bgez => {
            instruction.src1 = Some(parse_register(operand(0)?).ok_or_else(malformed)?);
            instruction.label = Some(operand(1)?.to_string());
        },
        // JUMP label
        Opcode::Jump => {
            instruction.label = Some(operand(0)?.to_string());
        },
        Opcode::Eop | Opcode::Nop => {},
        _ => return Err(malformed()),
    }
    Ok(instruction)
}

/// Resolves branch labels into signed relative displacements, measured from
/// the instruction after the branch in units of bytes.
fn resolve_labels(
    instructions: &mut [Instruction],
    labels: &HashMap<String, usize>,
) -> Result<(), SimulatorError> {
    for (index, instruction) in instructions.iter_mut().enumerate() {
        if !instruction.opcode.is_branch() {
            continue;
        }
        let label = match &instruction.label {
            Some(label) => label,
            None => continue,
        };
        let target = labels
            .get(label)
            .ok_or_else(|| SimulatorError::UnresolvedLabel(label.clone()))?;
        let displacement = (*target as i64 - index as i64 - 1) * 4;
        instruction.immediate = Some(displacement as i32 as u32);
    }
    Ok(())
}

/// Parses an "R<n>" or "F<n>" register token.
fn parse_register(token: &str) -> Option<usize> {
    let number = token.strip_prefix('R').or_else(|| token.strip_prefix('F'))?;
    let register = number.parse::<usize>().ok()?;
    if register < 32 {
        Some(register)
    } else {
        None
    }
}

/// Parses a base-0 immediate: 0x-prefixed hex, 0-prefixed octal, decimal.
/// A leading minus wraps into the unsigned representation.
fn parse_immediate(token: &str) -> Option<u32> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        u32::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    Some(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

/// Parses an "imm(Rbase)" addressing operand.
fn parse_memory_operand(token: &str) -> Option<(u32, usize)> {
    let open = token.find('(')?;
    let close = token.rfind(')')?;
    if close <= open || close != token.len() - 1 {
        return None;
    }
    let offset = parse_immediate(&token[..open])?;
    let base = parse_register(&token[open + 1..close])?;
    Some((offset, base))
}
