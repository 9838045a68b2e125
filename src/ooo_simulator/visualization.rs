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

// visualization.rs
//
// This file contains the presentation-only state dumps: registers, data
// memory ranges, the reorder buffer, the reservation stations, the pending
// instruction window, and the commit-ordered execution log. None of these
// participate in the core scheduling contract.

use crate::isa::instructions::Opcode;
use crate::ooo_simulator::components::WindowEntry;
use crate::ooo_simulator::registers::NUM_GP_REGISTERS;
use crate::ooo_simulator::simulator::Simulator;
use crate::UNDEFINED;

fn hex_or_dash(value: Option<u32>) -> String {
    match value {
        Some(v) => format!("0x{:08x}", v),
        None => "-".to_string(),
    }
}

fn dec_or_dash(value: Option<u32>) -> String {
    match value {
        Some(v) => format!("{}", v),
        None => "-".to_string(),
    }
}

fn tag_or_dash(tag: Option<usize>) -> String {
    match tag {
        Some(t) => format!("{}", t),
        None => "-".to_string(),
    }
}

fn window_row(entry: &WindowEntry) -> String {
    format!(
        "{:>10}{:>7}{:>7}{:>7}{:>7}\n",
        hex_or_dash(entry.pc),
        dec_or_dash(entry.issue),
        dec_or_dash(entry.exe),
        dec_or_dash(entry.wr),
        dec_or_dash(entry.commit),
    )
}

impl Simulator {
    /// Renders the registers that carry a value or a pending ROB tag.
    pub fn dump_registers(&self) -> String {
        let mut result = String::new();
        result.push_str("GENERAL PURPOSE REGISTERS\n");
        result.push_str(&format!("{:>8}{:>22}{:>6}\n", "Register", "Value", "ROB"));
        for reg in 0..NUM_GP_REGISTERS {
            if let Some(tag) = self.registers.int_tag(reg) {
                result.push_str(&format!("{:>8}{:>22}{:>6}\n", format!("R{}", reg), "-", tag));
            } else if self.registers.read_int(reg) != UNDEFINED {
                let value = self.registers.read_int(reg);
                result.push_str(&format!(
                    "{:>8}{:>22}{:>6}\n",
                    format!("R{}", reg),
                    format!("{}/0x{:08x}", value as i32, value),
                    "-"
                ));
            }
        }
        for reg in 0..NUM_GP_REGISTERS {
            if let Some(tag) = self.registers.fp_tag(reg) {
                result.push_str(&format!("{:>8}{:>22}{:>6}\n", format!("F{}", reg), "-", tag));
            } else if self.registers.read_fp_bits(reg) != UNDEFINED {
                let bits = self.registers.read_fp_bits(reg);
                result.push_str(&format!(
                    "{:>8}{:>22}{:>6}\n",
                    format!("F{}", reg),
                    format!("{}/0x{:08x}", f32::from_bits(bits), bits),
                    "-"
                ));
            }
        }
        result
    }

    /// Renders a byte range of the data memory, one word per line.
    pub fn dump_memory(&self, start_address: u32, end_address: u32) -> String {
        let mut result = format!(
            "DATA MEMORY[0x{:08x}:0x{:08x}]\n",
            start_address, end_address
        );
        let mut address = start_address;
        while address < end_address {
            result.push_str(&format!("0x{:08x}:", address));
            for offset in 0..4 {
                if address + offset < end_address {
                    result.push_str(&format!(" {:02x}", self.memory.read_byte(address + offset)));
                }
            }
            result.push('\n');
            address += 4;
        }
        result
    }

    /// Renders every reorder-buffer slot, occupied or not.
    pub fn dump_rob(&self) -> String {
        let mut result = String::new();
        result.push_str("REORDER BUFFER\n");
        result.push_str(&format!(
            "{:>5}{:>6}{:>7}{:>12}{:>8}{:>7}{:>12}\n",
            "Entry", "Busy", "Ready", "PC", "State", "Dest", "Value"
        ));
        for (index, entry) in self.rob.entries.iter().enumerate() {
            let busy = if entry.is_busy() { "yes" } else { "no" };
            let ready = if entry.ready { "yes" } else { "no" };
            let state = if entry.is_busy() { entry.state.label() } else { "-" };
            let dest = match (entry.pc, entry.destination) {
                (Some(pc), Some(destination)) => {
                    let opcode = self.instruction_at(pc).opcode;
                    if opcode.is_store() {
                        format!("{}", destination)
                    } else if (destination as usize) < NUM_GP_REGISTERS {
                        format!("R{}", destination)
                    } else {
                        format!("F{}", destination as usize - NUM_GP_REGISTERS)
                    }
                },
                _ => "-".to_string(),
            };
            result.push_str(&format!(
                "{:>5}{:>6}{:>7}{:>12}{:>8}{:>7}{:>12}\n",
                index,
                busy,
                ready,
                hex_or_dash(entry.pc),
                state,
                dest,
                hex_or_dash(entry.value),
            ));
        }
        result
    }

    /// Renders the reservation stations and load buffers.
    pub fn dump_reservation_stations(&self) -> String {
        let mut result = String::new();
        result.push_str("RESERVATION STATIONS\n");
        result.push_str(&format!(
            "{:>7}{:>6}{:>12}{:>12}{:>12}{:>6}{:>6}{:>6}{:>12}\n",
            "Name", "Busy", "PC", "Vj", "Vk", "Qj", "Qk", "Dest", "Address"
        ));
        for station in &self.stations {
            let name = format!("{}{}", station.class.label(), station.name + 1);
            let busy = if station.is_free() { "no" } else { "yes" };
            result.push_str(&format!(
                "{:>7}{:>6}{:>12}{:>12}{:>12}{:>6}{:>6}{:>6}{:>12}\n",
                name,
                busy,
                hex_or_dash(station.pc),
                hex_or_dash(station.value1),
                hex_or_dash(station.value2),
                tag_or_dash(station.tag1),
                tag_or_dash(station.tag2),
                tag_or_dash(station.destination),
                hex_or_dash(station.address),
            ));
        }
        result
    }

    /// Renders the pending-instruction window.
    pub fn dump_pending_instructions(&self) -> String {
        let mut result = String::new();
        result.push_str("PENDING INSTRUCTIONS STATUS\n");
        result.push_str(&format!(
            "{:>10}{:>7}{:>7}{:>7}{:>7}\n",
            "PC", "Issue", "Exe", "WR", "Commit"
        ));
        for entry in &self.window {
            result.push_str(&window_row(entry));
        }
        result
    }

    /// Renders the commit-ordered execution log.
    pub fn dump_log(&self) -> String {
        let mut result = String::new();
        result.push_str("EXECUTION LOG\n");
        result.push_str(&format!(
            "{:>10}{:>7}{:>7}{:>7}{:>7}\n",
            "PC", "Issue", "Exe", "WR", "Commit"
        ));
        for entry in &self.execution_log {
            result.push_str(&window_row(entry));
        }
        result
    }

    /// Renders the full processor status excluding the data memory.
    pub fn dump_status(&self) -> String {
        let mut result = String::new();
        result.push_str(&self.dump_pending_instructions());
        result.push('\n');
        result.push_str(&self.dump_rob());
        result.push('\n');
        result.push_str(&self.dump_reservation_stations());
        result.push('\n');
        result.push_str(&self.dump_registers());
        result
    }

    /// Renders the program with one instruction per line.
    pub fn dump_program(&self) -> String {
        let mut result = String::new();
        for (index, instruction) in self.instr_memory.iter().enumerate() {
            let pc = self.instr_base_address + (index as u32) * 4;
            result.push_str(&format!("0x{:08x}: {}\n", pc, instruction));
            if instruction.opcode == Opcode::Eop {
                break;
            }
        }
        result
    }
}
