// simulator.rs
//
// This file contains the cycle driver of the out-of-order engine. Each
// clock cycle runs the stages in a fixed order: tick, COMMIT, WRITE_RESULT,
// EXECUTE dispatch, CDB broadcast, ISSUE. Committing first frees resources
// for dependent issues in the same cycle, and issuing last observes the
// freshest rename state.

use crate::assembler;
use crate::errors::SimulatorError;
use crate::isa::instructions::{
    alu, branch_taken, Instruction, Opcode, Stage, StationClass, UnitKind,
};
use crate::ooo_simulator::components::{
    CommonDataBus, FunctionalUnit, ReorderBuffer, ReservationStation, WindowEntry,
};
use crate::ooo_simulator::config::SimulatorConfig;
use crate::ooo_simulator::memory::DataMemory;
use crate::ooo_simulator::registers::{RegisterFile, NUM_GP_REGISTERS};
use crate::UNDEFINED;
use log::{debug, trace, warn};
use std::fmt;
use std::path::Path;

const DEFAULT_MAX_STEPS: usize = 1_000_000;

/// Cycle-accurate out-of-order scalar processor: reorder buffer,
/// reservation stations and load buffers, pipelined execution units, a
/// static not-taken branch predictor, speculative execution, and in-order
/// commit.
pub struct Simulator {
    pub issue_width: usize,
    pub instr_memory: Vec<Instruction>,
    pub instr_base_address: u32,
    pub registers: RegisterFile,
    pub memory: DataMemory,
    pub rob: ReorderBuffer,
    pub stations: Vec<ReservationStation>,
    pub units: Vec<FunctionalUnit>,
    pub window: Vec<WindowEntry>,
    pub cdb: CommonDataBus,
    pub execution_log: Vec<WindowEntry>,
    pub fetch_index: usize,
    pub last_instruction_pc: Option<u32>,
    pub max_steps: usize,
    finished: bool,
    halted: bool,
    clock_cycles: u32,
    instructions_committed: u32,
    branch_mispredictions: u32,
}

/// Aggregate execution statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorStats {
    pub clock_cycles: u32,
    pub instructions_committed: u32,
    pub branch_mispredictions: u32,
    pub ipc: f32,
}

impl fmt::Display for SimulatorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Execution Statistics:")?;
        writeln!(f, "  Clock Cycles: {}", self.clock_cycles)?;
        writeln!(f, "  Instructions Committed: {}", self.instructions_committed)?;
        writeln!(f, "  Branch Mispredictions: {}", self.branch_mispredictions)?;
        write!(f, "  Instructions Per Cycle (IPC): {:.2}", self.ipc)
    }
}

impl Simulator {
    pub fn new(config: &SimulatorConfig) -> Self {
        let mut stations = Vec::new();
        for (class, count) in [
            (StationClass::Integer, config.num_int_stations),
            (StationClass::Load, config.num_load_buffers),
            (StationClass::Add, config.num_add_stations),
            (StationClass::Mult, config.num_mult_stations),
        ] {
            for name in 0..count {
                stations.push(ReservationStation::new(class, name));
            }
        }

        let mut simulator = Self {
            issue_width: config.issue_width,
            instr_memory: Vec::new(),
            instr_base_address: 0,
            registers: RegisterFile::new(),
            memory: DataMemory::new(config.memory_size),
            rob: ReorderBuffer::new(config.rob_size),
            stations,
            units: Vec::new(),
            window: vec![WindowEntry::new(); config.rob_size],
            cdb: CommonDataBus::new(),
            execution_log: Vec::new(),
            fetch_index: 0,
            last_instruction_pc: None,
            max_steps: DEFAULT_MAX_STEPS,
            finished: false,
            halted: false,
            clock_cycles: 0,
            instructions_committed: 0,
            branch_mispredictions: 0,
        };
        for unit in &config.units {
            simulator.add_execution_units(unit.kind, unit.latency, unit.instances);
        }
        simulator
    }

    /// Adds one or more execution units of the given kind.
    pub fn add_execution_units(&mut self, kind: UnitKind, latency: u32, instances: usize) {
        for _ in 0..instances {
            self.units.push(FunctionalUnit::new(kind, latency.max(1)));
        }
    }

    /// Loads an assembly program file into instruction memory at the given
    /// base address.
    pub fn load_program<P: AsRef<Path>>(
        &mut self,
        path: P,
        base_address: u32,
    ) -> Result<(), SimulatorError> {
        let instructions = assembler::assemble_file(path)?;
        self.install_program(instructions, base_address);
        Ok(())
    }

    /// Assembles a program from source text and loads it.
    pub fn load_program_source(
        &mut self,
        source: &str,
        base_address: u32,
    ) -> Result<(), SimulatorError> {
        let instructions = assembler::assemble(source)?;
        self.install_program(instructions, base_address);
        Ok(())
    }

    fn install_program(&mut self, instructions: Vec<Instruction>, base_address: u32) {
        self.instr_memory = instructions;
        self.instr_base_address = base_address;
        self.fetch_index = 0;
        self.last_instruction_pc = None;
        self.finished = false;
        self.halted = false;
    }

    /// Restores the machine to its post-construction state; the loaded
    /// program is kept.
    pub fn reset(&mut self) {
        self.registers.reset();
        self.memory.reset();
        self.rob.clear();
        for station in &mut self.stations {
            station.reset();
        }
        for unit in &mut self.units {
            unit.reset();
        }
        for entry in &mut self.window {
            entry.reset();
        }
        self.cdb.clear();
        self.execution_log.clear();
        self.fetch_index = 0;
        self.last_instruction_pc = None;
        self.finished = false;
        self.halted = false;
        self.clock_cycles = 0;
        self.instructions_committed = 0;
        self.branch_mispredictions = 0;
    }

    /// Runs the simulator for `cycles` clock cycles, or to completion when
    /// `cycles` is 0.
    pub fn run(&mut self, cycles: u32) -> Result<(), SimulatorError> {
        if cycles == 0 {
            let mut steps = 0usize;
            while !self.halted {
                if steps >= self.max_steps {
                    warn!(
                        "stopping after {} cycles without reaching end of program",
                        steps
                    );
                    break;
                }
                self.step()?;
                steps += 1;
            }
        } else {
            for _ in 0..cycles {
                if self.halted {
                    break;
                }
                self.step()?;
            }
        }
        Ok(())
    }

    /// Advances the machine by one clock cycle.
    pub fn step(&mut self) -> Result<(), SimulatorError> {
        if self.halted {
            return Ok(());
        }
        self.clock_cycles += 1;
        for unit in &mut self.units {
            unit.tick();
        }

        let flushed = self.commit();
        if self.finished {
            // the cycle after the final commit is the halt cycle
            self.clock_cycles += 1;
            self.halted = true;
            debug!("halting at cycle {}", self.clock_cycles);
            return Ok(());
        }
        if flushed {
            return Ok(());
        }

        self.write_result();
        self.execute()?;
        self.cdb.apply(&mut self.stations);
        self.issue();
        Ok(())
    }

    // ------------------------------------------------------------------
    // COMMIT
    // ------------------------------------------------------------------

    /// Retires the reorder-buffer head if it is ready. Returns true when a
    /// mispredicted branch flushed the speculative state.
    fn commit(&mut self) -> bool {
        if self.rob.is_empty() {
            return false;
        }
        let head = self.rob.head_index();
        if !self.rob.entries[head].ready {
            return false;
        }
        let entry = self.rob.entries[head].clone();
        let pc = match entry.pc {
            Some(pc) => pc,
            None => return false,
        };
        let opcode = self.instruction_at(pc).opcode;
        let value = entry.value.unwrap_or(UNDEFINED);

        self.window[head].commit = Some(self.clock_cycles);
        self.instructions_committed += 1;
        debug!(
            "cycle {}: commit ROB[{}] {} pc=0x{:08x}",
            self.clock_cycles, head, opcode, pc
        );

        if opcode.is_branch() && entry.branch_taken {
            // the static predictor said not-taken; throw away the wrong path
            self.branch_mispredictions += 1;
            self.execution_log.push(self.window[head].clone());
            self.flush(value);
            return true;
        }

        if Some(pc) == self.last_instruction_pc {
            self.finished = true;
        }

        if opcode.is_store() {
            let address = entry.destination.unwrap_or(UNDEFINED);
            self.memory.write_word(address, value);
        } else if let Some(destination) = entry.destination {
            let destination = destination as usize;
            if destination < NUM_GP_REGISTERS {
                self.registers.write_int(destination, value);
                self.registers.clear_int_tag_if(destination, head);
            } else {
                let reg = destination - NUM_GP_REGISTERS;
                self.registers.write_fp_bits(reg, value);
                self.registers.clear_fp_tag_if(reg, head);
            }
        }

        self.execution_log.push(self.window[head].clone());
        self.window[head].reset();
        self.rob.retire();
        false
    }

    /// Discards every in-flight instruction and redirects fetch to the
    /// branch target. Runs entirely within the branch's commit.
    fn flush(&mut self, target_pc: u32) {
        debug!(
            "cycle {}: mispredict flush, redirecting fetch to 0x{:08x}",
            self.clock_cycles, target_pc
        );
        self.rob.clear();
        for station in &mut self.stations {
            station.reset();
        }
        for unit in &mut self.units {
            unit.reset();
        }
        for entry in &mut self.window {
            entry.reset();
        }
        self.registers.clear_all_tags();
        self.cdb.clear();
        self.fetch_index =
            (target_pc.wrapping_sub(self.instr_base_address) / 4) as usize;
    }

    // ------------------------------------------------------------------
    // WRITE_RESULT
    // ------------------------------------------------------------------

    /// Drains finished units into the reorder buffer and snapshots the
    /// broadcasts for this cycle's CDB pass.
    fn write_result(&mut self) {
        self.cdb.clear();
        for u in 0..self.units.len() {
            if !self.units[u].is_finished() {
                continue;
            }
            let rob_index = match self.units[u].rob_index {
                Some(index) => index,
                None => continue,
            };
            let result = self.units[u].result;

            let entry = &mut self.rob.entries[rob_index];
            entry.value = Some(result);
            entry.ready = true;
            entry.state = Stage::WriteResult;
            if self.window[rob_index].wr.is_none() {
                self.window[rob_index].wr = Some(self.clock_cycles);
            }
            self.units[u].release();
            self.cdb.push(rob_index, result);
            trace!(
                "cycle {}: write result ROB[{}] = 0x{:08x}",
                self.clock_cycles,
                rob_index,
                result
            );
        }
    }

    // ------------------------------------------------------------------
    // EXECUTE
    // ------------------------------------------------------------------

    /// Dispatches ready stations to free units, oldest instruction first so
    /// that an older memory operation is never starved by a younger one
    /// competing for the same unit. Results are computed eagerly and
    /// latched on the unit for the duration of its latency.
    fn execute(&mut self) -> Result<(), SimulatorError> {
        let mut ready: Vec<usize> = (0..self.stations.len())
            .filter(|&s| self.stations[s].is_ready())
            .collect();
        let head = self.rob.head_index();
        let capacity = self.rob.capacity();
        ready.sort_by_key(|&s| {
            self.stations[s]
                .destination
                .map_or(usize::MAX, |index| (index + capacity - head) % capacity)
        });

        for s in ready {
            let pc = match self.stations[s].pc {
                Some(pc) => pc,
                None => continue,
            };
            let instruction = self.instruction_at(pc).clone();
            let opcode = instruction.opcode;
            let unit_index = match self.get_free_unit(opcode)? {
                Some(index) => index,
                None => continue,
            };
            let rob_index = match self.stations[s].destination {
                Some(index) => index,
                None => continue,
            };
            let immediate = instruction.immediate.unwrap_or(0);
            let value1 = self.stations[s].value1.unwrap_or(UNDEFINED);
            let value2 = self.stations[s].value2.unwrap_or(UNDEFINED);

            let result = if opcode.is_load() {
                let address = value1.wrapping_add(immediate);
                self.memory.read_word(address)
            } else if opcode.is_store() {
                // the write itself waits for commit; only the effective
                // address is latched on the reorder buffer now
                let address = value2.wrapping_add(immediate);
                self.rob.entries[rob_index].destination = Some(address);
                value1
            } else {
                if opcode.is_branch() {
                    self.rob.entries[rob_index].branch_taken = branch_taken(opcode, value1);
                }
                alu(opcode, value1, value2, immediate, pc)
            };

            self.units[unit_index].occupy(pc, rob_index, result);
            // the unit carries the instruction from here; the station frees
            // for a same-cycle issue
            self.stations[s].reset();
            self.rob.entries[rob_index].state = Stage::Execute;
            if self.window[rob_index].exe.is_none() {
                self.window[rob_index].exe = Some(self.clock_cycles);
            }
            trace!(
                "cycle {}: dispatch {} pc=0x{:08x} to unit {}",
                self.clock_cycles,
                opcode,
                pc,
                unit_index
            );
        }
        Ok(())
    }

    /// Returns the lowest-indexed free unit matching the opcode, None when
    /// all are busy, or an error when the configuration lacks the unit kind
    /// entirely.
    pub fn get_free_unit(&self, opcode: Opcode) -> Result<Option<usize>, SimulatorError> {
        if self.units.is_empty() {
            return Err(SimulatorError::NoExecutionUnits);
        }
        let kind = match opcode.unit_kind() {
            Some(kind) => kind,
            None => {
                return Err(SimulatorError::InvalidConfiguration(format!(
                    "opcode {} does not execute on a unit",
                    opcode
                )))
            },
        };
        if !self.units.iter().any(|unit| unit.kind == kind) {
            return Err(SimulatorError::MissingExecutionUnit(kind.label()));
        }
        Ok(self
            .units
            .iter()
            .position(|unit| unit.kind == kind && unit.is_free()))
    }

    // ------------------------------------------------------------------
    // ISSUE
    // ------------------------------------------------------------------

    /// Issues up to `issue_width` instructions from the fetch stream,
    /// stopping at the first structural hazard or at end of program.
    fn issue(&mut self) {
        for _ in 0..self.issue_width {
            if self.finished {
                break;
            }
            let fetch_pc = self
                .instr_base_address
                .wrapping_add((self.fetch_index as u32) * 4);
            let instruction = match self.instr_memory.get(self.fetch_index) {
                Some(instruction) => instruction.clone(),
                None => Instruction::eop(),
            };

            if instruction.opcode == Opcode::Eop {
                if self.last_instruction_pc.is_none() {
                    if self.fetch_index == 0 {
                        // empty program: nothing will ever commit
                        self.finished = true;
                    } else {
                        self.last_instruction_pc = Some(fetch_pc.wrapping_sub(4));
                    }
                }
                break;
            }
            if instruction.opcode == Opcode::Nop {
                self.fetch_index += 1;
                continue;
            }
            let class = match instruction.opcode.station_class() {
                Some(class) => class,
                None => {
                    self.fetch_index += 1;
                    continue;
                },
            };

            if self.rob.is_full() {
                break;
            }
            let station_index = match self
                .stations
                .iter()
                .position(|station| station.class == class && station.is_free())
            {
                Some(index) => index,
                None => break,
            };
            let rob_index = match self.rob.allocate(fetch_pc) {
                Some(index) => index,
                None => break,
            };

            self.issue_into(&instruction, fetch_pc, station_index, rob_index);
            self.fetch_index += 1;
        }
    }

    /// Fills the allocated station and reorder-buffer slot for one
    /// instruction: operand-or-tag capture, destination encoding, rename
    /// tag update, and the window record.
    fn issue_into(
        &mut self,
        instruction: &Instruction,
        fetch_pc: u32,
        station_index: usize,
        rob_index: usize,
    ) {
        let opcode = instruction.opcode;
        let src1 = instruction.src1.unwrap_or(0);
        let src2 = instruction.src2.unwrap_or(0);

        let (value1, tag1, value2, tag2) = match opcode {
            op if op.is_int_r() => {
                let (v1, t1) = self.read_int_operand(src1);
                let (v2, t2) = self.read_int_operand(src2);
                (v1, t1, v2, t2)
            },
            op if op.is_int_imm() => {
                let (v1, t1) = self.read_int_operand(src1);
                (v1, t1, instruction.immediate, None)
            },
            op if op.is_fp_alu() => {
                let (v1, t1) = self.read_fp_operand(src1);
                let (v2, t2) = self.read_fp_operand(src2);
                (v1, t1, v2, t2)
            },
            Opcode::Jump => (None, None, None, None),
            op if op.is_branch() => {
                let (v1, t1) = self.read_int_operand(src1);
                (v1, t1, None, None)
            },
            Opcode::Lw | Opcode::Lws => {
                let (v1, t1) = self.read_int_operand(src1);
                (v1, t1, None, None)
            },
            Opcode::Sw => {
                let (v1, t1) = self.read_int_operand(src1);
                let (v2, t2) = self.read_int_operand(src2);
                (v1, t1, v2, t2)
            },
            Opcode::Sws => {
                let (v1, t1) = self.read_fp_operand(src1);
                let (v2, t2) = self.read_int_operand(src2);
                (v1, t1, v2, t2)
            },
            _ => (None, None, None, None),
        };

        let station = &mut self.stations[station_index];
        station.pc = Some(fetch_pc);
        station.value1 = value1;
        station.value2 = value2;
        station.tag1 = tag1;
        station.tag2 = tag2;
        station.destination = Some(rob_index);
        station.address = if opcode.is_memory() {
            instruction.immediate
        } else {
            None
        };

        let destination = if opcode.writes_int_register() {
            instruction.dest.map(|d| d as u32)
        } else if opcode.writes_fp_register() {
            instruction.dest.map(|d| (d + NUM_GP_REGISTERS) as u32)
        } else {
            None
        };
        self.rob.entries[rob_index].destination = destination;

        if let Some(dest) = instruction.dest {
            if opcode.writes_int_register() {
                self.registers.set_int_tag(dest, rob_index);
            } else if opcode.writes_fp_register() {
                self.registers.set_fp_tag(dest, rob_index);
            }
        }

        let window = &mut self.window[rob_index];
        window.pc = Some(fetch_pc);
        window.issue = Some(self.clock_cycles);
        window.exe = None;
        window.wr = None;
        window.commit = None;

        debug!(
            "cycle {}: issue {} pc=0x{:08x} -> ROB[{}]",
            self.clock_cycles, instruction, fetch_pc, rob_index
        );
    }

    /// Reads an integer source operand: the architectural value when no
    /// rename tag is pending, the in-flight value when its producer is
    /// already ready, or the producer's tag otherwise.
    fn read_int_operand(&self, reg: usize) -> (Option<u32>, Option<usize>) {
        match self.registers.int_tag(reg) {
            Some(tag) => {
                let entry = &self.rob.entries[tag];
                if entry.ready {
                    (entry.value, None)
                } else {
                    (None, Some(tag))
                }
            },
            None => (Some(self.registers.read_int(reg)), None),
        }
    }

    fn read_fp_operand(&self, reg: usize) -> (Option<u32>, Option<usize>) {
        match self.registers.fp_tag(reg) {
            Some(tag) => {
                let entry = &self.rob.entries[tag];
                if entry.ready {
                    (entry.value, None)
                } else {
                    (None, Some(tag))
                }
            },
            None => (Some(self.registers.read_fp_bits(reg)), None),
        }
    }

    // ------------------------------------------------------------------
    // Inspection API
    // ------------------------------------------------------------------

    pub fn instruction_at(&self, pc: u32) -> &Instruction {
        let index = (pc.wrapping_sub(self.instr_base_address) / 4) as usize;
        &self.instr_memory[index]
    }

    pub fn get_int_register(&self, reg: usize) -> u32 {
        self.registers.read_int(reg)
    }

    pub fn set_int_register(&mut self, reg: usize, value: u32) {
        self.registers.write_int(reg, value);
    }

    pub fn get_fp_register(&self, reg: usize) -> f32 {
        self.registers.read_fp(reg)
    }

    pub fn set_fp_register(&mut self, reg: usize, value: f32) {
        self.registers.write_fp(reg, value);
    }

    /// ROB index that will write this integer register, or UNDEFINED.
    pub fn get_int_register_tag(&self, reg: usize) -> u32 {
        self.registers.int_tag_raw(reg)
    }

    /// ROB index that will write this floating-point register, or UNDEFINED.
    pub fn get_fp_register_tag(&self, reg: usize) -> u32 {
        self.registers.fp_tag_raw(reg)
    }

    /// Writes a little-endian word to data memory.
    pub fn write_memory(&mut self, address: u32, value: u32) {
        self.memory.write_word(address, value);
    }

    pub fn read_memory(&self, address: u32) -> u32 {
        self.memory.read_word(address)
    }

    pub fn get_clock_cycles(&self) -> u32 {
        self.clock_cycles
    }

    pub fn get_instructions_committed(&self) -> u32 {
        self.instructions_committed
    }

    pub fn get_branch_mispredictions(&self) -> u32 {
        self.branch_mispredictions
    }

    pub fn get_ipc(&self) -> f32 {
        if self.clock_cycles == 0 {
            0.0
        } else {
            self.instructions_committed as f32 / self.clock_cycles as f32
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn set_max_steps(&mut self, max_steps: usize) {
        self.max_steps = max_steps;
    }

    pub fn stats(&self) -> SimulatorStats {
        SimulatorStats {
            clock_cycles: self.clock_cycles,
            instructions_committed: self.instructions_committed,
            branch_mispredictions: self.branch_mispredictions,
            ipc: self.get_ipc(),
        }
    }
}
