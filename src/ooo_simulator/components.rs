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

// components.rs
//
// This file contains the microarchitectural storage of the out-of-order
// engine: the circular reorder buffer, the reservation stations and load
// buffers, the execution unit pool, the pending-instruction window, and
// the common data bus.

use crate::isa::instructions::{Stage, StationClass, UnitKind};

/// One reorder-buffer slot. `destination` encodes integer registers as
/// 0..31, floating-point registers as 32..63, and for stores the effective
/// byte address latched at dispatch.
#[derive(Debug, Clone)]
pub struct RobEntry {
    pub pc: Option<u32>,
    pub state: Stage,
    pub ready: bool,
    pub destination: Option<u32>,
    pub value: Option<u32>,
    pub branch_taken: bool,
}

impl RobEntry {
    pub fn new() -> Self {
        Self {
            pc: None,
            state: Stage::Issue,
            ready: false,
            destination: None,
            value: None,
            branch_taken: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_busy(&self) -> bool {
        self.pc.is_some()
    }
}

impl Default for RobEntry {
    fn default() -> Self {
        Self::new()
    }
}

/// Circular reorder buffer. Entries are allocated at the tail and retired
/// at the head; occupancy is tracked with an explicit counter so the ring
/// stays well-defined across wrap-around and flushes.
#[derive(Debug, Clone)]
pub struct ReorderBuffer {
    pub entries: Vec<RobEntry>,
    head: usize,
    tail: usize,
    len: usize,
}

impl ReorderBuffer {
    pub fn new(size: usize) -> Self {
        Self {
            entries: vec![RobEntry::new(); size],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.entries.len()
    }

    pub fn head_index(&self) -> usize {
        self.head
    }

    pub fn tail_index(&self) -> usize {
        self.tail
    }

    /// Allocates the tail slot for a newly issued instruction and returns
    /// its index, or None when the buffer is full.
    pub fn allocate(&mut self, pc: u32) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let index = self.tail;
        let entry = &mut self.entries[index];
        entry.reset();
        entry.pc = Some(pc);
        self.tail = (self.tail + 1) % self.entries.len();
        self.len += 1;
        Some(index)
    }

    /// Frees the head slot after commit.
    pub fn retire(&mut self) {
        debug_assert!(self.len > 0);
        self.entries[self.head].reset();
        self.head = (self.head + 1) % self.entries.len();
        self.len -= 1;
    }

    /// Drops every entry and rewinds the ring (mispredict recovery).
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.reset();
        }
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

/// A reservation station (or load buffer). A tag of None means the paired
/// value has been captured; a Some tag names the reorder-buffer entry the
/// station is waiting on. `destination` is the owning reorder-buffer index.
/// The slot is held from issue until its instruction is handed to an
/// execution unit, which carries the latched result from there on.
#[derive(Debug, Clone)]
pub struct ReservationStation {
    pub class: StationClass,
    pub name: usize,
    pub pc: Option<u32>,
    pub value1: Option<u32>,
    pub value2: Option<u32>,
    pub tag1: Option<usize>,
    pub tag2: Option<usize>,
    pub destination: Option<usize>,
    pub address: Option<u32>,
}

impl ReservationStation {
    pub fn new(class: StationClass, name: usize) -> Self {
        Self {
            class,
            name,
            pc: None,
            value1: None,
            value2: None,
            tag1: None,
            tag2: None,
            destination: None,
            address: None,
        }
    }

    pub fn reset(&mut self) {
        let class = self.class;
        let name = self.name;
        *self = Self::new(class, name);
    }

    pub fn is_free(&self) -> bool {
        self.pc.is_none()
    }

    /// Both operands captured; the slot is waiting for a unit.
    pub fn is_ready(&self) -> bool {
        self.pc.is_some() && self.tag1.is_none() && self.tag2.is_none()
    }
}

/// A pipelined execution unit. The countdown is seeded with latency - 1 at
/// dispatch and decremented at every tick; write-result drains occupied
/// units whose countdown reached 0, which makes a latency-L operation
/// write back L - 1 cycles after dispatch (minimum one) and keeps the unit
/// unavailable through its release cycle.
#[derive(Debug, Clone)]
pub struct FunctionalUnit {
    pub kind: UnitKind,
    pub latency: u32,
    pub remaining: u32,
    pub pc: Option<u32>,
    pub rob_index: Option<usize>,
    pub result: u32,
    pub released_this_cycle: bool,
}

impl FunctionalUnit {
    pub fn new(kind: UnitKind, latency: u32) -> Self {
        Self {
            kind,
            latency,
            remaining: 0,
            pc: None,
            rob_index: None,
            result: 0,
            released_this_cycle: false,
        }
    }

    pub fn is_free(&self) -> bool {
        self.rob_index.is_none() && !self.released_this_cycle
    }

    pub fn is_finished(&self) -> bool {
        self.rob_index.is_some() && self.remaining == 0
    }

    pub fn occupy(&mut self, pc: u32, rob_index: usize, result: u32) {
        self.pc = Some(pc);
        self.rob_index = Some(rob_index);
        self.result = result;
        self.remaining = self.latency.saturating_sub(1);
    }

    /// Start-of-cycle bookkeeping.
    pub fn tick(&mut self) {
        if self.remaining > 0 {
            self.remaining -= 1;
        }
        self.released_this_cycle = false;
    }

    /// Frees the unit at write-result; it cannot be re-acquired until the
    /// next cycle.
    pub fn release(&mut self) {
        self.pc = None;
        self.rob_index = None;
        self.remaining = 0;
        self.released_this_cycle = true;
    }

    pub fn reset(&mut self) {
        self.pc = None;
        self.rob_index = None;
        self.remaining = 0;
        self.result = 0;
        self.released_this_cycle = false;
    }
}

/// Per-ROB-slot record of the cycle each stage was entered; the source of
/// the execution log.
#[derive(Debug, Clone)]
pub struct WindowEntry {
    pub pc: Option<u32>,
    pub issue: Option<u32>,
    pub exe: Option<u32>,
    pub wr: Option<u32>,
    pub commit: Option<u32>,
}

impl WindowEntry {
    pub fn new() -> Self {
        Self {
            pc: None,
            issue: None,
            exe: None,
            wr: None,
            commit: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for WindowEntry {
    fn default() -> Self {
        Self::new()
    }
}

/// The common data bus: a snapshot of the (ROB index, value) pairs produced
/// during the current write-result phase, applied to the waiting stations
/// in a single pass. Each pending tag is a unique ROB index, so multiple
/// same-cycle broadcasts cannot collide.
#[derive(Debug, Clone, Default)]
pub struct CommonDataBus {
    pub broadcasts: Vec<(usize, u32)>,
}

impl CommonDataBus {
    pub fn new() -> Self {
        Self {
            broadcasts: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.broadcasts.clear();
    }

    pub fn push(&mut self, rob_index: usize, value: u32) {
        self.broadcasts.push((rob_index, value));
    }

    /// Wakes up every station waiting on one of the broadcast tags.
    pub fn apply(&self, stations: &mut [ReservationStation]) {
        for &(rob_index, value) in &self.broadcasts {
            for station in stations.iter_mut() {
                if station.tag1 == Some(rob_index) {
                    station.value1 = Some(value);
                    station.tag1 = None;
                }
                if station.tag2 == Some(rob_index) {
                    station.value2 = Some(value);
                    station.tag2 = None;
                }
            }
        }
    }
}
