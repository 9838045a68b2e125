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

// registers.rs
//
// This file contains the register file and rename map. It manages the 32
// integer and 32 floating-point registers (stored as raw 32-bit patterns)
// plus one rename tag per register naming the reorder-buffer entry that
// will produce the register's next value.

use crate::UNDEFINED;

pub const NUM_GP_REGISTERS: usize = 32;

#[derive(Debug, Clone)]
pub struct RegisterFile {
    pub int_values: [u32; NUM_GP_REGISTERS],
    pub fp_values: [u32; NUM_GP_REGISTERS],
    pub int_tags: [Option<usize>; NUM_GP_REGISTERS],
    pub fp_tags: [Option<usize>; NUM_GP_REGISTERS],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    /// All registers start at the UNDEFINED bit pattern with no pending tag.
    pub fn new() -> Self {
        Self {
            int_values: [UNDEFINED; NUM_GP_REGISTERS],
            fp_values: [UNDEFINED; NUM_GP_REGISTERS],
            int_tags: [None; NUM_GP_REGISTERS],
            fp_tags: [None; NUM_GP_REGISTERS],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn read_int(&self, reg: usize) -> u32 {
        self.int_values[reg]
    }

    pub fn write_int(&mut self, reg: usize, value: u32) {
        self.int_values[reg] = value;
    }

    pub fn read_fp_bits(&self, reg: usize) -> u32 {
        self.fp_values[reg]
    }

    pub fn write_fp_bits(&mut self, reg: usize, value: u32) {
        self.fp_values[reg] = value;
    }

    pub fn read_fp(&self, reg: usize) -> f32 {
        f32::from_bits(self.fp_values[reg])
    }

    pub fn write_fp(&mut self, reg: usize, value: f32) {
        self.fp_values[reg] = value.to_bits();
    }

    pub fn int_tag(&self, reg: usize) -> Option<usize> {
        self.int_tags[reg]
    }

    pub fn fp_tag(&self, reg: usize) -> Option<usize> {
        self.fp_tags[reg]
    }

    pub fn set_int_tag(&mut self, reg: usize, rob_index: usize) {
        self.int_tags[reg] = Some(rob_index);
    }

    pub fn set_fp_tag(&mut self, reg: usize, rob_index: usize) {
        self.fp_tags[reg] = Some(rob_index);
    }

    /// Clears the tag only while it still names the committing entry; a
    /// younger in-flight writer keeps its own tag in place.
    pub fn clear_int_tag_if(&mut self, reg: usize, rob_index: usize) {
        if self.int_tags[reg] == Some(rob_index) {
            self.int_tags[reg] = None;
        }
    }

    pub fn clear_fp_tag_if(&mut self, reg: usize, rob_index: usize) {
        if self.fp_tags[reg] == Some(rob_index) {
            self.fp_tags[reg] = None;
        }
    }

    pub fn clear_all_tags(&mut self) {
        self.int_tags = [None; NUM_GP_REGISTERS];
        self.fp_tags = [None; NUM_GP_REGISTERS];
    }

    /// Sentinel-mapped tag views for the inspection boundary.
    pub fn int_tag_raw(&self, reg: usize) -> u32 {
        self.int_tags[reg].map_or(UNDEFINED, |t| t as u32)
    }

    pub fn fp_tag_raw(&self, reg: usize) -> u32 {
        self.fp_tags[reg].map_or(UNDEFINED, |t| t as u32)
    }
}
