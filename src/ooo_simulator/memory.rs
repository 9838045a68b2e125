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

// memory.rs
//
// This file contains the data memory: a flat little-endian byte array of
// the configured size, initialized to 0xFF. Word accesses move 4 bytes.
// Out-of-range accesses read the UNDEFINED sentinel and drop writes.

use crate::UNDEFINED;

#[derive(Debug, Clone)]
pub struct DataMemory {
    pub data: Vec<u8>,
}

impl DataMemory {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0xFF; size],
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn reset(&mut self) {
        self.data.fill(0xFF);
    }

    pub fn read_byte(&self, address: u32) -> u8 {
        self.data.get(address as usize).copied().unwrap_or(0xFF)
    }

    pub fn read_word(&self, address: u32) -> u32 {
        let start = address as usize;
        if start + 4 > self.data.len() {
            return UNDEFINED;
        }
        u32::from_le_bytes([
            self.data[start],
            self.data[start + 1],
            self.data[start + 2],
            self.data[start + 3],
        ])
    }

    pub fn write_word(&mut self, address: u32, value: u32) {
        let start = address as usize;
        if start + 4 > self.data.len() {
            log::warn!(
                "dropping out-of-range memory write at 0x{:08x} (size {})",
                address,
                self.data.len()
            );
            return;
        }
        self.data[start..start + 4].copy_from_slice(&value.to_le_bytes());
    }
}
