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

// config.rs
//
// This file contains the configuration structs for the out-of-order
// simulator: data-memory size, reorder-buffer size, per-class reservation
// station counts, issue width, and the execution unit pool.

use crate::errors::SimulatorError;
use crate::isa::instructions::UnitKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConfig {
    pub kind: UnitKind,
    pub latency: u32,
    pub instances: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub memory_size: usize,
    pub rob_size: usize,
    pub num_int_stations: usize,
    pub num_add_stations: usize,
    pub num_mult_stations: usize,
    pub num_load_buffers: usize,
    pub issue_width: usize,
    pub units: Vec<UnitConfig>,
}

impl SimulatorConfig {
    pub fn new(
        memory_size: usize,
        rob_size: usize,
        num_int_stations: usize,
        num_add_stations: usize,
        num_mult_stations: usize,
        num_load_buffers: usize,
    ) -> Self {
        // Validate configuration
        assert!(memory_size > 0, "Data memory size must be positive");
        assert!(rob_size > 0, "Reorder buffer size must be positive");

        Self {
            memory_size,
            rob_size,
            num_int_stations,
            num_add_stations,
            num_mult_stations,
            num_load_buffers,
            issue_width: 1,
            units: Vec::new(),
        }
    }

    pub fn with_issue_width(mut self, width: usize) -> Self {
        assert!(width > 0, "Issue width must be positive");
        self.issue_width = width;
        self
    }

    pub fn with_unit(mut self, kind: UnitKind, latency: u32, instances: usize) -> Self {
        assert!(latency > 0, "Unit latency must be positive");
        self.units.push(UnitConfig {
            kind,
            latency,
            instances,
        });
        self
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SimulatorError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|err| SimulatorError::InvalidConfiguration(err.to_string()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new(1024 * 1024, 8, 2, 2, 2, 2)
            .with_unit(UnitKind::Integer, 1, 1)
            .with_unit(UnitKind::Adder, 3, 1)
            .with_unit(UnitKind::Multiplier, 5, 1)
            .with_unit(UnitKind::Divider, 10, 1)
            .with_unit(UnitKind::Memory, 2, 1)
    }
}
