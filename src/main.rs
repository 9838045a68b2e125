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

// main.rs
//
// This file contains the command-line entry point. It builds a simulator
// from flags or a JSON configuration file, loads an assembly program, runs
// it, and prints the requested state dumps and statistics.

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tomasulo_rust::isa::instructions::UnitKind;
use tomasulo_rust::ooo_simulator::config::SimulatorConfig;
use tomasulo_rust::{Simulator, SimulatorError};

#[derive(Parser)]
#[command(name = "tomasulo_rust")]
#[command(about = "A cycle-accurate out-of-order processor simulator")]
#[command(version)]
struct Cli {
    /// Input assembly program
    program: PathBuf,

    /// Base address where the program is loaded (0x-prefixed hex accepted)
    #[arg(long, default_value = "0", value_parser = parse_number)]
    base_address: u32,

    /// JSON configuration file; overrides the sizing flags below
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data memory size in bytes
    #[arg(long, default_value_t = 1024 * 1024)]
    memory_size: usize,

    /// Number of reorder buffer entries
    #[arg(long, default_value_t = 8)]
    rob_size: usize,

    /// Number of integer reservation stations
    #[arg(long, default_value_t = 2)]
    int_stations: usize,

    /// Number of FP add reservation stations
    #[arg(long, default_value_t = 2)]
    add_stations: usize,

    /// Number of mult/div reservation stations
    #[arg(long, default_value_t = 2)]
    mult_stations: usize,

    /// Number of load buffers
    #[arg(long, default_value_t = 2)]
    load_buffers: usize,

    /// Instructions issued per cycle
    #[arg(long, default_value_t = 1)]
    issue_width: usize,

    /// Execution unit as KIND:LATENCY:COUNT, e.g. MULTIPLIER:10:1
    /// (repeatable; a standard set of all five kinds is used when omitted)
    #[arg(long = "unit")]
    units: Vec<String>,

    /// Clock cycles to run (0 = run to completion)
    #[arg(long, default_value_t = 0)]
    cycles: u32,

    /// Print the full processor status after the run
    #[arg(long)]
    status: bool,

    /// Print the commit-ordered execution log after the run
    #[arg(long)]
    log: bool,

    /// Print a data memory range as START:END after the run
    #[arg(long)]
    memory: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

fn parse_number(text: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        text.parse::<u32>()
    };
    parsed.map_err(|err| format!("invalid number {:?}: {}", text, err))
}

fn parse_unit_spec(spec: &str) -> Result<(UnitKind, u32, usize), String> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("expected KIND:LATENCY:COUNT, got {:?}", spec));
    }
    let kind = match parts[0] {
        "INTEGER" => UnitKind::Integer,
        "ADDER" => UnitKind::Adder,
        "MULTIPLIER" => UnitKind::Multiplier,
        "DIVIDER" => UnitKind::Divider,
        "MEMORY" => UnitKind::Memory,
        other => return Err(format!("unknown unit kind {:?}", other)),
    };
    let latency = parse_number(parts[1])?;
    let count = parts[2]
        .parse::<usize>()
        .map_err(|err| format!("invalid unit count {:?}: {}", parts[2], err))?;
    Ok((kind, latency, count))
}

fn build_config(cli: &Cli) -> Result<SimulatorConfig, String> {
    if let Some(path) = &cli.config {
        return SimulatorConfig::from_json_file(path).map_err(|err| err.to_string());
    }

    let mut config = SimulatorConfig::new(
        cli.memory_size,
        cli.rob_size,
        cli.int_stations,
        cli.add_stations,
        cli.mult_stations,
        cli.load_buffers,
    )
    .with_issue_width(cli.issue_width);

    if cli.units.is_empty() {
        config = config
            .with_unit(UnitKind::Integer, 1, 1)
            .with_unit(UnitKind::Adder, 3, 1)
            .with_unit(UnitKind::Multiplier, 5, 1)
            .with_unit(UnitKind::Divider, 10, 1)
            .with_unit(UnitKind::Memory, 2, 1);
    } else {
        for spec in &cli.units {
            let (kind, latency, count) = parse_unit_spec(spec)?;
            config = config.with_unit(kind, latency, count);
        }
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = build_config(cli)?;
    let mut simulator = Simulator::new(&config);

    simulator
        .load_program(&cli.program, cli.base_address)
        .map_err(|err: SimulatorError| err.to_string())?;

    println!("{}", "PROGRAM".bold());
    print!("{}", simulator.dump_program());
    println!();

    simulator.run(cli.cycles).map_err(|err| err.to_string())?;

    if cli.status {
        print!("{}", simulator.dump_status());
        println!();
    }
    if cli.log {
        print!("{}", simulator.dump_log());
        println!();
    }
    if let Some(range) = &cli.memory {
        let parts: Vec<&str> = range.split(':').collect();
        if parts.len() != 2 {
            return Err(format!("expected START:END memory range, got {:?}", range));
        }
        let start = parse_number(parts[0])?;
        let end = parse_number(parts[1])?;
        print!("{}", simulator.dump_memory(start, end));
        println!();
    }

    println!("{}", simulator.stats());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(match cli.log_level.as_str() {
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Warn,
        })
        .init();

    if let Err(message) = run(&cli) {
        eprintln!("{} {}", "error:".red().bold(), message);
        process::exit(1);
    }
}
