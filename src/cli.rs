use clap::Parser;
use std::path::PathBuf;

use crate::config::{CompilerConfig, FAST_SLOTS, FAST_SLOTS_MAX, MIMIC_CYCLE_PASSES};

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile a Pulp game document into a Playdate Lua program")]
pub struct Cli {
    /// Input pulp .json document
    pub input: PathBuf,
    /// Output directory
    #[arg(default_value = "out")]
    pub output: PathBuf,
    /// Runtime support module copied next to main.lua
    #[arg(long, default_value = "pulp.lua")]
    pub runtime: PathBuf,
    /// Number of variables stored as Lua locals
    #[arg(long, default_value_t = FAST_SLOTS, value_parser = parse_fast_slots)]
    pub fast_slots: usize,
}

impl Cli {
    pub fn config(&self) -> CompilerConfig {
        CompilerConfig {
            fast_slots: self.fast_slots,
            mimic_cycle_passes: MIMIC_CYCLE_PASSES,
            runtime: self.runtime.clone(),
            output: self.output.clone(),
        }
    }
}

fn parse_fast_slots(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("{e}"))?;
    if n == 0 || n > FAST_SLOTS_MAX {
        return Err(format!("must be between 1 and {FAST_SLOTS_MAX}"));
    }
    Ok(n)
}
