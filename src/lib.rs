pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use anyhow::{Context, bail};
use clap::Parser;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let config = args.config();

    if !config.runtime.is_file() {
        bail!("runtime support file {} not found", config.runtime.display());
    }

    // 1. ── Parse ──────────────────────────────────────────────────────
    let json = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Reading {}", args.input.display()))?;
    let doc = parser::load_from_json(&json).with_context(|| "Parsing input JSON")?;

    // 2. ── Process ────────────────────────────────────────────────────
    let processed =
        processor::run(&doc, &config).with_context(|| "Compiling game document")?;

    // 3. ── Write outputs ──────────────────────────────────────────────
    std::fs::create_dir_all(&config.output)
        .with_context(|| format!("Creating {}", config.output.display()))?;

    writer::lua::emit(&processed, &config.output, &config.runtime)
        .with_context(|| "Writing Lua program")?;
    writer::png::emit(&processed, &config.output).with_context(|| "Writing sprite sheets")?;

    for msg in &processed.diagnostics {
        log::warn!("--{}", msg);
    }
    log::info!("files written to {}", config.output.display());

    Ok(())
}
