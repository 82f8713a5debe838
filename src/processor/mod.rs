//! The functional core: document in, program text and images out.
//!
//! Nothing here touches the filesystem, so every fatal error surfaces
//! before a single output file exists.
pub mod assembler;
pub mod context;
pub mod entities;
pub mod events;
pub mod frames;
pub mod lua;
pub mod mimic;
pub mod scripts;
pub mod strips;
pub mod variables;

use anyhow::{Context, Result};

use crate::config::CompilerConfig;
use crate::model::{Document, ProcessedProject};
use context::CompileContext;
use events::{BlockCompiler, EventCompiler};

/// Runs every processing pass with the stock event compiler.
pub fn run(doc: &Document, config: &CompilerConfig) -> Result<ProcessedProject> {
    run_with(doc, config, &mut BlockCompiler)
}

/// Runs every processing pass and returns a read-only structure for writers.
pub fn run_with<C: EventCompiler>(
    doc: &Document,
    config: &CompilerConfig,
    compiler: &mut C,
) -> Result<ProcessedProject> {
    // 1. ── Frames & sprite sheets ─────────────────────────────────────
    let packed = frames::pack(&doc.frames);
    let tiles_img = strips::frame_strip(&packed).with_context(|| "Rendering tile frames")?;
    let pipe_img = strips::glyph_strip(&doc.font.pipe).with_context(|| "Rendering border")?;
    let font_img = strips::glyph_strip(&doc.font.chars).with_context(|| "Rendering font")?;

    // 2. ── Entity tables ──────────────────────────────────────────────
    let mut ctx = CompileContext::new();
    let mut sections = assembler::Sections::default();
    entities::emit_tiles(&mut sections.tiles, &doc.tiles, &packed, &mut ctx)
        .with_context(|| "Serializing tiles")?;
    entities::emit_rooms(&mut sections.rooms, &doc.rooms).with_context(|| "Serializing rooms")?;
    entities::emit_sounds(&mut sections.sounds, &doc.sounds)
        .with_context(|| "Serializing sounds")?;

    // 3. ── Scripts (accumulate usages, then seal) ─────────────────────
    sections.scripts = scripts::compile_scripts(doc, compiler, &mut ctx)
        .with_context(|| "Compiling scripts")?;
    let ctx = ctx.seal();

    // 4. ── Whole-program passes ───────────────────────────────────────
    let variables = variables::allocate(&ctx, config.fast_slots)
        .with_context(|| "Allocating variables")?;
    variables.emit_declarations(&mut sections.declarations)?;
    variables.emit_accessors(&mut sections.accessors)?;
    mimic::emit_mimics(&mut sections.mimics, &ctx, config.mimic_cycle_passes)?;

    let program = assembler::assemble(doc, &sections)?;

    Ok(ProcessedProject {
        program,
        tiles_img,
        pipe_img,
        font_img,
        variables,
        diagnostics: ctx.diagnostics(),
    })
}
