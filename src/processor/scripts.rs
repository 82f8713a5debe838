//! Script registration and per-event compilation.

use std::fmt::Write;

use serde_json::Value;

use crate::error::{CompileError, CompileResult};
use crate::model::{Document, ScriptEntry, ScriptKind};
use crate::processor::context::CompileContext;
use crate::processor::events::{EventCompiler, parse_block_ref};
use crate::processor::lua::{RESERVED_PREFIX, is_token, quote};

/// Key of the shared block array inside a script's `data`.
const BLOCKS_KEY: &str = "__blocks";

/// A registered script; `code` holds everything after its section header.
#[derive(Debug, Clone)]
pub struct CompiledScript {
    pub name: String,
    pub code: String,
}

/// Compile every script in declaration order.
pub fn compile_scripts<C: EventCompiler>(
    doc: &Document,
    compiler: &mut C,
    ctx: &mut CompileContext,
) -> CompileResult<Vec<CompiledScript>> {
    let mut compiled = Vec::<CompiledScript>::with_capacity(doc.scripts.len());
    for entry in &doc.scripts {
        compiled.push(compile_script(doc, entry, compiler, ctx)?);
    }
    log::info!("Compiled {} scripts", compiled.len());
    Ok(compiled)
}

fn compile_script<C: EventCompiler>(
    doc: &Document,
    entry: &ScriptEntry,
    compiler: &mut C,
    ctx: &mut CompileContext,
) -> CompileResult<CompiledScript> {
    let kind = ScriptKind::from_raw(entry.kind).ok_or(CompileError::UnknownScriptType(entry.kind))?;
    let name = script_name(doc, kind, entry.id, ctx);

    let mut code = String::new();
    writeln!(code, "__pulp:newScript({})", quote(&name))?;
    // dotted or keyword names are only reachable through getScript
    if is_token(&name) {
        writeln!(code, "{name} = __pulp:getScript({})", quote(&name))?;
    }
    writeln!(
        code,
        "__pulp:associateScript({}, {}, {})",
        quote(&name),
        quote(kind.as_str()),
        entry.id
    )?;

    let empty = serde_json::Map::new();
    let data = entry.data.as_ref().unwrap_or(&empty);
    let blocks: &[Value] = data
        .get(BLOCKS_KEY)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut events = 0;
    for (key, value) in data {
        if key.starts_with(RESERVED_PREFIX) {
            continue;
        }
        let root = parse_block_ref(value).ok_or_else(|| CompileError::MalformedEvent {
            script: name.clone(),
            event: key.clone(),
        })?;
        let body = compiler.compile_event(&name, key, blocks, root, ctx)?;
        write!(code, "\n{body}")?;
        events += 1;
    }

    log::debug!("script `{}`: {} events", name, events);
    Ok(CompiledScript { name, code })
}

/// Display name of a script: "game", or its owning room / tile name.
///
/// Owners are looked up by list position. Unknown owners get a placeholder
/// and a diagnostic.
pub fn script_name(doc: &Document, kind: ScriptKind, id: i64, ctx: &mut CompileContext) -> String {
    let slot = usize::try_from(id).ok();
    let found = match kind {
        ScriptKind::Global if id == 0 => Some("game".to_string()),
        ScriptKind::Global => None,
        ScriptKind::Room => slot
            .and_then(|i| doc.rooms.get(i))
            .and_then(Option::as_ref)
            .map(|room| room.name.clone()),
        ScriptKind::Tile => slot
            .and_then(|i| doc.tiles.get(i))
            .and_then(Option::as_ref)
            .map(|tile| tile.name.clone()),
    };

    found.unwrap_or_else(|| {
        let raw = kind as u8;
        ctx.error(format!("unknown script, type {raw}, id {id}"));
        format!("__UNKNOWN_SCRIPT_{raw}_{id}")
    })
}
