//! Tiles, rooms and sounds as sparse Lua tables keyed by id.
//!
//! Optional fields are left out entirely when the document omits them.

use std::fmt::Write;

use crate::error::CompileResult;
use crate::model::{Exit, ROOM_H, ROOM_W, Room, Sound, Tile};
use crate::processor::context::CompileContext;
use crate::processor::frames::PackedFrames;
use crate::processor::lua::{long_string, number, quote};

/// Emit `__pulp.tiles` and register every tile name for script lookups.
pub fn emit_tiles<W: Write>(
    w: &mut W,
    tiles: &[Option<Tile>],
    packed: &PackedFrames,
    ctx: &mut CompileContext,
) -> CompileResult<()> {
    writeln!(w, "\n__pulp.tiles = {{}}")?;
    for tile in tiles.iter().flatten() {
        let frames = packed.positions(&tile.name, &tile.frames)?;
        ctx.register_tile(&tile.name, tile.id);

        writeln!(w, "__pulp.tiles[{}] = {{", tile.id)?;
        writeln!(w, "    id = {},", tile.id)?;
        writeln!(w, "    fps = {},", number(tile.fps))?;
        writeln!(w, "    name = {},", quote(&tile.name))?;
        writeln!(w, "    type = {},", tile.kind)?;
        writeln!(w, "    btype = {},", tile.btype)?;
        writeln!(w, "    solid = {},", tile.solid)?;
        if let Some(says) = &tile.says {
            writeln!(w, "    says = {},", quote(says))?;
        }
        write!(w, "    frames = {{")?;
        for pos in frames {
            write!(w, " {pos},")?;
        }
        writeln!(w, " }},")?;
        writeln!(w, "}}")?;
    }
    Ok(())
}

pub fn emit_rooms<W: Write>(w: &mut W, rooms: &[Option<Room>]) -> CompileResult<()> {
    writeln!(w, "\n__pulp.rooms = {{}}")?;
    for room in rooms.iter().flatten() {
        writeln!(w, "__pulp.rooms[{}] = {{", room.id)?;
        writeln!(w, "  id = {},", room.id)?;
        writeln!(w, "  name = {},", quote(&room.name))?;
        writeln!(w, "  song = {},", room.song)?;
        write!(w, "  tiles = {{")?;
        for (i, tile) in room.tiles.iter().enumerate() {
            if i % ROOM_W as usize == 0 {
                write!(w, "\n    ")?;
            }
            write!(w, "{tile:4},")?;
        }
        writeln!(w, " }},")?;
        writeln!(w, "  exits = {{")?;
        for exit in &room.exits {
            emit_exit(w, exit)?;
        }
        writeln!(w, "  }},")?;
        writeln!(w, "}}")?;
    }
    Ok(())
}

fn emit_exit<W: Write>(w: &mut W, exit: &Exit) -> CompileResult<()> {
    writeln!(w, "    {{")?;
    writeln!(w, "      x = {},", exit.x.clamp(0, ROOM_W))?;
    writeln!(w, "      y = {},", exit.y.clamp(0, ROOM_H))?;
    if let Some(tx) = exit.tx {
        writeln!(w, "      tx = {tx},")?;
    }
    if let Some(ty) = exit.ty {
        writeln!(w, "      ty = {ty},")?;
    }
    if let Some(edge) = exit.edge {
        writeln!(w, "      edge = {edge},")?;
    }
    if let Some(fin) = &exit.fin {
        writeln!(w, "      fin = {},", long_string(fin))?;
    }
    if let Some(room) = exit.room {
        writeln!(w, "      room = {room},")?;
    }
    writeln!(w, "    }},")?;
    Ok(())
}

pub fn emit_sounds<W: Write>(w: &mut W, sounds: &[Option<Sound>]) -> CompileResult<()> {
    writeln!(w, "\n__pulp.sounds = {{}}")?;
    for sound in sounds.iter().flatten() {
        writeln!(w, "__pulp.sounds[{}] = {{", sound.id)?;
        writeln!(w, "  bpm = {},", number(sound.bpm))?;
        writeln!(w, "  name = {},", quote(&sound.name))?;
        writeln!(w, "  type = {},", sound.kind)?;
        if let Some(notes) = &sound.notes {
            write!(w, "  notes = {{")?;
            for note in notes {
                write!(w, "{}, ", number(*note))?;
            }
            writeln!(w, "}},")?;
        }
        if let Some(ticks) = sound.ticks {
            writeln!(w, "  ticks = {ticks},")?;
        }
        if let Some(env) = &sound.envelope {
            let fields = [
                ("decay", env.decay),
                ("attack", env.attack),
                ("release", env.release),
                ("volume", env.volume),
                ("sustain", env.sustain),
            ];
            for (key, value) in fields {
                if let Some(value) = value {
                    writeln!(w, "  {key} = {},", number(value))?;
                }
            }
        }
        writeln!(w, "}}")?;
    }
    Ok(())
}
