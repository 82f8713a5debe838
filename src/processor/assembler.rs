//! Final program layout.
//!
//! Section order matters: accessors and mimic code refer to names that only
//! exist once the earlier sections have run.

use std::fmt::Write;

use crate::error::CompileResult;
use crate::model::Document;
use crate::processor::lua::{escape_string, quote};
use crate::processor::scripts::CompiledScript;

/// Everything that goes into `main.lua`, already rendered.
#[derive(Debug, Default)]
pub struct Sections {
    pub declarations: String,
    pub tiles: String,
    pub rooms: String,
    pub sounds: String,
    pub scripts: Vec<CompiledScript>,
    pub mimics: String,
    pub accessors: String,
}

pub fn assemble(doc: &Document, sections: &Sections) -> CompileResult<String> {
    let mut code = String::new();
    preamble(&mut code, doc)?;
    code.push('\n');
    code.push_str(&sections.declarations);
    code.push_str(&sections.tiles);
    code.push_str(&sections.rooms);
    code.push_str(&sections.sounds);
    code.push_str("\n__pulp.songs = {}\n");
    for script in &sections.scripts {
        // names are authored text; keep them from ending the comment
        writeln!(
            code,
            "\n----------------- {} ----------------------------",
            escape_string(&script.name)
        )?;
        code.push_str(&script.code);
    }
    code.push_str(&sections.mimics);
    code.push('\n');
    code.push_str(&sections.accessors);
    epilogue(&mut code)?;
    Ok(code)
}

/// Runtime table, image tables, `import "pulp"` and builtin aliases.
pub fn preamble<W: Write>(w: &mut W, doc: &Document) -> CompileResult<()> {
    let player = &doc.player;
    writeln!(w, "___pulp = {{")?;
    writeln!(w, "  playerid = {},", player.id)?;
    writeln!(w, "  startroom = {},", player.room)?;
    writeln!(w, "  startx = {},", player.x)?;
    writeln!(w, "  starty = {},", player.y)?;
    writeln!(w, "  gamename = {},", quote(&doc.name))?;
    writeln!(w, "  halfwidth = {},", doc.font.half_width())?;
    writeln!(w, "  pipe_img = playdate.graphics.imagetable.new(\"pipe\"),")?;
    writeln!(w, "  font_img = playdate.graphics.imagetable.new(\"font\"),")?;
    writeln!(w, "  tile_img = playdate.graphics.imagetable.new(\"tiles\")")?;
    writeln!(w, "}}")?;
    w.write_str(
        r#"local __pulp <const> = ___pulp
import "pulp"
local __sin <const> = math.sin
local __cos <const> = math.cos
local __tan <const> = math.tan
local __floor <const> = math.floor
local __ceil <const> = math.ceil
local __round <const> = function(x) return math.ceil(x + 0.5) end
local __random <const> = math.random
local __tau <const> = math.pi * 2
local __tostring <const> = tostring
local __roomtiles <const> = __pulp.roomtiles
local __print <const> = print
local __fillrect <const> = playdate.graphics.fillRect
local __setcolour <const> = playdate.graphics.setColor
local __fillcolours <const> = {
    black = playdate.graphics.kColorBlack,
    white = playdate.graphics.kColorWhite
}
local __pix8scale = __pulp.pix8scale
"#,
    )?;
    Ok(())
}

pub fn epilogue<W: Write>(w: &mut W) -> CompileResult<()> {
    writeln!(w, "\n__pulp:load()")?;
    writeln!(w, "__pulp:start()")?;
    Ok(())
}
