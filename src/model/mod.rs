//! Input document as it comes out of the JSON loader.
//!
//! Everything stays in a fairly "raw" shape (numbers as they were authored,
//! scripts as untouched block trees) so the processor decides what it needs.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::processor::variables::VariableSlots;

// numeric constants that describe the room / frame grid
pub const ROOM_W: i64 = 25;
pub const ROOM_H: i64 = 15;

pub const FRAME_W: u32 = 8;
pub const FRAME_H: u32 = 8;
pub const FRAME_PIXELS: usize = (FRAME_W * FRAME_H) as usize; // 64

/// Whole game document.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub name: String,
    pub player: Player,
    pub font: Font,
    #[serde(default, deserialize_with = "slots")]
    pub frames: Vec<Option<Frame>>,
    #[serde(default, deserialize_with = "slots")]
    pub tiles: Vec<Option<Tile>>,
    #[serde(default, deserialize_with = "slots")]
    pub rooms: Vec<Option<Room>>,
    #[serde(default, deserialize_with = "slots")]
    pub sounds: Vec<Option<Sound>>,
    #[serde(default)]
    pub scripts: Vec<ScriptEntry>,
}

/// ─────────────────────────────────────────────────────
/// Individual entity types
/// ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct Player {
    pub id: i64,
    pub room: i64,
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Font {
    #[serde(rename = "type")]
    pub kind: i64,
    /// Border ("pipe") glyphs, one 8×8 pixel array each.
    #[serde(default)]
    pub pipe: Vec<Vec<u8>>,
    #[serde(default)]
    pub chars: Vec<Vec<u8>>,
}

impl Font {
    /// Type 1 is the full-width font; everything else renders half-width.
    pub fn half_width(&self) -> bool {
        self.kind != 1
    }
}

/// One 8×8 animation step. Identity is the pixel content only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Frame {
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tile {
    pub id: i64,
    pub name: String,
    pub fps: f64,
    #[serde(rename = "type")]
    pub kind: i64,
    pub btype: i64,
    pub solid: bool,
    pub says: Option<String>,
    /// Indices into `Document::frames`.
    #[serde(default)]
    pub frames: Vec<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub song: i64,
    /// Row-major `ROOM_W × ROOM_H` tile ids.
    #[serde(default)]
    pub tiles: Vec<i64>,
    #[serde(default)]
    pub exits: Vec<Exit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Exit {
    pub x: i64,
    pub y: i64,
    pub tx: Option<i64>,
    pub ty: Option<i64>,
    pub edge: Option<i64>,
    /// Cutscene text shown when the exit ends the game.
    pub fin: Option<String>,
    pub room: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sound {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: i64,
    pub bpm: f64,
    pub notes: Option<Vec<f64>>,
    pub ticks: Option<i64>,
    pub envelope: Option<Envelope>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    pub attack: Option<f64>,
    pub decay: Option<f64>,
    pub sustain: Option<f64>,
    pub release: Option<f64>,
    pub volume: Option<f64>,
}

/// A script object: its owner (`kind` + `id`) and its event table.
///
/// `data` maps event keys to `["block", n]` references into the shared
/// `__blocks` array. Keys keep document order.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: u64,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Global = 0,
    Room = 1,
    Tile = 2,
}

impl ScriptKind {
    pub fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(ScriptKind::Global),
            1 => Some(ScriptKind::Room),
            2 => Some(ScriptKind::Tile),
            _ => None,
        }
    }

    /// Name the runtime uses when associating a script with its owner.
    pub fn as_str(self) -> &'static str {
        match self {
            ScriptKind::Global => "global",
            ScriptKind::Room => "room",
            ScriptKind::Tile => "tile",
        }
    }
}

/// Fully processed output handed to `writer`.
#[derive(Debug)]
pub struct ProcessedProject {
    /// Contents of `main.lua`.
    pub program: String,
    pub tiles_img: image::DynamicImage,
    pub pipe_img: image::DynamicImage,
    pub font_img: image::DynamicImage,
    pub variables: VariableSlots,
    /// Non-fatal problems, deduplicated and sorted.
    pub diagnostics: Vec<String>,
}

// ─────────────────────────────────────────────────────
/// Helper: lists that may contain holes written as `false` or `null`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Slot<T> {
    Present(T),
    Absent(Option<bool>),
}

fn slots<'de, D, T>(deserializer: D) -> Result<Vec<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw = Vec::<Slot<T>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|slot| match slot {
            Slot::Present(v) => Some(v),
            Slot::Absent(_) => None,
        })
        .collect())
}
