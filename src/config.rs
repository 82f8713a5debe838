use std::path::PathBuf;

/// Active locals the Lua compiler allows in one function, main chunk included.
pub const LUA_LOCALS_LIMIT: usize = 200;
/// `local` aliases declared by the program preamble.
pub const PREAMBLE_LOCALS: usize = 16;
/// Hidden and named locals of the deepest top-level loop nest: a generic
/// `for` inside the numeric `for` that repeats cyclic mimics.
pub const LOOP_LOCALS: usize = 10;

/// Default fast-slot capacity.
pub const FAST_SLOTS: usize = 160;
/// Largest capacity that still leaves room for the preamble and the loops.
pub const FAST_SLOTS_MAX: usize = LUA_LOCALS_LIMIT - PREAMBLE_LOCALS - LOOP_LOCALS;

/// Repetitions used for mimic chains that form a cycle.
pub const MIMIC_CYCLE_PASSES: usize = 5;

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub fast_slots: usize,
    pub mimic_cycle_passes: usize,
    /// Runtime support module copied next to the generated program.
    pub runtime: PathBuf,
    pub output: PathBuf,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            fast_slots: FAST_SLOTS,
            mimic_cycle_passes: MIMIC_CYCLE_PASSES,
            runtime: PathBuf::from("pulp.lua"),
            output: PathBuf::from("out"),
        }
    }
}
