//! State shared by every event compilation.
//!
//! `CompileContext` is open while scripts compile; `seal` consumes it and
//! hands out a read-only `SealedContext` for the passes that need the
//! complete picture (variable allocation, mimic resolution).

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// "`script`'s handler for `event` falls back to `target`'s".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimicRequest {
    pub script: String,
    pub event: String,
    pub target: String,
}

impl MimicRequest {
    /// Event key that copies every handler instead of a single one.
    pub const ANY: &'static str = "any";

    pub fn is_wildcard(&self) -> bool {
        self.event == Self::ANY
    }
}

#[derive(Debug, Default)]
pub struct CompileContext {
    usage: BTreeMap<String, usize>,
    errors: Vec<String>,
    mimics: Vec<MimicRequest>,
    tile_ids: HashMap<String, i64>,
}

impl CompileContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reference (read or write) to a user variable.
    pub fn use_var(&mut self, name: &str) {
        *self.usage.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Non-fatal diagnostic, reported once after generation.
    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn mimic(&mut self, script: &str, event: &str, target: &str) {
        self.mimics.push(MimicRequest {
            script: script.to_string(),
            event: event.to_string(),
            target: target.to_string(),
        });
    }

    pub fn register_tile(&mut self, name: &str, id: i64) {
        self.tile_ids.insert(name.to_string(), id);
    }

    pub fn tile_id(&self, name: &str) -> Option<i64> {
        self.tile_ids.get(name).copied()
    }

    /// Finish compilation. No further usages can be recorded afterwards.
    pub fn seal(self) -> SealedContext {
        SealedContext {
            usage: self.usage,
            errors: self.errors,
            mimics: self.mimics,
        }
    }
}

#[derive(Debug)]
pub struct SealedContext {
    usage: BTreeMap<String, usize>,
    errors: Vec<String>,
    mimics: Vec<MimicRequest>,
}

impl SealedContext {
    /// Every referenced variable with its usage count, sorted by name.
    pub fn usage(&self) -> &BTreeMap<String, usize> {
        &self.usage
    }

    pub fn mimics(&self) -> &[MimicRequest] {
        &self.mimics
    }

    /// Diagnostics deduplicated by message text.
    pub fn diagnostics(&self) -> Vec<String> {
        self.errors
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_accumulates() {
        let mut ctx = CompileContext::new();
        ctx.use_var("score");
        ctx.use_var("lives");
        ctx.use_var("score");

        let sealed = ctx.seal();
        assert_eq!(sealed.usage().get("score"), Some(&2));
        assert_eq!(sealed.usage().get("lives"), Some(&1));
        assert_eq!(sealed.usage().len(), 2);
    }

    #[test]
    fn test_diagnostics_are_deduplicated() {
        let mut ctx = CompileContext::new();
        ctx.error("unknown script, type 1, id 9");
        ctx.error("unknown tile `rock`");
        ctx.error("unknown script, type 1, id 9");

        assert_eq!(
            ctx.seal().diagnostics(),
            vec![
                "unknown script, type 1, id 9".to_string(),
                "unknown tile `rock`".to_string()
            ]
        );
    }

    #[test]
    fn test_mimic_wildcard() {
        let mut ctx = CompileContext::new();
        ctx.mimic("door", "any", "wall");
        ctx.mimic("door", "interact", "wall");
        let sealed = ctx.seal();
        assert!(sealed.mimics()[0].is_wildcard());
        assert!(!sealed.mimics()[1].is_wildcard());
    }
}
