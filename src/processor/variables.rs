//! Split user variables between Lua locals ("fast") and globals ("dynamic").
//!
//! The runtime compiler refuses chunks with too many locals, so only the
//! most used bare-name variables get a local; everything else lives in
//! `_G`. Runs once, after every script has compiled.

use std::cmp::Reverse;
use std::fmt::Write;

use crate::config::FAST_SLOTS_MAX;
use crate::error::{CompileError, CompileResult};
use crate::processor::context::SealedContext;
use crate::processor::lua::{RESERVED_PREFIX, SHADOWED, is_fast_eligible, quote, var_ref};

#[derive(Debug, Clone, Default)]
pub struct VariableSlots {
    /// Ranked by usage, most used first.
    fast: Vec<String>,
    dynamic: Vec<String>,
}

/// Rank variables by descending usage (ties by name) and hand out up to
/// `capacity` fast slots to the eligible ones. `capacity` is clamped to
/// `FAST_SLOTS_MAX`.
pub fn allocate(ctx: &SealedContext, capacity: usize) -> CompileResult<VariableSlots> {
    if capacity > FAST_SLOTS_MAX {
        log::warn!("{capacity} fast slots requested, using {FAST_SLOTS_MAX}");
    }
    let capacity = capacity.min(FAST_SLOTS_MAX);
    let mut ranked: Vec<(&str, usize)> = ctx
        .usage()
        .iter()
        .map(|(name, &count)| (name.as_str(), count))
        .collect();
    ranked.sort_by_key(|&(name, count)| (Reverse(count), name));

    let mut slots = VariableSlots::default();
    for (name, _) in ranked {
        if name.starts_with(RESERVED_PREFIX) {
            return Err(CompileError::ReservedVariable(name.to_string()));
        }
        if is_fast_eligible(name) && slots.fast.len() < capacity {
            slots.fast.push(name.to_string());
        } else {
            slots.dynamic.push(name.to_string());
        }
    }

    log::info!(
        "Variables: {} fast, {} dynamic",
        slots.fast.len(),
        slots.dynamic.len()
    );
    Ok(slots)
}

impl VariableSlots {
    pub fn fast(&self) -> &[String] {
        &self.fast
    }

    pub fn dynamic(&self) -> &[String] {
        &self.dynamic
    }

    pub fn is_fast(&self, name: &str) -> bool {
        self.fast.iter().any(|n| n == name)
    }

    fn all(&self) -> impl Iterator<Item = &String> {
        self.fast.iter().chain(self.dynamic.iter())
    }

    /// Zero-initialised declarations, emitted ahead of the entity tables.
    pub fn emit_declarations<W: Write>(&self, w: &mut W) -> CompileResult<()> {
        for name in &self.fast {
            writeln!(w, "local {name} = 0")?;
        }
        for name in &self.dynamic {
            writeln!(w, "{} = 0", var_ref(name))?;
        }
        Ok(())
    }

    /// `__pulp.setvariable`, `__pulp.getvariable` and `__pulp.resetvars`.
    ///
    /// Lookups by name dispatch over the closed set of fast names and fall
    /// back to `_G` for everything else.
    pub fn emit_accessors<W: Write>(&self, w: &mut W) -> CompileResult<()> {
        write!(w, "__pulp.shadowed = {{")?;
        for name in SHADOWED {
            write!(w, " {name} = true,")?;
        }
        writeln!(w, " }}")?;

        writeln!(w, "function __pulp.setvariable(varname, value)")?;
        emit_namespacing(w)?;
        self.emit_dispatch(w, |name| format!("{name} = value"), "_G[varname] = value")?;
        writeln!(w, "end")?;

        writeln!(w, "function __pulp.getvariable(varname)")?;
        emit_namespacing(w)?;
        self.emit_dispatch(w, |name| format!("return {name}"), "return _G[varname]")?;
        writeln!(w, "end")?;

        writeln!(w, "function __pulp.resetvars()")?;
        for name in self.all() {
            writeln!(w, "  {} = 0", var_ref(name))?;
        }
        writeln!(w, "end")?;
        Ok(())
    }

    fn emit_dispatch<W: Write>(
        &self,
        w: &mut W,
        fast: impl Fn(&str) -> String,
        fallback: &str,
    ) -> CompileResult<()> {
        if self.fast.is_empty() {
            writeln!(w, "  {fallback}")?;
            return Ok(());
        }
        for (i, name) in self.fast.iter().enumerate() {
            let kw = if i == 0 { "if" } else { "elseif" };
            writeln!(w, "  {kw} varname == {} then {}", quote(name), fast(name))?;
        }
        writeln!(w, "  else {fallback} end")?;
        Ok(())
    }
}

fn emit_namespacing<W: Write>(w: &mut W) -> CompileResult<()> {
    writeln!(
        w,
        "  if varname:find(\"{p}\") or __pulp.shadowed[varname] then varname = \"{p}\" .. varname end -- keep clear of builtins",
        p = RESERVED_PREFIX
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::context::CompileContext;

    fn sealed(uses: &[(&str, usize)]) -> SealedContext {
        let mut ctx = CompileContext::new();
        for &(name, n) in uses {
            for _ in 0..n {
                ctx.use_var(name);
            }
        }
        ctx.seal()
    }

    #[test]
    fn test_score_wins_and_overflow_is_demoted() {
        let mut uses = vec![("score".to_string(), 50)];
        for i in 0..170 {
            uses.push((format!("v{i:03}"), 1));
        }
        let uses: Vec<(&str, usize)> = uses.iter().map(|(n, c)| (n.as_str(), *c)).collect();

        let slots = allocate(&sealed(&uses), 160).expect("allocate");

        assert_eq!(slots.fast().len(), 160);
        assert_eq!(slots.fast()[0], "score");
        assert_eq!(slots.dynamic().len(), 11);
        // ties break lexicographically, so the last eleven names overflow
        let expected: Vec<String> = (159..170).map(|i| format!("v{i:03}")).collect();
        assert_eq!(slots.dynamic(), expected.as_slice());
    }

    #[test]
    fn test_capacity_is_clamped() {
        let names: Vec<String> = (0..200).map(|i| format!("v{i:03}")).collect();
        let uses: Vec<(&str, usize)> = names.iter().map(|n| (n.as_str(), 1)).collect();

        let slots = allocate(&sealed(&uses), 200).expect("allocate");

        assert_eq!(slots.fast().len(), FAST_SLOTS_MAX);
        assert_eq!(slots.dynamic().len(), 200 - FAST_SLOTS_MAX);
    }

    #[test]
    fn test_higher_usage_is_preferred() {
        let slots = allocate(&sealed(&[("a", 1), ("b", 3), ("c", 2)]), 2).expect("allocate");
        assert_eq!(slots.fast(), ["b".to_string(), "c".to_string()]);
        assert_eq!(slots.dynamic(), ["a".to_string()]);
    }

    #[test]
    fn test_partition_is_complete() {
        let slots = allocate(
            &sealed(&[("hp", 4), ("player.name", 9), ("end", 2), ("a__b", 1), ("x", 1)]),
            160,
        )
        .expect("allocate");

        assert_eq!(slots.fast(), ["hp".to_string(), "x".to_string()]);
        assert_eq!(
            slots.dynamic(),
            [
                "player.name".to_string(),
                "end".to_string(),
                "a__b".to_string()
            ]
        );

        let mut out = String::new();
        slots.emit_accessors(&mut out).expect("emit");
        let reset = out.split("function __pulp.resetvars()").nth(1).expect("reset");
        for line in [
            "  hp = 0",
            "  x = 0",
            "  _G[\"player.name\"] = 0",
            "  _G[\"end\"] = 0",
            "  _G[\"__a__b\"] = 0",
        ] {
            assert!(reset.contains(line), "missing `{line}` in reset");
        }
    }

    #[test]
    fn test_reserved_prefix_is_fatal() {
        let err = allocate(&sealed(&[("__pulp", 1)]), 160).unwrap_err();
        assert!(matches!(err, CompileError::ReservedVariable(name) if name == "__pulp"));
    }

    #[test]
    fn test_declarations() {
        let slots = allocate(&sealed(&[("hp", 2), ("gold", 1), ("a.b", 1)]), 1).expect("allocate");

        let mut out = String::new();
        slots.emit_declarations(&mut out).expect("emit");
        assert_eq!(out, "local hp = 0\n_G[\"a.b\"] = 0\ngold = 0\n");
    }

    #[test]
    fn test_dispatch_over_fast_names() {
        let slots = allocate(&sealed(&[("hp", 2), ("gold", 1)]), 160).expect("allocate");

        let mut out = String::new();
        slots.emit_accessors(&mut out).expect("emit");
        assert!(out.contains(
            "function __pulp.setvariable(varname, value)\n  if varname:find(\"__\") or __pulp.shadowed[varname] then varname = \"__\" .. varname end"
        ));
        assert!(out.contains(
            "  if varname == \"hp\" then hp = value\n  elseif varname == \"gold\" then gold = value\n  else _G[varname] = value end\n"
        ));
        assert!(out.contains("  elseif varname == \"gold\" then return gold\n  else return _G[varname] end\n"));
    }

    #[test]
    fn test_generated_names_stay_dynamic() {
        let slots = allocate(&sealed(&[("pairs", 3), ("type", 2), ("hp", 1)]), 160).expect("allocate");
        assert_eq!(slots.fast(), ["hp".to_string()]);

        let mut out = String::new();
        slots.emit_declarations(&mut out).expect("emit");
        assert_eq!(out, "local hp = 0\n_G[\"__pairs\"] = 0\n_G[\"__type\"] = 0\n");

        let mut out = String::new();
        slots.emit_accessors(&mut out).expect("emit");
        assert!(out.starts_with("__pulp.shadowed = { _ENV = true, _G = true, event = true,"));
        assert!(out.contains(" pairs = true,"));
    }

    #[test]
    fn test_no_fast_variables() {
        let slots = allocate(&sealed(&[("a.b", 1)]), 160).expect("allocate");
        let mut out = String::new();
        slots.emit_accessors(&mut out).expect("emit");
        assert!(out.contains("builtins\n  _G[varname] = value\nend\n"));
        assert!(out.contains("builtins\n  return _G[varname]\nend\n"));
    }
}
