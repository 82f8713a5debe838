//! Mimic resolution: scripts borrowing another script's handlers.
//!
//! A script's requests are emitted only after those of every script it
//! mimics, so chains resolve in one pass whatever their length. Scripts on
//! a cycle have no such order and are repeated `passes` times instead.

use std::collections::HashSet;
use std::fmt::Write;

use crate::error::CompileResult;
use crate::processor::context::{MimicRequest, SealedContext};
use crate::processor::lua::{index, quote};

#[derive(Debug, Default)]
struct Plan<'a> {
    ordered: Vec<&'a MimicRequest>,
    cyclic: Vec<&'a MimicRequest>,
}

/// Group requests per mimicking script (first-appearance order) and order
/// the groups so targets come first.
fn plan(mimics: &[MimicRequest]) -> Plan<'_> {
    let mut groups: Vec<(&str, Vec<&MimicRequest>)> = Vec::new();
    for req in mimics {
        match groups.iter_mut().find(|(script, _)| *script == req.script) {
            Some((_, reqs)) => reqs.push(req),
            None => groups.push((req.script.as_str(), vec![req])),
        }
    }
    let mimicking: HashSet<&str> = groups.iter().map(|(script, _)| *script).collect();

    let mut plan = Plan::default();
    let mut resolved = HashSet::<&str>::new();
    loop {
        let ready = groups.iter().position(|(script, reqs)| {
            reqs.iter().all(|r| {
                r.target == *script
                    || !mimicking.contains(r.target.as_str())
                    || resolved.contains(r.target.as_str())
            })
        });
        let Some(pos) = ready else { break };
        let (script, reqs) = groups.remove(pos);
        resolved.insert(script);
        plan.ordered.extend(reqs);
    }
    for (script, reqs) in groups {
        log::warn!("mimics of `{}` depend on a cycle", script);
        plan.cyclic.extend(reqs);
    }
    plan
}

/// Emit the mimic section; nothing when no script mimics another.
pub fn emit_mimics<W: Write>(w: &mut W, ctx: &SealedContext, passes: usize) -> CompileResult<()> {
    let plan = plan(ctx.mimics());
    if plan.ordered.is_empty() && plan.cyclic.is_empty() {
        return Ok(());
    }

    writeln!(w, "\n-- mimics")?;
    for req in &plan.ordered {
        emit_request(w, req, "")?;
    }
    if !plan.cyclic.is_empty() {
        writeln!(w, "for _ = 1, {passes} do")?;
        for req in &plan.cyclic {
            emit_request(w, req, "  ")?;
        }
        writeln!(w, "end")?;
    }
    Ok(())
}

fn emit_request<W: Write>(w: &mut W, req: &MimicRequest, pad: &str) -> CompileResult<()> {
    let script = format!("__pulp:getScript({})", quote(&req.script));
    let target = format!("__pulp:getScript({})", quote(&req.target));

    if req.is_wildcard() {
        writeln!(w, "{pad}for name, fn in pairs({target}) do")?;
        writeln!(
            w,
            "{pad}  if not {script}[name] and type(fn) == \"function\" then"
        )?;
        writeln!(w, "{pad}    {script}[name] = fn")?;
        writeln!(w, "{pad}  end")?;
        writeln!(w, "{pad}end")?;
    } else {
        writeln!(
            w,
            "{pad}{} = {} or {}",
            index(&script, &req.event),
            index(&target, &req.event),
            index(&target, MimicRequest::ANY)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::context::CompileContext;
    use std::collections::HashMap;

    fn sealed(reqs: &[(&str, &str, &str)]) -> SealedContext {
        let mut ctx = CompileContext::new();
        for (script, event, target) in reqs {
            ctx.mimic(script, event, target);
        }
        ctx.seal()
    }

    /// Apply a plan the way the emitted Lua would, on handler-name sets.
    fn run(plan: &Plan, handlers: &mut HashMap<String, HashSet<String>>, passes: usize) {
        fn apply(req: &MimicRequest, handlers: &mut HashMap<String, HashSet<String>>) {
            let from = handlers.get(&req.target).cloned().unwrap_or_default();
            let to = handlers.entry(req.script.clone()).or_default();
            if req.is_wildcard() {
                to.extend(from);
            } else if from.contains(&req.event) || from.contains(MimicRequest::ANY) {
                to.insert(req.event.clone());
            }
        }
        for req in &plan.ordered {
            apply(req, handlers);
        }
        for _ in 0..passes {
            for req in &plan.cyclic {
                apply(req, handlers);
            }
        }
    }

    #[test]
    fn test_specific_event() {
        let ctx = sealed(&[("door", "interact", "wall")]);
        let mut out = String::new();
        emit_mimics(&mut out, &ctx, 5).expect("emit");
        assert_eq!(
            out,
            "\n-- mimics\n__pulp:getScript(\"door\").interact = __pulp:getScript(\"wall\").interact or __pulp:getScript(\"wall\").any\n"
        );
    }

    #[test]
    fn test_wildcard_copies_missing_functions() {
        let ctx = sealed(&[("door", "any", "wall")]);
        let mut out = String::new();
        emit_mimics(&mut out, &ctx, 5).expect("emit");
        assert!(out.contains(
            "for name, fn in pairs(__pulp:getScript(\"wall\")) do\n  if not __pulp:getScript(\"door\")[name] and type(fn) == \"function\" then\n    __pulp:getScript(\"door\")[name] = fn\n  end\nend\n"
        ));
        assert!(!out.contains("for _ = 1"), "no cycle, no repetition");
    }

    #[test]
    fn test_targets_resolve_first() {
        // x mimics y mimics z, declared in that order
        let ctx = sealed(&[("x", "any", "y"), ("y", "any", "z")]);
        let mut out = String::new();
        emit_mimics(&mut out, &ctx, 5).expect("emit");

        let y_first = out.find("pairs(__pulp:getScript(\"z\"))").expect("y <- z");
        let x_after = out.find("pairs(__pulp:getScript(\"y\"))").expect("x <- y");
        assert!(y_first < x_after);
    }

    #[test]
    fn test_long_chain_converges() {
        // s0 mimics s1 mimics ... s7, declared from the head of the chain
        let names: Vec<String> = (0..8).map(|i| format!("s{i}")).collect();
        let reqs: Vec<(&str, &str, &str)> = names
            .windows(2)
            .map(|w| (w[0].as_str(), "any", w[1].as_str()))
            .collect();
        let ctx = sealed(&reqs);
        let plan = plan(ctx.mimics());
        assert!(plan.cyclic.is_empty());

        let mut handlers = HashMap::new();
        handlers.insert("s7".to_string(), HashSet::from(["draw".to_string()]));
        handlers.insert("s3".to_string(), HashSet::from(["update".to_string()]));
        run(&plan, &mut handlers, 0);

        let head = &handlers["s0"];
        assert!(head.contains("draw") && head.contains("update"));
    }

    #[test]
    fn test_cycle_is_repeated() {
        let ctx = sealed(&[("a", "any", "b"), ("b", "any", "a"), ("c", "any", "a")]);
        let plan = plan(ctx.mimics());
        assert_eq!(plan.cyclic.len(), 3, "c waits on the cycle");
        assert!(plan.ordered.is_empty());

        let mut out = String::new();
        emit_mimics(&mut out, &ctx, 5).expect("emit");
        assert!(out.contains("for _ = 1, 5 do\n  for name, fn in pairs("));

        let mut handlers = HashMap::new();
        handlers.insert("a".to_string(), HashSet::from(["load".to_string()]));
        handlers.insert("b".to_string(), HashSet::from(["draw".to_string()]));
        run(&plan, &mut handlers, 5);
        assert_eq!(handlers["a"].len(), 2);
        assert_eq!(handlers["b"].len(), 2);
    }

    #[test]
    fn test_nothing_to_resolve() {
        let mut out = String::new();
        emit_mimics(&mut out, &sealed(&[]), 5).expect("emit");
        assert!(out.is_empty());
    }
}
