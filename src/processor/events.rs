//! Event bodies: block trees → Lua handler functions.
//!
//! The orchestrator only knows the `EventCompiler` trait. `BlockCompiler`
//! is the stock implementation for the block format below.
//
//  Block format (informal):
//
//      blocks  ::= [ block* ]                 shared per script (`__blocks`)
//      block   ::= [ stmt* ]
//      ref     ::= [ "block", n ]             index into `blocks`
//      stmt    ::= [ OP, arg* ]
//      expr    ::= number | string | bool | null | [ OP, arg* ]
//
//  Every variable mentioned by a statement or an expression counts as one
//  usage in the compile context.

use std::collections::HashSet;
use std::fmt::Write;

use serde_json::Value;

use crate::error::{CompileError, CompileResult};
use crate::processor::context::CompileContext;
use crate::processor::lua::{escape_string, index, quote, var_ref};

/// Turns one event of one script into Lua statements.
///
/// Implementations may record variable usages, diagnostics and mimic
/// requests in `ctx`, but must not compile other scripts.
pub trait EventCompiler {
    fn compile_event(
        &mut self,
        script: &str,
        event: &str,
        blocks: &[Value],
        root: usize,
        ctx: &mut CompileContext,
    ) -> CompileResult<String>;
}

#[derive(Debug, Default)]
pub struct BlockCompiler;

impl EventCompiler for BlockCompiler {
    fn compile_event(
        &mut self,
        script: &str,
        event: &str,
        blocks: &[Value],
        root: usize,
        ctx: &mut CompileContext,
    ) -> CompileResult<String> {
        let mut scope = EventScope {
            script,
            event,
            blocks,
            ctx,
            out: String::new(),
            active: HashSet::new(),
        };
        let handler = index(&format!("__pulp:getScript({})", quote(script)), event);
        writeln!(scope.out, "{handler} = function(__self, event)")?;
        scope.block(root, 1)?;
        writeln!(scope.out, "end")?;
        Ok(scope.out)
    }
}

struct EventScope<'a> {
    script: &'a str,
    event: &'a str,
    blocks: &'a [Value],
    ctx: &'a mut CompileContext,
    out: String,
    /// Blocks currently being emitted, to reject self-referencing trees.
    active: HashSet<usize>,
}

impl<'a> EventScope<'a> {
    fn malformed(&self, reason: impl Into<String>) -> CompileError {
        CompileError::MalformedBlock {
            script: self.script.to_string(),
            event: self.event.to_string(),
            reason: reason.into(),
        }
    }

    fn line(&mut self, depth: usize, code: &str) -> CompileResult<()> {
        writeln!(self.out, "{}{}", "  ".repeat(depth), code)?;
        Ok(())
    }

    fn block(&mut self, idx: usize, depth: usize) -> CompileResult<()> {
        let blocks = self.blocks;
        let stmts = match blocks.get(idx) {
            Some(Value::Array(stmts)) => stmts,
            Some(_) => return Err(self.malformed(format!("block {idx} is not a list"))),
            None => return Err(self.malformed(format!("block {idx} does not exist"))),
        };
        if !self.active.insert(idx) {
            return Err(self.malformed(format!("block {idx} contains itself")));
        }
        for stmt in stmts {
            self.statement(stmt, depth)?;
        }
        self.active.remove(&idx);
        Ok(())
    }

    fn statement(&mut self, stmt: &Value, depth: usize) -> CompileResult<()> {
        let (op, args) = self.split_op(stmt)?;

        match op {
            "set" => {
                let name = self.name_arg(args, 0)?;
                let value = self.expr(self.arg(args, 1)?)?;
                self.ctx.use_var(name);
                self.line(depth, &format!("{} = {value}", var_ref(name)))
            }
            "inc" | "dec" => {
                let name = self.name_arg(args, 0)?;
                self.ctx.use_var(name);
                let sign = if op == "inc" { "+" } else { "-" };
                let var = var_ref(name);
                self.line(depth, &format!("{var} = {var} {sign} 1"))
            }
            "add" | "sub" | "mul" | "div" => {
                let name = self.name_arg(args, 0)?;
                let value = self.expr(self.arg(args, 1)?)?;
                self.ctx.use_var(name);
                let sign = match op {
                    "add" => "+",
                    "sub" => "-",
                    "mul" => "*",
                    _ => "/",
                };
                let var = var_ref(name);
                self.line(depth, &format!("{var} = {var} {sign} ({value})"))
            }
            "if" => {
                let cond = self.expr(self.arg(args, 0)?)?;
                let then = self.block_ref(self.arg(args, 1)?)?;
                self.line(depth, &format!("if {cond} then"))?;
                self.block(then, depth + 1)?;
                if let Some(other) = args.get(2) {
                    let other = self.block_ref(other)?;
                    self.line(depth, "else")?;
                    self.block(other, depth + 1)?;
                }
                self.line(depth, "end")
            }
            "while" => {
                let cond = self.expr(self.arg(args, 0)?)?;
                let body = self.block_ref(self.arg(args, 1)?)?;
                self.line(depth, &format!("while {cond} do"))?;
                self.block(body, depth + 1)?;
                self.line(depth, "end")
            }
            "mimic" => {
                let target = self.name_arg(args, 0)?;
                self.ctx.mimic(self.script, self.event, target);
                self.line(depth, &format!("-- mimic {}", quote(target)))
            }
            "done" => self.line(depth, "do return end"),
            "log" => {
                let value = self.expr(self.arg(args, 0)?)?;
                self.line(depth, &format!("__print({value})"))
            }
            "say" => {
                let value = self.expr(self.arg(args, 0)?)?;
                self.line(depth, &format!("__pulp:say(__self, event, {value})"))
            }
            "call" => {
                let name = self.name_arg(args, 0)?;
                self.line(depth, &format!("__pulp:call(__self, {}, event)", quote(name)))
            }
            "emit" => {
                let name = self.name_arg(args, 0)?;
                self.line(depth, &format!("__pulp:emit({}, event)", quote(name)))
            }
            "sound" => {
                let value = self.expr(self.arg(args, 0)?)?;
                self.line(depth, &format!("__pulp:sound({value})"))
            }
            "goto" => {
                let mut params = Vec::with_capacity(args.len());
                for arg in args.iter().take(3) {
                    params.push(self.expr(arg)?);
                }
                if params.len() < 2 {
                    return Err(self.malformed("goto needs x and y"));
                }
                self.line(depth, &format!("__pulp:gotoroom({})", params.join(", ")))
            }
            other => {
                self.ctx.error(format!(
                    "unsupported statement `{other}` in {}.{}",
                    self.script, self.event
                ));
                self.line(depth, &format!("-- unsupported: {}", escape_string(other)))
            }
        }
    }

    fn expr(&mut self, v: &Value) -> CompileResult<String> {
        let (op, args) = match v {
            Value::Number(n) => return Ok(n.to_string()),
            Value::String(s) => return Ok(quote(s)),
            Value::Bool(b) => return Ok(b.to_string()),
            Value::Null => return Ok("nil".to_string()),
            Value::Object(_) => return Err(self.malformed("objects are not expressions")),
            Value::Array(_) => self.split_op(v)?,
        };

        let code = match op {
            "var" => {
                let name = self.name_arg(args, 0)?;
                self.ctx.use_var(name);
                var_ref(name)
            }
            "id" => {
                let name = self.name_arg(args, 0)?;
                match self.ctx.tile_id(name) {
                    Some(id) => id.to_string(),
                    None => {
                        self.ctx.error(format!("unknown tile `{name}`"));
                        "nil".to_string()
                    }
                }
            }
            "event" => index("event", self.name_arg(args, 0)?),
            "fmt" => {
                if args.is_empty() {
                    return Ok("\"\"".to_string());
                }
                let mut parts = Vec::with_capacity(args.len());
                for part in args {
                    parts.push(format!("__tostring({})", self.expr(part)?));
                }
                format!("({})", parts.join(" .. "))
            }
            "+" | "-" | "*" | "/" | "==" | "!=" | "<" | ">" | "<=" | ">=" => {
                let lhs = self.expr(self.arg(args, 0)?)?;
                let rhs = self.expr(self.arg(args, 1)?)?;
                let op = if op == "!=" { "~=" } else { op };
                format!("({lhs} {op} {rhs})")
            }
            "floor" | "ceil" | "round" | "sin" | "cos" | "tan" => {
                let x = self.expr(self.arg(args, 0)?)?;
                format!("__{op}({x})")
            }
            "random" => {
                let lo = self.expr(self.arg(args, 0)?)?;
                let hi = self.expr(self.arg(args, 1)?)?;
                format!("__random({lo}, {hi})")
            }
            other => {
                self.ctx.error(format!(
                    "unsupported expression `{other}` in {}.{}",
                    self.script, self.event
                ));
                "nil".to_string()
            }
        };
        Ok(code)
    }

    // ─────────────────────────────────────────────────────
    // operand helpers
    // ─────────────────────────────────────────────────────

    fn split_op<'v>(&self, v: &'v Value) -> CompileResult<(&'v str, &'v [Value])> {
        match v.as_array().and_then(|a| a.split_first()) {
            Some((Value::String(op), args)) => Ok((op.as_str(), args)),
            _ => Err(self.malformed(format!("expected [op, ...], got {v}"))),
        }
    }

    fn arg<'v>(&self, args: &'v [Value], i: usize) -> CompileResult<&'v Value> {
        args.get(i)
            .ok_or_else(|| self.malformed(format!("missing operand {}", i + 1)))
    }

    fn name_arg<'v>(&self, args: &'v [Value], i: usize) -> CompileResult<&'v str> {
        self.arg(args, i)?
            .as_str()
            .ok_or_else(|| self.malformed(format!("operand {} must be a name", i + 1)))
    }

    fn block_ref(&self, v: &Value) -> CompileResult<usize> {
        parse_block_ref(v).ok_or_else(|| self.malformed(format!("expected [\"block\", n], got {v}")))
    }
}

/// `["block", n]` → `n`.
pub fn parse_block_ref(v: &Value) -> Option<usize> {
    match v.as_array()?.as_slice() {
        [Value::String(tag), n] if tag == "block" => n.as_u64().map(|n| n as usize),
        _ => None,
    }
}
