//! Helpers for the Lua dialect we emit.

use std::borrow::Cow;

/// Prefix reserved for runtime builtins (`__pulp`, `__floor`, …).
pub const RESERVED_PREFIX: &str = "__";

const KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Globals, handler parameters and accessor parameters the generated program
/// reads by bare name. A user variable must never shadow or overwrite them.
pub const SHADOWED: &[&str] = &[
    "_ENV", "_G", "event", "import", "math", "pairs", "playdate", "print", "tostring", "type",
    "value", "varname",
];

/// `true` when `name` can be written as a bare Lua name (`local name = …`).
pub fn is_token(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&name)
}

/// A variable may live in a bare Lua name only if the namespacing rule
/// leaves it untouched.
pub fn is_fast_eligible(name: &str) -> bool {
    is_token(name) && !needs_namespace(name)
}

fn needs_namespace(name: &str) -> bool {
    name.contains(RESERVED_PREFIX) || SHADOWED.contains(&name)
}

/// Mirror of the rule in `__pulp.setvariable`: names containing the
/// reserved prefix, or naming something in `SHADOWED`, are moved out of
/// the builtins' way.
pub fn namespaced(name: &str) -> Cow<'_, str> {
    if needs_namespace(name) {
        Cow::Owned(format!("{RESERVED_PREFIX}{name}"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Lvalue / rvalue used to reach a user variable from generated code.
pub fn var_ref(name: &str) -> String {
    if is_fast_eligible(name) {
        name.to_string()
    } else {
        format!("_G[{}]", quote(&namespaced(name)))
    }
}

/// Escape `s` for use between double quotes.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

pub fn quote(s: &str) -> String {
    format!("\"{}\"", escape_string(s))
}

/// Long-bracket literal (`[==[ … ]==]`) whose level cannot be closed early
/// by the text itself.
pub fn long_string(text: &str) -> String {
    let tail = format!("{text}]");
    let mut level = 0;
    while tail.contains(&format!("]{}]", "=".repeat(level))) {
        level += 1;
    }
    let eq = "=".repeat(level);
    // the first newline after the opening bracket is dropped by Lua
    let lead = if text.starts_with('\n') || text.starts_with('\r') {
        "\n"
    } else {
        ""
    };
    format!("[{eq}[{lead}{text}]{eq}]")
}

/// Lua number literal for an authored value (`1.0` prints as `1`).
pub fn number(v: f64) -> String {
    format!("{v}")
}

/// `t["key"]` or `t.key` depending on whether `key` is a bare name.
pub fn index(table: &str, key: &str) -> String {
    if is_token(key) {
        format!("{table}.{key}")
    } else {
        format!("{table}[{}]", quote(key))
    }
}
