//! Fatal compile errors.
//!
//! Anything that can be recovered from (unknown script owners, unknown
//! opcodes, …) is recorded as a diagnostic in the compile context instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// The document does not follow the expected shape.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("frame {frame}: pixel {index} is {value}")]
    BadPixel { frame: usize, index: usize, value: u8 },

    #[error("frame {frame}: expected 64 pixels, got {len}")]
    FrameSize { frame: usize, len: usize },

    #[error("tile `{tile}` references unknown frame {frame}")]
    UnknownFrame { tile: String, frame: usize },

    /// User variables may not start with the prefix reserved for builtins.
    #[error("variables cannot start with __: `{0}`")]
    ReservedVariable(String),

    #[error("unknown script type {0}")]
    UnknownScriptType(u64),

    #[error("script `{script}`, event `{event}`: expected [\"block\", n]")]
    MalformedEvent { script: String, event: String },

    #[error("script `{script}`, event `{event}`: {reason}")]
    MalformedBlock {
        script: String,
        event: String,
        reason: String,
    },

    #[error(transparent)]
    Format(#[from] std::fmt::Error),
}

pub type CompileResult<T> = Result<T, CompileError>;
