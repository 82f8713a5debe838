//! Output artifacts. Writers only persist values the processor already built.
pub mod lua;
pub mod png;
