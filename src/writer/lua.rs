//! Write `main.lua` and copy the runtime support module next to it.

use crate::model::ProcessedProject;
use std::fs;
use std::io;
use std::path::Path;

pub const PROGRAM_FILE: &str = "main.lua";

pub fn emit(project: &ProcessedProject, out_dir: &Path, runtime: &Path) -> io::Result<()> {
    fs::write(out_dir.join(PROGRAM_FILE), &project.program)?;

    let file_name = runtime.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("runtime path {} has no file name", runtime.display()),
        )
    })?;
    fs::copy(runtime, out_dir.join(file_name))?;
    Ok(())
}
