pub mod check;
pub mod convert;
pub mod format;
pub mod pack;

pub use check::{check, CheckArgs};
pub use convert::{convert, ConvertArgs};
pub use format::{format, FormatArgs};
pub use pack::{pack, unpack, PackArgs, UnpackArgs};

use anyhow::{Context, Result};
use markedit_lexer::Position;
use markedit_parser::ValidationError;
use std::io::Write;
use std::path::Path;

/// Whether a command found the input acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    Invalid,
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

/// Write `text` to `output`, or to `out` followed by a newline.
fn emit(text: &str, output: Option<&Path>, out: &mut dyn Write) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = text.len(), "wrote output");
        }
        None => writeln!(out, "{text}")?,
    }
    Ok(())
}

/// One `path:line:col: message` line per error.
fn report(
    path: &Path,
    source: &str,
    errors: &[ValidationError],
    out: &mut dyn Write,
) -> Result<()> {
    for error in errors {
        let pos = Position::locate(source, error.offset);
        writeln!(
            out,
            "{}:{}:{}: {}",
            path.display(),
            pos.line,
            pos.column,
            error.message()
        )?;
    }
    Ok(())
}
