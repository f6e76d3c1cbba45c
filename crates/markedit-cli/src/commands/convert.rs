use anyhow::{Context, Result};
use clap::Args;
use markedit_parser::Parser;
use std::io::Write;
use std::path::PathBuf;

use super::{emit, read_source, Outcome};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input document
    pub path: PathBuf,

    /// Spaces per nesting level; negative for compact output
    #[arg(long, allow_negative_numbers = true)]
    pub indent: Option<i32>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print the document as nested JSON objects.
pub fn convert(args: &ConvertArgs, config: &Config, out: &mut dyn Write) -> Result<Outcome> {
    let source = read_source(&args.path)?;
    let tree = Parser::parse(&source)
        .with_context(|| format!("cannot build a tree from {}", args.path.display()))?;

    let indent = args.indent.unwrap_or(config.object_indent);
    let text = markedit_format::to_object(&tree, indent)?;
    emit(&text, args.output.as_deref(), out)?;
    Ok(Outcome::Clean)
}
