use anyhow::{Context, Result};
use clap::Args;
use markedit_parser::{CheckMode, Parser, Validator};
use std::io::Write;
use std::path::PathBuf;

use super::{emit, read_source, report, Outcome};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Input document
    pub path: PathBuf,

    /// Spaces per nesting level
    #[arg(long, conflicts_with = "minify", allow_negative_numbers = true)]
    pub indent: Option<i32>,

    /// Write everything on one line
    #[arg(long)]
    pub minify: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl FormatArgs {
    fn indent(&self, config: &Config) -> i32 {
        if self.minify {
            -1
        } else {
            self.indent.unwrap_or(config.indent)
        }
    }
}

/// Validate, then reprint the document. Nothing is written when the
/// document is not well-formed.
pub fn format(args: &FormatArgs, config: &Config, out: &mut dyn Write) -> Result<Outcome> {
    let source = read_source(&args.path)?;

    if let Err(errors) = Validator::check_source(&source, CheckMode::CollectAll) {
        report(&args.path, &source, &errors, out)?;
        return Ok(Outcome::Invalid);
    }

    let tree = Parser::parse(&source)
        .with_context(|| format!("cannot build a tree from {}", args.path.display()))?;
    let text = markedit_format::dump(&tree, args.indent(config));
    emit(&text, args.output.as_deref(), out)?;
    Ok(Outcome::Clean)
}
