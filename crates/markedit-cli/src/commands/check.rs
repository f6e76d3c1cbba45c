use anyhow::Result;
use clap::Args;
use markedit_parser::{CheckMode, Validator};
use std::io::Write;
use std::path::PathBuf;

use super::{read_source, report, Outcome};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Input document
    pub path: PathBuf,

    /// Stop at the first error
    #[arg(long)]
    pub fail_fast: bool,
}

impl CheckArgs {
    fn mode(&self, config: &Config) -> CheckMode {
        if self.fail_fast || !config.collect_all {
            CheckMode::FailFast
        } else {
            CheckMode::CollectAll
        }
    }
}

pub fn check(args: &CheckArgs, config: &Config, out: &mut dyn Write) -> Result<Outcome> {
    let source = read_source(&args.path)?;

    match Validator::check_source(&source, args.mode(config)) {
        Ok(()) => {
            writeln!(out, "OK: {}", args.path.display())?;
            Ok(Outcome::Clean)
        }
        Err(errors) => {
            report(&args.path, &source, &errors, out)?;
            Ok(Outcome::Invalid)
        }
    }
}
