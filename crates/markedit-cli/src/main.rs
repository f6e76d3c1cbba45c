mod commands;
mod config;

use clap::{Parser, Subcommand};
use commands::{CheckArgs, ConvertArgs, FormatArgs, Outcome, PackArgs, UnpackArgs};
use config::Config;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `MARKEDIT_LOG=debug`.
const LOG_ENV: &str = "MARKEDIT_LOG";

#[derive(Parser)]
#[command(name = "markedit")]
#[command(about = "markedit: check, reformat, convert and pack markup documents")]
#[command(version)]
struct Cli {
    /// Log engine internals at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report every well-formedness error in a document
    Check(CheckArgs),

    /// Pretty-print or minify a document
    Format(FormatArgs),

    /// Print a document as nested JSON objects
    Convert(ConvertArgs),

    /// Compress a document into a `.mkz` file
    Pack(PackArgs),

    /// Restore a document from a `.mkz` file
    Unpack(UnpackArgs),
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> anyhow::Result<Outcome> {
    let cwd = std::env::current_dir()?;
    let config = Config::load(&cwd)?;
    let mut stdout = std::io::stdout().lock();

    match command {
        Command::Check(args) => commands::check(&args, &config, &mut stdout),
        Command::Format(args) => commands::format(&args, &config, &mut stdout),
        Command::Convert(args) => commands::convert(&args, &config, &mut stdout),
        Command::Pack(args) => commands::pack(&args, &mut stdout),
        Command::Unpack(args) => commands::unpack(&args, &mut stdout),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(Outcome::Clean) => {}
        Ok(Outcome::Invalid) => std::process::exit(1),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}
