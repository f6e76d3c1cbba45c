use anyhow::{Context, Result};
use clap::Args;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{emit, read_source, Outcome};

pub const PACKED_EXTENSION: &str = "mkz";

#[derive(Args, Debug)]
pub struct PackArgs {
    /// Input document
    pub path: PathBuf,

    /// Output file (defaults to `<path>.mkz`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// Packed `.mkz` file
    pub path: PathBuf,

    /// Output file (defaults to the input without `.mkz`, or stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn pack(args: &PackArgs, out: &mut dyn Write) -> Result<Outcome> {
    let source = read_source(&args.path)?;
    let packed = markedit_compress::encode(&source);

    let target = args.output.clone().unwrap_or_else(|| packed_path(&args.path));
    std::fs::write(&target, &packed).with_context(|| format!("cannot write {}", target.display()))?;

    writeln!(
        out,
        "Packed: {} ({} -> {} bytes, ratio {:.2})",
        target.display(),
        source.len(),
        packed.len(),
        markedit_compress::ratio(source.len(), packed.len())
    )?;
    Ok(Outcome::Clean)
}

pub fn unpack(args: &UnpackArgs, out: &mut dyn Write) -> Result<Outcome> {
    let data =
        std::fs::read(&args.path).with_context(|| format!("cannot read {}", args.path.display()))?;
    let text = markedit_compress::decode(&data)
        .with_context(|| format!("cannot unpack {}", args.path.display()))?;

    let target = args.output.clone().or_else(|| unpacked_path(&args.path));
    match target {
        Some(path) => {
            std::fs::write(&path, &text).with_context(|| format!("cannot write {}", path.display()))?;
            writeln!(out, "Unpacked: {}", path.display())?;
        }
        None => emit(&text, None, out)?,
    }
    Ok(Outcome::Clean)
}

/// `doc.xml` → `doc.xml.mkz`
fn packed_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(PACKED_EXTENSION);
    PathBuf::from(name)
}

/// `doc.xml.mkz` → `doc.xml`; anything else has no default.
fn unpacked_path(path: &Path) -> Option<PathBuf> {
    (path.extension()? == PACKED_EXTENSION).then(|| path.with_extension(""))
}
