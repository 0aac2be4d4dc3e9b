//! `bnd-layered` command line.
//!
//! Reads `bnd-layered.toml`, loads the declaration tree it names and writes
//! one module directory with the six binding sections (types, raw externs,
//! marshaling helpers, callbacks, wrappers, extensions).

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// Turn a parsed C/C++ declaration tree into layered Rust FFI bindings:
/// `repr(C)` types, `extern` declarations, marshaling helpers, callback types
/// and safe wrappers.
#[derive(Parser, Debug)]
#[command(name = "bnd-layered", version, about)]
struct Cli {
    /// Generator config naming the namespace, native library and declaration
    /// tree file.
    #[arg(default_value = "bnd-layered.toml")]
    config: PathBuf,

    /// Directory the module directory is written into (overrides
    /// `output_dir` from the config).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bnd_layered=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let written = bnd_layered::run(&cli.config, cli.output.as_deref())?;
    println!("{}", written.display());
    Ok(())
}
