//! pathwake - report when watched paths change
//!
//! Watches the given paths (or paths read from stdin) and prints one record
//! per change on stdout, so shell pipelines can block on "wake me when this
//! changes" instead of polling. Reports go to stdout only; diagnostics go to
//! stderr.

use std::ffi::{OsStr, OsString};
use std::io;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pw_core::{run, watch_mask, Inotify, Installer, Reporter};

mod input;
mod pipe;

/// Report when watched paths are created, overwritten, or removed
#[derive(Parser)]
#[command(name = "pathwake")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Use NUL instead of newline as the input and output separator
    #[arg(short = '0')]
    nul_delimited: bool,

    /// Also report deletions and move-aways, prefixed with "- "
    #[arg(short = 'd')]
    deletions: bool,

    /// Exit after the first reported change
    #[arg(short = 'e')]
    single_shot: bool,

    /// Suppress a report while stdout still has unread data
    #[arg(short = 'p')]
    pipe_mode: bool,

    /// Paths to watch; "-" reads more paths from stdin
    paths: Vec<OsString>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let prog = program_name();
    let delimiter = if cli.nul_delimited { 0 } else { b'\n' };

    let inotify = match Inotify::init() {
        Ok(fd) => fd,
        Err(err) => {
            eprintln!("{prog}: inotify_init: {err}");
            process::exit(111);
        }
    };

    let mut installer = Installer::new(&inotify, watch_mask(cli.deletions));
    if let Err(err) = install_targets(&mut installer, &cli.paths, delimiter, &prog) {
        eprintln!("{prog}: {err:#}");
        process::exit(1);
    }
    debug!(
        interests = installer.interest_count(),
        watches = installer.watch_count(),
        "watch installation complete"
    );
    let (interests, registry) = installer.into_parts();

    let mut reporter = Reporter::new(io::stdout().lock(), delimiter);
    let pipe_mode = cli.pipe_mode;
    let outcome = run(
        &inotify,
        &registry,
        &interests,
        &mut reporter,
        cli.single_shot,
        move || pipe_mode && pipe::stdout_backlogged(),
    );
    match outcome {
        // Only single-shot mode returns; everything else runs until killed.
        Ok(()) => process::exit(0),
        Err(err) => {
            eprintln!("{prog}: {err:#}");
            process::exit(1);
        }
    }
}

/// Install every target from the command line, pulling from stdin where "-"
/// appears, or entirely from stdin when no paths were given at all.
fn install_targets(
    installer: &mut Installer<'_>,
    paths: &[OsString],
    delimiter: u8,
    prog: &str,
) -> Result<()> {
    if paths.is_empty() {
        return install_from_stdin(installer, delimiter, prog);
    }
    for path in paths {
        if path == "-" {
            install_from_stdin(installer, delimiter, prog)?;
        } else {
            install_one(installer, path, prog);
        }
    }
    Ok(())
}

fn install_from_stdin(installer: &mut Installer<'_>, delimiter: u8, prog: &str) -> Result<()> {
    let mut stdin = io::stdin().lock();
    input::each_path(&mut stdin, delimiter, |path| install_one(installer, path, prog))
        .context("reading paths from stdin")
}

/// One bad target is reported and skipped, never fatal.
fn install_one(installer: &mut Installer<'_>, path: &OsStr, prog: &str) {
    if let Err(err) = installer.install(path) {
        eprintln!("{prog}: {err}");
    }
}

fn program_name() -> String {
    std::env::args_os()
        .next()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pathwake".to_string())
}
