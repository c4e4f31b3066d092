// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{error, info};
use sb_build::{
    layout::{Layout, Tools},
    matrix::Matrix,
    orchestrator, plan,
    runner::ProcessRunner,
    Error,
};
use std::path::{Path, PathBuf};

/// Builds signed, encrypted and UART-bootable AST1030 images for every
/// configuration in the secure-boot matrix.
#[derive(Debug, Parser)]
#[command(version)]
struct Opts {
    /// Zephyr application root containing `build/zephyr/zephyr.bin` and
    /// `boards/arm/ast1030_evb`
    root_dir: PathBuf,

    /// TOML file of `[[config]]` entries to build instead of the built-in
    /// matrix
    #[clap(long)]
    matrix: Option<PathBuf>,

    /// Only build the named configuration (may be repeated)
    #[clap(long = "only", value_name = "NAME")]
    only: Vec<String>,

    /// Print the commands that would run, without running them
    #[clap(short = 'n', long)]
    dry_run: bool,

    /// Start even if some input files are missing
    #[clap(long)]
    skip_preflight: bool,

    #[clap(flatten)]
    tools: Tools,

    /// Log captured tool output
    #[clap(short, long)]
    verbose: bool,
}

/// The banner printed for a failed tool, with whatever it wrote.
fn failure_report(err: &Error) -> Option<String> {
    let Error::CommandFailed {
        command,
        stdout,
        stderr,
        ..
    } = err
    else {
        return None;
    };

    let mut report = format!("{}: {command}\n", "FAILED".red());
    if !stdout.trim().is_empty() {
        report += &format!("{}\n{stdout}", "--- stdout ---".yellow());
    }
    if !stderr.trim().is_empty() {
        report += &format!("{}\n{stderr}", "--- stderr ---".yellow());
    }
    Some(report)
}

/// `cwd` anchors relative tool paths given on the command line.
fn run(opts: Opts, cwd: &Path) -> Result<()> {
    let root = opts
        .root_dir
        .canonicalize()
        .with_context(|| format!("could not open root {}", opts.root_dir.display()))?;

    let matrix = match &opts.matrix {
        Some(path) => {
            Matrix::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Matrix::ast1030()?,
    };
    let matrix = if opts.only.is_empty() {
        matrix
    } else {
        matrix.select(opts.only.as_slice())?
    };

    let layout = Layout::new(root, opts.tools.resolve(cwd));

    if opts.dry_run {
        for step in plan::plan_all(&layout, &matrix) {
            println!("{step}");
        }
        return Ok(());
    }

    if !opts.skip_preflight {
        let missing = orchestrator::preflight(&layout, &matrix);
        if !missing.is_empty() {
            for path in &missing {
                error!("missing input: {}", path.display());
            }
            bail!("{} input file(s) missing", missing.len());
        }
    }

    let report = orchestrator::run_all(&layout, &matrix, &mut ProcessRunner)?;

    info!(
        "built {} configuration(s) with {} command(s) under {}",
        report.output_dirs.len(),
        report.commands,
        layout.output_root().display()
    );
    Ok(())
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    let level = if opts.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let cwd = std::env::current_dir().context("could not get current directory")?;
    run(opts, &cwd).map_err(|e| {
        if let Some(report) = e.downcast_ref::<Error>().and_then(failure_report) {
            eprint!("{report}");
        }
        e
    })
}

#[cfg(all(test, unix))]
#[path = "../../sb_build/tests/common/mod.rs"]
mod common;
