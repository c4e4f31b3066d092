// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::layout::Layout;
use crate::matrix::{BuildConfig, Matrix};
use crate::plan::{self, Step};
use crate::runner::CommandRunner;
use crate::Error;
use log::info;
use std::path::PathBuf;

/// What a successful run produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub commands: usize,
    pub output_dirs: Vec<PathBuf>,
}

fn execute(steps: &[Step], runner: &mut dyn CommandRunner) -> Result<usize, Error> {
    let mut commands = 0;
    for step in steps {
        info!("{step}");
        match step {
            Step::CreateDir(dir) => {
                std::fs::create_dir_all(dir).map_err(Error::io(dir))?;
            }
            Step::Copy { from, to } => {
                std::fs::copy(from, to).map_err(|source| Error::Copy {
                    from: from.clone(),
                    to: to.clone(),
                    source,
                })?;
            }
            Step::Run(cmd) => {
                runner.run(cmd)?;
                commands += 1;
            }
        }
    }
    Ok(commands)
}

/// Builds one configuration. The output root must already exist.
pub fn run_config(
    layout: &Layout,
    config: &BuildConfig,
    runner: &mut dyn CommandRunner,
) -> Result<usize, Error> {
    info!("=== {config} ===");
    execute(&plan::plan_config(layout, config), runner)
}

/// Builds every configuration in table order, stopping at the first
/// failure. Partially written output directories are left in place.
pub fn run_all(
    layout: &Layout,
    matrix: &Matrix,
    runner: &mut dyn CommandRunner,
) -> Result<Report, Error> {
    let root = layout.output_root();
    info!("{}", Step::CreateDir(root.clone()));
    std::fs::create_dir_all(&root).map_err(Error::io(&root))?;

    let mut report = Report::default();
    for config in matrix {
        report.commands += run_config(layout, config, runner)?;
        report.output_dirs.push(layout.output_dir(config));
    }
    Ok(report)
}

/// Inputs the build would read that are not present on disk.
pub fn preflight(layout: &Layout, matrix: &Matrix) -> Vec<PathBuf> {
    plan::inputs(layout, matrix)
        .into_iter()
        .filter(|p| !p.is_file())
        .collect()
}
