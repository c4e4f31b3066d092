// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Turns build configurations into an ordered list of steps. Nothing here
//! touches the filesystem.

use crate::layout::{Layout, KEY_INDICES, SIGN_SOC, VERIFY_SOC};
use crate::matrix::{BuildConfig, Encryption, Matrix};
use command_run::Command;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub enum Step {
    /// `mkdir -p`
    CreateDir(PathBuf),
    Copy { from: PathBuf, to: PathBuf },
    Run(Command),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::CreateDir(p) => write!(f, "mkdir -p {}", p.display()),
            Step::Copy { from, to } => write!(f, "cp {} {}", from.display(), to.display()),
            Step::Run(cmd) => f.write_str(&cmd.command_line_lossy()),
        }
    }
}

/// A command run from the root with its output captured. The orchestrator
/// logs the command line itself.
fn tool(layout: &Layout, program: &Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.set_dir(layout.root()).enable_capture();
    cmd.log_command = false;
    cmd
}

fn otp_image_cmd(layout: &Layout, config: &BuildConfig) -> Command {
    let mut cmd = tool(layout, &layout.tools().otptool);
    cmd.add_arg("make_otp_image")
        .add_arg(layout.otp_template(config))
        .add_arg("--key_folder")
        .add_arg(layout.key_folder())
        .add_arg("--output_folder")
        .add_arg(layout.output_dir(config));
    cmd
}

fn sign_cmd(layout: &Layout, config: &BuildConfig, kid: u8) -> Command {
    let mut cmd = tool(layout, &layout.tools().socsec);
    cmd.add_args(["make_secure_bl1_image", "--soc", SIGN_SOC, "--algorithm"])
        .add_arg(config.algorithm())
        .add_arg("--bl1_image")
        .add_arg(layout.image())
        .add_arg("--output")
        .add_arg(layout.signed_image(config, kid))
        .add_arg("--rsa_sign_key")
        .add_arg(layout.signing_key(config.rsa(), kid));

    match config.encryption() {
        Encryption::None => {}
        Encryption::OtpKey => {
            cmd.add_arg("--aes_key")
                .add_arg(layout.aes_key())
                .add_arg("--key_in_otp");
        }
        Encryption::RsaAes { key } => {
            cmd.add_arg("--aes_key")
                .add_arg(layout.aes_key())
                .add_arg("--rsa_aes")
                .add_arg(layout.secondary_key(key));
        }
    }
    cmd
}

fn verify_cmd(layout: &Layout, config: &BuildConfig, kid: u8) -> Command {
    let mut cmd = tool(layout, &layout.tools().socsec);
    cmd.add_args(["verify", "--soc", VERIFY_SOC, "--sec_image"])
        .add_arg(layout.signed_image(config, kid))
        .add_arg("--otp_image")
        .add_arg(layout.otp_image(config));
    cmd
}

fn uart_cmd(layout: &Layout, input: PathBuf, output: PathBuf) -> Command {
    let mut cmd = tool(layout, &layout.uart_script());
    cmd.add_args([input, output]);
    cmd
}

/// Steps for a single configuration, in execution order.
pub fn plan_config(layout: &Layout, config: &BuildConfig) -> Vec<Step> {
    let mut steps = vec![
        Step::CreateDir(layout.output_dir(config)),
        Step::Run(otp_image_cmd(layout, config)),
    ];

    for kid in KEY_INDICES {
        steps.push(Step::Run(sign_cmd(layout, config, kid)));
        steps.push(Step::Run(verify_cmd(layout, config, kid)));
        steps.push(Step::Run(uart_cmd(
            layout,
            layout.signed_image(config, kid),
            layout.signed_uart_image(config, kid),
        )));
    }

    steps.push(Step::Copy {
        from: layout.image(),
        to: layout.plain_image(config),
    });
    steps.push(Step::Run(uart_cmd(
        layout,
        layout.image(),
        layout.plain_uart_image(config),
    )));

    steps
}

/// Steps for the whole matrix, in table order.
pub fn plan_all(layout: &Layout, matrix: &Matrix) -> Vec<Step> {
    let mut steps = vec![Step::CreateDir(layout.output_root())];
    for config in matrix {
        steps.extend(plan_config(layout, config));
    }
    steps
}

/// Every file the plan reads but does not produce, deduplicated, in first
/// use order.
pub fn inputs(layout: &Layout, matrix: &Matrix) -> Vec<PathBuf> {
    let mut paths = vec![layout.image(), layout.uart_script()];
    for config in matrix {
        paths.push(layout.otp_template(config));
        for kid in KEY_INDICES {
            paths.push(layout.signing_key(config.rsa(), kid));
        }
        match config.encryption() {
            Encryption::None => {}
            Encryption::OtpKey => paths.push(layout.aes_key()),
            Encryption::RsaAes { key } => {
                paths.push(layout.aes_key());
                paths.push(layout.secondary_key(key));
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));
    paths
}
