// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::Error;
use command_run::Command;
use log::debug;

/// Executes external programs on behalf of the orchestrator.
pub trait CommandRunner {
    fn run(&mut self, cmd: &Command) -> Result<(), Error>;
}

/// Runs each command to completion. Captured output is logged at debug
/// level on success and returned in the error on failure.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, cmd: &Command) -> Result<(), Error> {
        match cmd.run() {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                for line in stdout.lines().chain(stderr.lines()) {
                    debug!("  {line}");
                }
                Ok(())
            }
            Err(command_run::Error::Launch(source)) => Err(Error::Spawn {
                command: cmd.command_line_lossy(),
                source,
            }),
            Err(command_run::Error::Exit(exit)) => Err(Error::CommandFailed {
                command: cmd.command_line_lossy(),
                status: exit.output.status,
                stdout: String::from_utf8_lossy(&exit.output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&exit.output.stderr).into_owned(),
            }),
        }
    }
}

/// Records commands instead of running them.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub commands: Vec<Command>,
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, cmd: &Command) -> Result<(), Error> {
        self.commands.push(cmd.clone());
        Ok(())
    }
}
