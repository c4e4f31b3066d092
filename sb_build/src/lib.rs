// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Builds the AST1030 secure-boot image matrix by driving `otptool`,
//! `socsec` and the UART image script once per configuration.

pub mod layout;
pub mod matrix;
pub mod orchestrator;
pub mod plan;
pub mod runner;

use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("`{command}` failed with {status}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },

    #[error("could not start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse matrix file: {0}")]
    MatrixParse(#[from] toml::de::Error),

    #[error("matrix has no configurations")]
    EmptyMatrix,

    #[error("configuration name `{0}` appears more than once")]
    DuplicateName(String),

    #[error("configuration name `{0}` is not a plain directory name")]
    InvalidName(String),

    #[error("{name}: unsupported RSA modulus size {bits}")]
    InvalidRsaBits { name: String, bits: u32 },

    #[error("{name}: unsupported SHA digest width {bits}")]
    InvalidShaBits { name: String, bits: u32 },

    #[error("{name}: encryption option must be 1 or 2, got {option:?}")]
    InvalidOption { name: String, option: Option<u8> },

    #[error("{name}: encryption option 2 requires `rsa_aes`")]
    MissingSecondaryKey { name: String },

    #[error("{name}: `option` is only valid when `encrypt` is set")]
    UnexpectedOption { name: String },

    #[error("{name}: `rsa_aes` is only valid with encryption option 2")]
    UnexpectedSecondaryKey { name: String },

    #[error("no configuration named `{0}`")]
    UnknownConfig(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}
