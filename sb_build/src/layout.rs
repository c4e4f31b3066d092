// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::matrix::{BuildConfig, RsaBits};
use std::path::{Path, PathBuf};

/// SoC id given to `socsec make_secure_bl1_image`.
pub const SIGN_SOC: &str = "1030";
/// SoC id given to `socsec verify`; OTP templates target the A0 stepping.
pub const VERIFY_SOC: &str = "1030A0";

/// Each configuration is signed once with each of the three OEM keys.
pub const KEY_INDICES: [u8; 3] = [0, 1, 2];

const BOARD_DIR: &str = "boards/arm/ast1030_evb";

/// External programs invoked by the build.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::Parser))]
pub struct Tools {
    /// OTP image generator
    #[cfg_attr(feature = "clap", clap(long, default_value = "otptool"))]
    pub otptool: PathBuf,
    /// Secure bootloader image signer and verifier
    #[cfg_attr(feature = "clap", clap(long, default_value = "socsec"))]
    pub socsec: PathBuf,
}

impl Tools {
    /// Anchors relative tool paths such as `./bin/socsec` at `cwd`. Tools
    /// run from the root directory, so a relative path would otherwise be
    /// looked up there. Bare names are left for `PATH` lookup.
    pub fn resolve(self, cwd: &Path) -> Self {
        let anchor = |p: PathBuf| {
            if p.is_relative() && p.components().count() > 1 {
                cwd.join(p)
            } else {
                p
            }
        };
        Self {
            otptool: anchor(self.otptool),
            socsec: anchor(self.socsec),
        }
    }
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            otptool: PathBuf::from("otptool"),
            socsec: PathBuf::from("socsec"),
        }
    }
}

/// Where every input and output of the build lives, relative to a
/// Zephyr application root.
#[derive(Clone, Debug)]
pub struct Layout {
    root: PathBuf,
    tools: Tools,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, tools: Tools) -> Self {
        Self {
            root: root.into(),
            tools,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tools(&self) -> &Tools {
        &self.tools
    }

    fn board(&self) -> PathBuf {
        self.root.join(BOARD_DIR)
    }

    /// The unsigned Zephyr image.
    pub fn image(&self) -> PathBuf {
        self.root.join("build/zephyr/zephyr.bin")
    }

    pub fn key_folder(&self) -> PathBuf {
        self.board().join("key")
    }

    pub fn aes_key(&self) -> PathBuf {
        self.key_folder().join("test_aes_key.bin")
    }

    pub fn signing_key(&self, rsa: RsaBits, kid: u8) -> PathBuf {
        self.key_folder()
            .join(format!("test_oem_dss_private_key_{}_{kid}.pem", rsa.bits()))
    }

    pub fn secondary_key(&self, key: &str) -> PathBuf {
        self.key_folder().join(key)
    }

    pub fn otp_template(&self, config: &BuildConfig) -> PathBuf {
        self.board().join("otp_config").join(config.otp())
    }

    pub fn uart_script(&self) -> PathBuf {
        self.board().join("tools/gen_uart_booting_image.sh")
    }

    pub fn output_root(&self) -> PathBuf {
        self.root.join("build/sb_bin")
    }

    pub fn output_dir(&self, config: &BuildConfig) -> PathBuf {
        self.output_root().join(config.name())
    }

    /// Written by `otptool` into the output directory.
    pub fn otp_image(&self, config: &BuildConfig) -> PathBuf {
        self.output_dir(config).join("otp-all.image")
    }

    pub fn signed_image(&self, config: &BuildConfig, kid: u8) -> PathBuf {
        self.output_dir(config).join(format!("sec_zephyr_{kid}.bin"))
    }

    pub fn signed_uart_image(&self, config: &BuildConfig, kid: u8) -> PathBuf {
        self.output_dir(config)
            .join(format!("sec_uart_zephyr_{kid}.bin"))
    }

    pub fn plain_image(&self, config: &BuildConfig) -> PathBuf {
        self.output_dir(config).join("zephyr.bin")
    }

    pub fn plain_uart_image(&self, config: &BuildConfig) -> PathBuf {
        self.output_dir(config).join("uart_zephyr.bin")
    }
}
