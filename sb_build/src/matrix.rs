// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::Error;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// RSA modulus sizes accepted by `socsec`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RsaBits {
    Rsa2048,
    Rsa3072,
    Rsa4096,
}

impl RsaBits {
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            2048 => Some(Self::Rsa2048),
            3072 => Some(Self::Rsa3072),
            4096 => Some(Self::Rsa4096),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::Rsa2048 => 2048,
            Self::Rsa3072 => 3072,
            Self::Rsa4096 => 4096,
        }
    }
}

/// SHA-2 digest widths accepted by `socsec`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaBits {
    Sha256,
    Sha384,
    Sha512,
}

impl ShaBits {
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            256 => Some(Self::Sha256),
            384 => Some(Self::Sha384),
            512 => Some(Self::Sha512),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::Sha256 => 256,
            Self::Sha384 => 384,
            Self::Sha512 => 512,
        }
    }
}

/// How the bootloader image is protected beyond its RSA signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Encryption {
    /// Signed only.
    None,
    /// AES encrypted, with the AES key provisioned in OTP (option 1).
    OtpKey,
    /// AES encrypted, with the AES key wrapped by an RSA key (option 2).
    /// `key` is a file name inside the key folder.
    RsaAes { key: String },
}

impl Encryption {
    pub fn is_encrypted(&self) -> bool {
        !matches!(self, Encryption::None)
    }
}

/// One entry of the build matrix; names an output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    name: String,
    rsa: RsaBits,
    sha: ShaBits,
    encryption: Encryption,
    otp: String,
}

impl BuildConfig {
    pub fn new(
        name: impl Into<String>,
        rsa: RsaBits,
        sha: ShaBits,
        encryption: Encryption,
        otp: impl Into<String>,
    ) -> Result<Self, Error> {
        let name = name.into();
        if !is_plain_component(&name) {
            return Err(Error::InvalidName(name));
        }
        Ok(Self {
            name,
            rsa,
            sha,
            encryption,
            otp: otp.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rsa(&self) -> RsaBits {
        self.rsa
    }

    pub fn sha(&self) -> ShaBits {
        self.sha
    }

    pub fn encryption(&self) -> &Encryption {
        &self.encryption
    }

    /// File name of the OTP template, relative to the OTP config directory.
    pub fn otp(&self) -> &str {
        &self.otp
    }

    /// The `--algorithm` value passed to `socsec make_secure_bl1_image`.
    pub fn algorithm(&self) -> String {
        let alg = format!("RSA{}_SHA{}", self.rsa.bits(), self.sha.bits());
        if self.encryption.is_encrypted() {
            format!("AES_{alg}")
        } else {
            alg
        }
    }
}

impl fmt::Display for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enc = match &self.encryption {
            Encryption::None => "unencrypted".to_string(),
            Encryption::OtpKey => "AES key in OTP".to_string(),
            Encryption::RsaAes { key } => format!("AES key wrapped by {key}"),
        };
        write!(f, "{} ({}, {enc})", self.name, self.algorithm())
    }
}

fn is_plain_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}

/// An entry as written in a matrix file. Field names follow the
/// historical build table.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBuildConfig {
    pub name: String,
    #[serde(default)]
    pub encrypt: bool,
    pub option: Option<u8>,
    pub rsa: u32,
    pub sha: u32,
    pub otp: String,
    pub rsa_aes: Option<String>,
}

impl TryFrom<RawBuildConfig> for BuildConfig {
    type Error = Error;

    fn try_from(raw: RawBuildConfig) -> Result<Self, Error> {
        let name = raw.name;
        let rsa = RsaBits::from_bits(raw.rsa).ok_or_else(|| Error::InvalidRsaBits {
            name: name.clone(),
            bits: raw.rsa,
        })?;
        let sha = ShaBits::from_bits(raw.sha).ok_or_else(|| Error::InvalidShaBits {
            name: name.clone(),
            bits: raw.sha,
        })?;

        let encryption = match (raw.encrypt, raw.option, raw.rsa_aes) {
            (false, None, None) => Encryption::None,
            (false, Some(_), _) => return Err(Error::UnexpectedOption { name }),
            (false, None, Some(_)) => return Err(Error::UnexpectedSecondaryKey { name }),
            (true, Some(1), None) => Encryption::OtpKey,
            (true, Some(1), Some(_)) => return Err(Error::UnexpectedSecondaryKey { name }),
            (true, Some(2), Some(key)) => Encryption::RsaAes { key },
            (true, Some(2), None) => return Err(Error::MissingSecondaryKey { name }),
            (true, option, _) => return Err(Error::InvalidOption { name, option }),
        };

        BuildConfig::new(name, rsa, sha, encryption, raw.otp)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MatrixFile {
    config: Vec<RawBuildConfig>,
}

/// (name, rsa, sha, option, rsa_aes); the OTP template is
/// `1030A0_<name>.json`.
type TableEntry = (&'static str, u32, u32, Option<u8>, Option<&'static str>);

#[rustfmt::skip]
const AST1030_TABLE: [TableEntry; 12] = [
    ("RSA2048_SHA256",         2048, 256, None,    None),
    ("RSA2048_SHA256_o1",      2048, 256, Some(1), None),
    ("RSA2048_SHA256_o2_pub",  2048, 256, Some(2), Some("test_soc_private_key_2048.pem")),
    ("RSA2048_SHA256_o2_priv", 2048, 256, Some(2), Some("test_soc_public_key_2048.pem")),
    ("RSA3072_SHA384",         3072, 384, None,    None),
    ("RSA3072_SHA384_o1",      3072, 384, Some(1), None),
    ("RSA3072_SHA384_o2_pub",  3072, 384, Some(2), Some("test_soc_private_key_3072.pem")),
    ("RSA3072_SHA384_o2_priv", 3072, 384, Some(2), Some("test_soc_public_key_3072.pem")),
    ("RSA4096_SHA512",         4096, 512, None,    None),
    ("RSA4096_SHA512_o1",      4096, 512, Some(1), None),
    ("RSA4096_SHA512_o2_pub",  4096, 512, Some(2), Some("test_soc_private_key_4096.pem")),
    ("RSA4096_SHA512_o2_priv", 4096, 512, Some(2), Some("test_soc_public_key_4096.pem")),
];

/// Ordered set of build configurations with unique names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matrix {
    configs: Vec<BuildConfig>,
}

impl Matrix {
    pub fn new(configs: Vec<BuildConfig>) -> Result<Self, Error> {
        if configs.is_empty() {
            return Err(Error::EmptyMatrix);
        }
        let mut seen = HashSet::new();
        for c in &configs {
            if !seen.insert(c.name()) {
                return Err(Error::DuplicateName(c.name().to_string()));
            }
        }
        Ok(Self { configs })
    }

    /// The stock AST1030 A0 matrix: every RSA/SHA pairing, each
    /// unencrypted, with option 1, and with both option 2 key variants.
    pub fn ast1030() -> Result<Self, Error> {
        let configs = AST1030_TABLE
            .iter()
            .map(|&(name, rsa, sha, option, rsa_aes)| {
                BuildConfig::try_from(RawBuildConfig {
                    name: name.to_string(),
                    encrypt: option.is_some(),
                    option,
                    rsa,
                    sha,
                    otp: format!("1030A0_{name}.json"),
                    rsa_aes: rsa_aes.map(str::to_string),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(configs)
    }

    /// Parses a TOML matrix made of `[[config]]` tables.
    pub fn from_toml(s: &str) -> Result<Self, Error> {
        let file: MatrixFile = toml::from_str(s)?;
        let configs = file
            .config
            .into_iter()
            .map(BuildConfig::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(configs)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(Error::io(path))?;
        Self::from_toml(&contents)
    }

    /// Restricts the matrix to `names`, keeping table order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, Error> {
        for n in names {
            let n = n.as_ref();
            if self.get(n).is_none() {
                return Err(Error::UnknownConfig(n.to_string()));
            }
        }
        let configs = self
            .configs
            .iter()
            .filter(|c| names.iter().any(|n| n.as_ref() == c.name()))
            .cloned()
            .collect();
        Self::new(configs)
    }

    pub fn get(&self, name: &str) -> Option<&BuildConfig> {
        self.configs.iter().find(|c| c.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BuildConfig> {
        self.configs.iter()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl<'a> IntoIterator for &'a Matrix {
    type Item = &'a BuildConfig;
    type IntoIter = std::slice::Iter<'a, BuildConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
