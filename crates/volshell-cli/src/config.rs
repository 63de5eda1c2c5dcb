//! Shell configuration file (`volshell.toml`).
//!
//! ```toml
//! primary = "memory"
//! default_count = 128
//! types = "symbols/ntkrnlmp.json"
//!
//! [[layers]]
//! name = "memory"
//! path = "images/physical.raw"
//! architecture = "other"
//!
//! [[layers]]
//! name = "kernel"
//! path = "images/kernel-space.raw"
//! base = "0xfffff80000000000"
//! architecture = "intel64"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use volshell_core::{DEFAULT_READ_COUNT, LayerArchitecture, parse_number};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Layer the session starts on. Defaults to the first configured layer.
    pub primary: Option<String>,
    pub default_count: usize,
    /// Type layout export used by `describe-type`.
    pub types: Option<PathBuf>,
    pub layers: Vec<LayerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary: None,
            default_count: DEFAULT_READ_COUNT,
            types: None,
            layers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    pub path: PathBuf,
    /// Address of the first byte of the image, as an integer or a
    /// `"0x..."` string (TOML integers stop at `i64::MAX`).
    #[serde(default, deserialize_with = "deserialize_address")]
    pub base: u64,
    #[serde(default)]
    pub architecture: LayerArchitecture,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Address {
    Number(u64),
    Text(String),
}

fn deserialize_address<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<u64, D::Error> {
    match Address::deserialize(deserializer)? {
        Address::Number(value) => Ok(value),
        Address::Text(text) => parse_number(&text).map_err(serde::de::Error::custom),
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
