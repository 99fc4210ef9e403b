use anyhow::{Result, bail};
use std::str::FromStr;

use crate::util::normalize_crate_name;

/// A crate to index, with an optional version.
///
/// Syntax: `crate[@version]`
///
/// Examples:
/// - `byteorder` → name="byteorder", version=None
/// - `rand-chacha@0.3.1` → name="rand_chacha", version=Some("0.3.1")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrateSpec {
    pub name: String,
    pub version: Option<String>,
}

impl CrateSpec {
    pub fn parse(input: &str) -> Result<Self> {
        let (name, version) = match input.split_once('@') {
            Some((name, version)) => (name, Some(version)),
            None => (input, None),
        };

        if name.trim().is_empty() {
            bail!("Crate name cannot be empty");
        }
        if name.contains("::") {
            bail!("Expected a crate name, found the path '{}'", name);
        }
        if let Some(v) = version
            && v.trim().is_empty()
        {
            bail!("Version cannot be empty after '@'");
        }

        Ok(CrateSpec {
            name: normalize_crate_name(name.trim()),
            version: version.map(|v| v.trim().to_string()),
        })
    }

    /// `name` or `name@version`, as shown in the report.
    pub fn label(&self) -> String {
        match &self.version {
            Some(version) => format!("{}@{}", self.name, version),
            None => self.name.clone(),
        }
    }
}

impl FromStr for CrateSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
