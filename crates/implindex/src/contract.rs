use std::fmt::{self, Display};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ContractPathError, ShardError};

/// Directory under the output root that holds all implementor shards.
pub const SHARD_DIR: &str = "implementors";

/// Fully-qualified path of a trait, e.g. `core::marker::Sync`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContractPath {
    segments: Vec<String>,
}

impl ContractPath {
    pub fn new(segments: Vec<String>) -> Result<Self, ContractPathError> {
        if segments.is_empty() {
            return Err(ContractPathError::Empty);
        }
        if let Some(bad) = segments.iter().find(|s| !is_identifier(s)) {
            return Err(ContractPathError::InvalidSegment(bad.clone()));
        }
        Ok(Self { segments })
    }

    pub fn parse(input: &str) -> Result<Self, ContractPathError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ContractPathError::Empty);
        }
        Self::new(input.split("::").map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The trait name, shown to users.
    pub fn name(&self) -> &str {
        // `new` rejects empty paths
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Relative location of this contract's shard, e.g.
    /// `implementors/core/marker/trait.Sync.js`.
    pub fn shard_path(&self) -> PathBuf {
        self.module_dir().join(format!("trait.{}.js", self.name()))
    }

    /// Relative location of one unit's shard when shards are split per unit,
    /// e.g. `implementors/core/marker/trait.Sync/byteorder.js`.
    pub fn unit_shard_path(&self, unit: &str) -> Result<PathBuf, ShardError> {
        if !is_unit_name(unit) {
            return Err(ShardError::InvalidUnitName(unit.to_string()));
        }
        Ok(self
            .module_dir()
            .join(format!("trait.{}", self.name()))
            .join(format!("{unit}.js")))
    }

    fn module_dir(&self) -> PathBuf {
        let mut dir = PathBuf::from(SHARD_DIR);
        for segment in &self.segments[..self.segments.len() - 1] {
            dir.push(segment);
        }
        dir
    }
}

/// Rust identifier, optionally raw (`r#type`). Anything else could escape the
/// shard directory once turned into a path.
fn is_identifier(segment: &str) -> bool {
    let ident = segment.strip_prefix("r#").unwrap_or(segment);
    let mut chars = ident.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    ident != "_" && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Unit names are crate names, and end up as file names in the per-unit
/// layout.
pub(crate) fn is_unit_name(name: &str) -> bool {
    is_identifier(name)
}

impl Display for ContractPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("::"))
    }
}

impl FromStr for ContractPath {
    type Err = ContractPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
