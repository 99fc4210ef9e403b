use anyhow::{Context, Result};
use rustdoc_types::Crate;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::crate_spec::CrateSpec;
use crate::docfetch::{fetch_docs, load_local_docs};
use crate::version_resolver::VersionResolver;

/// Where the rustdoc JSON of one unit comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitSource {
    /// A rustdoc JSON file on disk, optionally zstd-compressed.
    File(PathBuf),
    /// A crate, resolved through the workspace or downloaded from docs.rs.
    Crate(CrateSpec),
}

impl UnitSource {
    pub fn parse(input: &str) -> Result<Self> {
        let path = Path::new(input);
        if input.ends_with(".json") || input.ends_with(".json.zst") || path.is_file() {
            return Ok(UnitSource::File(path.to_path_buf()));
        }
        Ok(UnitSource::Crate(CrateSpec::parse(input)?))
    }

    pub fn label(&self) -> String {
        match self {
            UnitSource::File(path) => path.display().to_string(),
            UnitSource::Crate(spec) => spec.label(),
        }
    }

    /// Whether loading needs `cargo metadata` to pick a version.
    pub fn needs_resolver(&self) -> bool {
        matches!(self, UnitSource::Crate(CrateSpec { version: None, .. }))
    }

    pub fn load(&self, resolver: Option<&VersionResolver>, use_cache: bool) -> Result<Crate> {
        let spec = match self {
            UnitSource::File(path) => return load_local_docs(path),
            UnitSource::Crate(spec) => spec,
        };

        if let Some(version) = &spec.version {
            return fetch_docs(&spec.name, version, use_cache);
        }

        if let Some(resolver) = resolver {
            if let Some(path) = resolver.get_local_crate_doc_path(&spec.name) {
                info!(path = %path.display(), "using local workspace crate");
                return load_local_docs(&path);
            }
            if resolver.is_local_crate(&spec.name) {
                anyhow::bail!(
                    "No rustdoc JSON for workspace crate '{}'; build it with \
                     `cargo +nightly rustdoc -p {} -- -Z unstable-options --output-format json`",
                    spec.name,
                    spec.name
                );
            }
            if let Some(version) = resolver.resolve_version(&spec.name) {
                info!(crate_name = %spec.name, %version, "version from Cargo.lock");
                return fetch_docs(&spec.name, &version, use_cache);
            }
        }

        fetch_docs(&spec.name, "latest", use_cache)
            .with_context(|| format!("No version given for '{}', tried latest", spec.name))
    }
}

impl FromStr for UnitSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_paths_are_files() {
        assert_eq!(
            UnitSource::parse("target/doc/chacha.json").unwrap(),
            UnitSource::File(PathBuf::from("target/doc/chacha.json"))
        );
        assert_eq!(
            UnitSource::parse("byteorder.json.zst").unwrap(),
            UnitSource::File(PathBuf::from("byteorder.json.zst"))
        );
    }

    #[test]
    fn existing_file_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystream");
        std::fs::write(&path, "{}").unwrap();
        let input = path.to_str().unwrap();
        assert_eq!(UnitSource::parse(input).unwrap(), UnitSource::File(path.clone()));
    }

    #[test]
    fn everything_else_is_a_crate() {
        let source = UnitSource::parse("byteorder@1.5.0").unwrap();
        assert_eq!(source.label(), "byteorder@1.5.0");
        assert!(!source.needs_resolver());
        assert!(UnitSource::parse("byteorder").unwrap().needs_resolver());
    }

    #[test]
    fn invalid_crate_spec() {
        let err = UnitSource::parse("@1.0").unwrap_err();
        assert_eq!(err.to_string(), "Crate name cannot be empty");
    }
}
