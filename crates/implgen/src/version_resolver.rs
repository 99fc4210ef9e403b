use anyhow::{Context, Result};
use cargo_metadata::{Metadata, MetadataCommand};
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

use crate::util::normalize_crate_name;

/// Answers version and location questions about crates from the nearest
/// Cargo workspace.
pub struct VersionResolver {
    metadata: Metadata,
}

impl VersionResolver {
    /// Create a new VersionResolver by finding and loading the nearest Cargo.toml
    pub fn new() -> Result<Self> {
        let manifest_path = Self::find_cargo_toml()
            .context("No Cargo.toml found in current directory or parent directories")?;

        let metadata = MetadataCommand::new()
            .manifest_path(&manifest_path)
            .exec()
            .context("Failed to execute cargo metadata")?;

        Ok(Self { metadata })
    }

    fn find_cargo_toml() -> Option<PathBuf> {
        let mut current_dir = env::current_dir().ok()?;

        loop {
            let manifest_path = current_dir.join("Cargo.toml");
            if manifest_path.exists() {
                return Some(manifest_path);
            }
            if !current_dir.pop() {
                return None;
            }
        }
    }

    /// The exact version Cargo.lock resolved for a dependency of a workspace
    /// member, e.g. "1.5.0" for a requirement of "^1".
    pub fn resolve_version(&self, crate_name: &str) -> Option<String> {
        let resolve = self.metadata.resolve.as_ref()?;
        let resolved_ids: HashSet<_> = resolve.nodes.iter().map(|node| &node.id).collect();

        let is_dependency = self
            .metadata
            .packages
            .iter()
            .filter(|package| self.metadata.workspace_members.contains(&package.id))
            .flat_map(|package| &package.dependencies)
            .any(|dep| normalize_crate_name(&dep.name) == crate_name);
        if !is_dependency {
            return None;
        }

        self.metadata
            .packages
            .iter()
            .find(|pkg| {
                normalize_crate_name(&pkg.name) == crate_name && resolved_ids.contains(&pkg.id)
            })
            .map(|pkg| pkg.version.to_string())
    }

    /// Check if a crate is a local workspace member
    pub fn is_local_crate(&self, crate_name: &str) -> bool {
        self.metadata.workspace_members.iter().any(|member_id| {
            self.metadata
                .packages
                .iter()
                .any(|pkg| pkg.id == *member_id && normalize_crate_name(&pkg.name) == crate_name)
        })
    }

    /// `target/doc/<crate>.json` of a workspace member, if it has been built
    /// with `cargo +nightly rustdoc -- -Z unstable-options --output-format json`.
    pub fn get_local_crate_doc_path(&self, crate_name: &str) -> Option<PathBuf> {
        if !self.is_local_crate(crate_name) {
            return None;
        }

        let doc_path: PathBuf = self
            .metadata
            .target_directory
            .join("doc")
            .join(format!("{}.json", crate_name))
            .into();

        doc_path.exists().then_some(doc_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_cargo_toml_in_current_project() {
        let path = VersionResolver::find_cargo_toml().unwrap();
        assert!(path.exists());
        assert!(path.ends_with("Cargo.toml"));
    }

    #[test]
    fn test_resolve_version_for_known_dependency() {
        let resolver = VersionResolver::new().unwrap();
        let version = resolver.resolve_version("clap").unwrap();
        assert!(version.starts_with("4."));
        assert!(!version.contains('^'));
    }

    #[test]
    fn test_resolve_version_for_unknown_crate() {
        let resolver = VersionResolver::new().unwrap();
        assert!(resolver.resolve_version("some_unknown_crate_xyz").is_none());
    }

    #[test]
    fn test_workspace_members_are_local() {
        let resolver = VersionResolver::new().unwrap();
        assert!(resolver.is_local_crate("implindex"));
        assert!(!resolver.is_local_crate("clap"));
    }
}
