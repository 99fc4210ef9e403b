use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use rustdoc_types::Crate;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load a local rustdoc JSON file, zstd-compressed when it ends in `.zst`.
pub fn load_local_docs(path: &Path) -> Result<Crate> {
    let data = fs::read(path)
        .with_context(|| format!("Failed to read local rustdoc JSON at {}", path.display()))?;

    let json_data = if path.extension().is_some_and(|ext| ext == "zst") {
        zstd::decode_all(&data[..]).context("Failed to decompress zstd data")?
    } else {
        data
    };

    let krate: Crate = serde_json::from_slice(&json_data)
        .with_context(|| format!("Failed to parse rustdoc JSON at {}", path.display()))?;

    Ok(krate)
}

/// Fetch the rustdoc JSON of a published crate from docs.rs
pub fn fetch_docs(crate_name: &str, version: &str, use_cache: bool) -> Result<Crate> {
    let compressed_data = if use_cache {
        match load_from_cache(crate_name, version) {
            Ok(data) => {
                debug!(crate_name, version, "using cached rustdoc JSON");
                data
            }
            Err(_) => download_and_cache(crate_name, version)?,
        }
    } else {
        download_rustdoc_json(crate_name, version)?
    };

    let decompressed_data =
        zstd::decode_all(&compressed_data[..]).context("Failed to decompress zstd data")?;

    let krate: Crate =
        serde_json::from_slice(&decompressed_data).context("Failed to parse rustdoc JSON")?;

    Ok(krate)
}

/// Get the cache directory path for rustdoc JSON files
fn get_cache_dir() -> Result<PathBuf> {
    let proj_dirs =
        ProjectDirs::from("", "", "implgen").context("Failed to determine cache directory")?;
    Ok(proj_dirs.cache_dir().to_path_buf())
}

/// Allows alphanumeric characters, hyphens, underscores, dots, and plus signs.
fn is_valid_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '+'
}

/// Validate that a string is safe to use as a path component.
fn validate_path_component(value: &str, component_name: &str) -> Result<()> {
    let Some(first_char) = value.chars().next() else {
        bail!("{} cannot be empty", component_name);
    };

    if value.contains('/') || value.contains('\\') {
        bail!("{} contains invalid path separator", component_name);
    }

    if value == "." || value == ".." || value.contains("..") {
        bail!("{} contains invalid path component", component_name);
    }

    if !first_char.is_ascii_alphanumeric() || !value.chars().all(is_valid_path_char) {
        bail!(
            "{} contains invalid characters (allowed: alphanumeric, hyphen, underscore, dot, plus)",
            component_name
        );
    }

    Ok(())
}

/// Get the cache file path for a specific crate and version.
fn get_cache_path(crate_name: &str, version: &str) -> Result<PathBuf> {
    validate_path_component(crate_name, "crate name")?;
    validate_path_component(version, "version")?;

    let cache_dir = get_cache_dir()?;
    let canonical_cache_dir = cache_dir
        .canonicalize()
        .unwrap_or_else(|_| cache_dir.clone());

    let safe_cache_path = canonical_cache_dir
        .join(crate_name)
        .join(format!("{}.zst", version));

    if !safe_cache_path.starts_with(&canonical_cache_dir) {
        bail!("Path traversal detected: resulting path escapes cache directory");
    }

    Ok(safe_cache_path)
}

fn load_from_cache(crate_name: &str, version: &str) -> Result<Vec<u8>> {
    let cache_path = get_cache_path(crate_name, version)?;
    fs::read(&cache_path).context("Cache miss")
}

fn save_to_cache(crate_name: &str, version: &str, data: &[u8]) -> Result<()> {
    let cache_path = get_cache_path(crate_name, version)?;

    if let Some(parent) = cache_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&cache_path, data).context("Failed to save to cache")?;
    debug!(path = %cache_path.display(), "saved to cache");
    Ok(())
}

/// Download rustdoc JSON from docs.rs
fn download_rustdoc_json(crate_name: &str, version: &str) -> Result<Vec<u8>> {
    let url = format!("https://docs.rs/crate/{}/{}/json", crate_name, version);
    info!(%url, "fetching rustdoc JSON from docs.rs");

    let mut response = ureq::get(&url)
        .call()
        .with_context(|| format!("Failed to download {}", url))?;

    let mut compressed_data = Vec::new();
    response
        .body_mut()
        .as_reader()
        .read_to_end(&mut compressed_data)?;
    debug!(bytes = compressed_data.len(), "downloaded compressed rustdoc JSON");

    Ok(compressed_data)
}

fn download_and_cache(crate_name: &str, version: &str) -> Result<Vec<u8>> {
    let compressed_data = download_rustdoc_json(crate_name, version)?;

    if let Err(e) = save_to_cache(crate_name, version, &compressed_data) {
        warn!("Failed to cache data: {e:#}");
    }

    Ok(compressed_data)
}

/// Clear the entire cache directory. Returns the directory if there was one.
pub fn clear_cache() -> Result<Option<PathBuf>> {
    let cache_dir = get_cache_dir()?;

    if !cache_dir.exists() {
        return Ok(None);
    }
    fs::remove_dir_all(&cache_dir).context("Failed to clear cache")?;
    Ok(Some(cache_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path_component_valid() {
        assert!(validate_path_component("byteorder", "crate name").is_ok());
        assert!(validate_path_component("rand_chacha", "crate name").is_ok());
        assert!(validate_path_component("my-crate", "crate name").is_ok());

        assert!(validate_path_component("1.0.0", "version").is_ok());
        assert!(validate_path_component("0.1.0-beta.1", "version").is_ok());
        assert!(validate_path_component("1.0.0+build123", "version").is_ok());
        assert!(validate_path_component("latest", "version").is_ok());
    }

    #[test]
    fn test_validate_path_component_empty() {
        let result = validate_path_component("", "crate name");
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_validate_path_component_path_separator() {
        assert!(validate_path_component("../etc", "crate name").is_err());

        let result = validate_path_component("foo/bar", "crate name");
        assert!(result.unwrap_err().to_string().contains("path separator"));

        let result = validate_path_component("..\\etc", "crate name");
        assert!(result.unwrap_err().to_string().contains("path separator"));
    }

    #[test]
    fn test_validate_path_component_path_traversal() {
        let result = validate_path_component("..", "crate name");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("invalid path component")
        );
        assert!(validate_path_component(".", "crate name").is_err());
    }

    #[test]
    fn test_validate_path_component_invalid_chars() {
        let result = validate_path_component("-foo", "crate name");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("invalid characters")
        );
        assert!(validate_path_component("foo@bar", "crate name").is_err());
        assert!(validate_path_component("foo bar", "crate name").is_err());
    }

    #[test]
    fn test_get_cache_path_valid() {
        let path = get_cache_path("byteorder", "1.5.0").unwrap();
        assert!(path.to_string_lossy().contains("byteorder"));
        assert!(path.to_string_lossy().ends_with("1.5.0.zst"));
    }

    #[test]
    fn test_get_cache_path_path_traversal_rejected() {
        assert!(get_cache_path("../../../etc", "passwd").is_err());
        assert!(get_cache_path("byteorder", "../../../etc/passwd").is_err());
        assert!(get_cache_path("foo/bar", "1.0.0").is_err());
    }

    #[test]
    fn test_load_local_docs_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = load_local_docs(&missing).unwrap_err().to_string();
        assert!(err.starts_with("Failed to read local rustdoc JSON at"), "{err}");

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{}").unwrap();
        let err = load_local_docs(&broken).unwrap_err().to_string();
        assert!(err.starts_with("Failed to parse rustdoc JSON at"), "{err}");
    }

    #[test]
    fn test_load_local_docs_rejects_bad_zstd() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crate.json.zst");
        fs::write(&path, b"not zstd").unwrap();
        let err = load_local_docs(&path).unwrap_err().to_string();
        assert_eq!(err, "Failed to decompress zstd data");
    }
}
