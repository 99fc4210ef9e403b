use clap::{ArgAction, Parser};
use implindex::ContractPath;
use std::path::PathBuf;

use crate::color::Color;
use crate::source::UnitSource;

/// Generate trait implementor shards from rustdoc JSON
#[derive(Parser, Debug)]
#[command(name = "implgen")]
#[command(about = "Generate trait implementor shards from rustdoc JSON", long_about = None)]
#[command(after_help = "\
EXAMPLES:
  implgen target/doc/chacha.json            Index a local rustdoc JSON file
  implgen byteorder chacha keystream        Crates (versions from Cargo.toml)
  implgen byteorder@1.5.0 --split-units     One shard per trait and crate
  implgen chacha --contract core::marker::Sync")]
#[command(after_long_help = "\
UNITS:
  A unit is either a rustdoc JSON file (`.json` or `.json.zst`) or a crate
  name with an optional version. Crates without a version are resolved:

  1. Workspace member     Uses target/doc/<crate>.json
  2. Dependency           Uses the version from Cargo.lock
  3. Not found            Falls back to the latest version on docs.rs

  Downloads are cached; see --no-cache and --clear-cache.

OUTPUT:
  One file per trait under <OUT_DIR>/implementors/, for example
  implementors/core/marker/trait.Sync.js. Files whose content did not
  change are left untouched.

EXAMPLES:
  implgen target/doc/chacha.json            Index a local rustdoc JSON file
  implgen byteorder chacha keystream        Crates (versions from Cargo.toml)
  implgen byteorder@1.5.0 --split-units     One shard per trait and crate
  implgen chacha --contract core::marker::Sync")]
pub struct Cli {
    /// Units to index: rustdoc JSON files or crate[@version]
    #[arg(value_name = "UNIT", value_parser = parse_unit_source)]
    pub units: Vec<UnitSource>,

    /// Directory the implementors/ tree is written to
    #[arg(long, short, value_name = "DIR", default_value = "doc")]
    pub out_dir: PathBuf,

    /// Only emit the shard of this trait, even when it has no implementors
    /// (repeatable)
    #[arg(long = "contract", value_name = "PATH", value_parser = parse_contract)]
    pub contracts: Vec<ContractPath>,

    /// Write one shard per trait and crate instead of one per trait
    #[arg(long)]
    pub split_units: bool,

    /// Only list impls written in source; do not infer Send and Sync
    #[arg(long)]
    pub no_inference: bool,

    /// Skip cache and download fresh rustdoc JSON
    #[arg(long)]
    pub no_cache: bool,

    /// Clear the entire cache directory
    #[arg(long)]
    pub clear_cache: bool,

    /// Report what would be written without touching the output directory
    #[arg(long)]
    pub dry_run: bool,

    /// When to use colors in output.
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: Color,

    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn parse_unit_source(s: &str) -> Result<UnitSource, String> {
    UnitSource::parse(s).map_err(|e| e.to_string())
}

fn parse_contract(s: &str) -> Result<ContractPath, String> {
    ContractPath::parse(s).map_err(|e| e.to_string())
}
