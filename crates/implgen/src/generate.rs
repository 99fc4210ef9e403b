use anyhow::{Context, Result};
use implindex::{
    DeclarationStore, IndexOptions, ShardEmitter, ShardLayout, WriteOutcome, build_indexes,
};
use std::path::PathBuf;
use tracing::info;

use crate::report::{Outcome, Report, ShardSummary};

/// Everything [`generate`] needs besides the declarations.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub index: IndexOptions,
    pub layout: ShardLayout,
    pub out_dir: PathBuf,
    pub dry_run: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            index: IndexOptions::default(),
            layout: ShardLayout::PerContract,
            out_dir: PathBuf::from("doc"),
            dry_run: false,
        }
    }
}

/// Indexes `store` and writes one shard per contract (or per contract and
/// unit) below the output directory.
pub fn generate(store: &DeclarationStore, options: &GenerateOptions) -> Result<Report> {
    let output = build_indexes(store, &options.index);
    let shards = ShardEmitter::new(options.layout)
        .emit_all(&output.indexes)
        .context("Failed to encode implementor shards")?;

    let mut report = Report::new(store.len());
    for shard in &shards {
        let outcome = if options.dry_run {
            Outcome::DryRun
        } else {
            let target = options.out_dir.join(shard.path());
            match shard
                .write_to(&options.out_dir)
                .with_context(|| format!("Failed to write {}", target.display()))?
            {
                WriteOutcome::Written => Outcome::Written,
                WriteOutcome::Unchanged => Outcome::Unchanged,
            }
        };
        report.shards.push(ShardSummary {
            path: shard.path().to_path_buf(),
            records: shard.record_count(),
            outcome,
        });
    }
    report.warnings = output.warnings;

    info!(
        out_dir = %options.out_dir.display(),
        shards = report.shards.len(),
        dry_run = options.dry_run,
        "shards emitted"
    );
    Ok(report)
}
