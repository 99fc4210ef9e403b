use colored::Colorize;
use implindex::ResolutionWarning;
use std::fmt::Write;
use std::path::PathBuf;

use crate::util::plural;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written,
    Unchanged,
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardSummary {
    /// Relative to the output directory.
    pub path: PathBuf,
    pub records: usize,
    pub outcome: Outcome,
}

/// A unit that could not be loaded. The others are indexed regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub unit: String,
    pub error: String,
}

/// The result of one run, rendered for the terminal.
#[derive(Debug, Default)]
pub struct Report {
    pub units: usize,
    pub shards: Vec<ShardSummary>,
    pub warnings: Vec<ResolutionWarning>,
    pub failures: Vec<UnitFailure>,
}

impl Report {
    pub fn new(units: usize) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for shard in &self.shards {
            let status = match shard.outcome {
                Outcome::Written => "wrote".green().bold(),
                Outcome::Unchanged => "unchanged".dimmed(),
                Outcome::DryRun => "would write".cyan(),
            };
            let _ = writeln!(
                out,
                "{status} {} ({})",
                shard.path.display(),
                plural(shard.records, "record")
            );
        }
        for warning in &self.warnings {
            let _ = writeln!(out, "{} {warning}", "warning:".yellow().bold());
        }

        let written = self
            .shards
            .iter()
            .filter(|s| s.outcome == Outcome::Written)
            .count();
        let _ = writeln!(
            out,
            "{}, {} ({written} written), {}",
            plural(self.units, "unit"),
            plural(self.shards.len(), "shard"),
            plural(self.warnings.len(), "warning")
        );
        out
    }

    /// One line per failed unit.
    pub fn render_failures(&self) -> String {
        let mut out = String::new();
        for failure in &self.failures {
            let _ = writeln!(
                out,
                "{} {}: {}",
                "failed to load".red().bold(),
                failure.unit,
                failure.error
            );
        }
        out
    }
}
