//! Serializes indexes into self-registering JavaScript shards.
//!
//! A shard hands its mapping to `window.register_implementors` when the page
//! has already defined it, and otherwise appends the mapping to
//! `window.pending_implementors` for the page to drain later. Output is a
//! pure function of the index, so unchanged input reproduces the same bytes.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::contract::ContractPath;
use crate::error::ShardError;
use crate::index::{Index, IndexSet};
use crate::record::ImplementorRecord;
use crate::registry::Fragment;

const PRELUDE: &str = "(function() {var implementors = {};\n";

const REGISTER: &str = "\
if (window.register_implementors) {
    window.register_implementors(implementors);
} else {
    (window.pending_implementors = window.pending_implementors || []).push(implementors);
}
})()
";

/// How shards are laid out below the output directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShardLayout {
    /// `implementors/core/marker/trait.Sync.js`
    #[default]
    PerContract,
    /// `implementors/core/marker/trait.Sync/<unit>.js`
    PerUnit,
}

/// One emitted file, not yet written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shard {
    contract: ContractPath,
    path: PathBuf,
    records: usize,
    contents: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

impl Shard {
    pub fn contract(&self) -> &ContractPath {
        &self.contract
    }

    /// Path relative to the output directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Writes the shard below `out_dir`, leaving the file alone when it
    /// already holds these exact bytes.
    pub fn write_to(&self, out_dir: &Path) -> io::Result<WriteOutcome> {
        let target = out_dir.join(&self.path);
        if let Ok(existing) = fs::read(&target)
            && existing == self.contents.as_bytes()
        {
            return Ok(WriteOutcome::Unchanged);
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &self.contents)?;
        Ok(WriteOutcome::Written)
    }

    /// Reads shard text produced by [`ShardEmitter`] back into the mapping it
    /// registers.
    pub fn parse(contract: ContractPath, text: &str) -> Result<Fragment, ShardError> {
        let body = text
            .strip_prefix(PRELUDE)
            .ok_or_else(|| malformed(1, "missing shard prelude"))?;
        let body = body.strip_suffix(REGISTER).ok_or_else(|| {
            malformed(
                text.lines().count(),
                "missing registration call at end of shard",
            )
        })?;

        let mut fragment = Fragment::new(contract);
        for (i, line) in body.lines().enumerate() {
            let line_no = i + 2;
            let (unit, records) = parse_line(line).map_err(|reason| malformed(line_no, reason))?;
            if fragment.units.iter().any(|(name, _)| *name == unit) {
                return Err(malformed(line_no, format!("unit '{unit}' appears twice")));
            }
            fragment.units.push((unit, records));
        }
        Ok(fragment)
    }
}

/// `implementors["unit"] = [..];`
fn parse_line(line: &str) -> Result<(String, Vec<ImplementorRecord>), String> {
    let rest = line
        .strip_prefix("implementors[")
        .ok_or("expected an `implementors[..]` assignment")?;

    let mut keys = serde_json::Deserializer::from_str(rest).into_iter::<String>();
    let unit = match keys.next() {
        Some(Ok(unit)) => unit,
        Some(Err(err)) => return Err(format!("bad unit key: {err}")),
        None => return Err("missing unit key".to_string()),
    };
    let rest = &rest[keys.byte_offset()..];

    let records = rest
        .strip_prefix("] = ")
        .and_then(|r| r.strip_suffix(';'))
        .ok_or("expected `] = [..];` after the unit key")?;
    let records = serde_json::from_str(records).map_err(|err| format!("bad records: {err}"))?;
    Ok((unit, records))
}

fn malformed(line: usize, reason: impl Into<String>) -> ShardError {
    ShardError::Malformed {
        line,
        reason: reason.into(),
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ShardEmitter {
    layout: ShardLayout,
}

impl ShardEmitter {
    pub fn new(layout: ShardLayout) -> Self {
        Self { layout }
    }

    /// Emits the shards for one contract.
    ///
    /// An empty index still yields a per-contract shard registering `{}`; in
    /// the per-unit layout it yields nothing.
    pub fn emit(&self, index: &Index) -> Result<Vec<Shard>, ShardError> {
        let contract = index.contract();
        match self.layout {
            ShardLayout::PerContract => Ok(vec![Shard {
                contract: contract.clone(),
                path: contract.shard_path(),
                records: index.record_count(),
                contents: render(index.units())?,
            }]),
            ShardLayout::PerUnit => index
                .units()
                .map(|(unit, records)| {
                    Ok(Shard {
                        contract: contract.clone(),
                        path: contract.unit_shard_path(unit)?,
                        records: records.len(),
                        contents: render(std::iter::once((unit, records)))?,
                    })
                })
                .collect(),
        }
    }

    pub fn emit_all(&self, indexes: &IndexSet) -> Result<Vec<Shard>, ShardError> {
        let mut shards = vec![];
        for index in indexes.iter() {
            shards.extend(self.emit(index)?);
        }
        Ok(shards)
    }
}

fn render<'a>(
    units: impl Iterator<Item = (&'a str, &'a [ImplementorRecord])>,
) -> Result<String, ShardError> {
    let mut out = String::from(PRELUDE);
    for (unit, records) in units {
        let _ = writeln!(
            out,
            "implementors[{}] = {};",
            serde_json::to_string(unit)?,
            serde_json::to_string(records)?
        );
    }
    out.push_str(REGISTER);
    Ok(out)
}
