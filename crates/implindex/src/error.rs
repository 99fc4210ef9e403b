//! Error types for index generation.

use thiserror::Error;

use crate::contract::ContractPath;

/// A compilation unit could not be turned into declarations.
///
/// Fatal for the affected unit only. Other units still produce output.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The rustdoc JSON was produced by an incompatible rustdoc.
    #[error("unsupported rustdoc JSON format version {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },

    /// The crate root module is missing from the index, or has no name.
    #[error("crate root module is missing or unnamed")]
    MissingRoot,

    /// The crate name cannot be used as a unit name.
    #[error("invalid crate name '{0}'")]
    InvalidUnitName(String),
}

/// A contract path could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractPathError {
    #[error("contract path cannot be empty")]
    Empty,

    #[error("invalid path segment '{0}'")]
    InvalidSegment(String),
}

/// An implementor record violates its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("implementor record has an empty type path")]
    EmptyTypePath,
}

/// A shard could not be encoded or read back.
#[derive(Debug, Error)]
pub enum ShardError {
    #[error("failed to encode shard: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("malformed shard at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("invalid unit name '{0}' for a shard file")]
    InvalidUnitName(String),
}

/// A problem found while resolving implementors.
///
/// Warnings are never fatal: the affected record is dropped and resolution
/// carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionWarning {
    #[error("{unit}: impl of unresolvable trait `{reference}` dropped")]
    DanglingContract { unit: String, reference: String },

    #[error("{unit}: impl of `{contract}` for unresolvable type `{reference}` dropped")]
    DanglingType {
        unit: String,
        contract: ContractPath,
        reference: String,
    },

    #[error("{unit}: impl of `{contract}` names `{path}`, which its unit does not declare")]
    UnknownCrossUnitType {
        unit: String,
        contract: ContractPath,
        path: String,
    },

    #[error("{unit}: impl of `{contract}` has no concrete type path")]
    EmptyTypePath { unit: String, contract: ContractPath },
}
