//! Cross-reference index of trait implementors.
//!
//! Loads the declarations of one or more crates, works out which types
//! implement which traits, and serializes the result as implementor shards
//! that a documentation page loads and merges at runtime.

mod contract;
mod decl;
mod error;
mod index;
mod markup;
mod record;
mod registry;
mod resolver;
mod rules;
pub mod rustdoc;
mod shard;
mod store;

use std::collections::BTreeSet;

use tracing::info;

pub use contract::{ContractPath, SHARD_DIR};
pub use decl::{
    ContractRef, DeclKind, GenericParam, ImplDecl, ImplOrigin, LinkRoot, ResolvedPath, TypeDecl,
    TypeRef,
};
pub use error::{ContractPathError, GenerationError, RecordError, ResolutionWarning, ShardError};
pub use index::{Index, IndexBuilder, IndexSet};
pub use markup::render_impl;
pub use record::ImplementorRecord;
pub use registry::{Fragment, Registry};
pub use resolver::{ContractResolver, Resolution, ResolveOutput};
pub use rules::{AutoTraitRule, RuleSet, STD_DOCS, StructuralRule};
pub use shard::{Shard, ShardEmitter, ShardLayout, WriteOutcome};
pub use store::{CompilationUnit, DeclarationStore};

/// What to index.
#[derive(Clone, Debug)]
pub struct IndexOptions {
    /// Restricts the output to these contracts, each of which gets an index
    /// even without implementors. Empty means every contract found.
    pub contracts: Vec<ContractPath>,
    /// Infer auto-trait implementors the way rustdoc does.
    pub inference: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            contracts: vec![],
            inference: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct BuildOutput {
    pub indexes: IndexSet,
    pub warnings: Vec<ResolutionWarning>,
}

/// Resolves and groups the implementors of every contract in `store`.
pub fn build_indexes(store: &DeclarationStore, options: &IndexOptions) -> BuildOutput {
    let rules = if options.inference {
        RuleSet::builtin()
    } else {
        RuleSet::empty()
    };
    let resolver = ContractResolver::new(store, &rules);

    let output = if options.contracts.is_empty() {
        resolver.resolve_all()
    } else {
        let filter: BTreeSet<_> = options.contracts.iter().cloned().collect();
        resolver.resolve(&filter)
    };

    let builder = options
        .contracts
        .iter()
        .cloned()
        .fold(IndexBuilder::new(), IndexBuilder::require);
    let indexes = builder.build(output.resolutions);

    info!(
        units = store.len(),
        contracts = indexes.len(),
        records = indexes.record_count(),
        warnings = output.warnings.len(),
        "built implementor indexes"
    );
    BuildOutput {
        indexes,
        warnings: output.warnings,
    }
}
