use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use crate::contract::ContractPath;
use crate::decl::{ContractRef, ImplDecl, ImplOrigin};
use crate::error::ResolutionWarning;
use crate::markup::render_impl;
use crate::record::ImplementorRecord;
use crate::rules::RuleSet;
use crate::store::{CompilationUnit, DeclarationStore};

/// One contract satisfied by one type, attributed to the unit declaring it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub contract: ContractPath,
    pub unit: String,
    pub record: ImplementorRecord,
}

#[derive(Debug, Default)]
pub struct ResolveOutput {
    /// Units in store order, impls in declaration order, inferred impls last.
    pub resolutions: Vec<Resolution>,
    pub warnings: Vec<ResolutionWarning>,
}

/// Finds every implementor of every contract across a store.
pub struct ContractResolver<'s> {
    store: &'s DeclarationStore,
    rules: &'s RuleSet,
}

impl<'s> ContractResolver<'s> {
    pub fn new(store: &'s DeclarationStore, rules: &'s RuleSet) -> Self {
        Self { store, rules }
    }

    pub fn resolve_all(&self) -> ResolveOutput {
        self.resolve_filtered(None)
    }

    /// Only resolutions for `contracts`. Warnings about other contracts are
    /// not reported.
    pub fn resolve(&self, contracts: &BTreeSet<ContractPath>) -> ResolveOutput {
        self.resolve_filtered(Some(contracts))
    }

    fn resolve_filtered(&self, filter: Option<&BTreeSet<ContractPath>>) -> ResolveOutput {
        let inferred: Vec<_> = self
            .rules
            .iter()
            .filter(|rule| filter.is_none_or(|f| f.contains(rule.contract())))
            .map(|rule| rule.infer(self.store))
            .collect();

        let mut output = ResolveOutput::default();
        for unit in self.store.units() {
            UnitResolver {
                store: self.store,
                unit,
                filter,
                output: &mut output,
                negative: HashSet::new(),
                seen: HashMap::new(),
            }
            .run(&inferred);
        }
        debug!(
            resolutions = output.resolutions.len(),
            warnings = output.warnings.len(),
            "contract resolution complete"
        );
        output
    }
}

/// Resolution state for one unit. Duplicates are only possible within a
/// unit, since a record belongs to the unit that declares its impl.
struct UnitResolver<'a> {
    store: &'a DeclarationStore,
    unit: &'a CompilationUnit,
    filter: Option<&'a BTreeSet<ContractPath>>,
    output: &'a mut ResolveOutput,
    /// (contract, types) pairs with a negative impl.
    negative: HashSet<(ContractPath, Vec<String>)>,
    /// (contract, types) pairs already recorded, with their output position.
    seen: HashMap<(ContractPath, Vec<String>), usize>,
}

impl UnitResolver<'_> {
    /// `inferred` holds each rule's impls keyed by unit, in rule order.
    fn run(mut self, inferred: &[HashMap<String, Vec<ImplDecl>>]) {
        let unit = self.unit;
        for decl in unit.impls() {
            if let Some(contract) = self.wanted(decl)
                && decl.negative
            {
                let key = (contract.clone(), decl.for_type.type_paths());
                self.negative.insert(key);
            }
        }

        for decl in unit.impls() {
            self.resolve_decl(decl);
        }

        for decls in inferred.iter().filter_map(|by_unit| by_unit.get(unit.name())) {
            for decl in decls {
                self.resolve_decl(decl);
            }
        }
    }

    fn wanted<'d>(&self, decl: &'d ImplDecl) -> Option<&'d ContractPath> {
        let contract = decl.contract.path()?;
        match self.filter {
            Some(filter) if !filter.contains(contract) => None,
            _ => Some(contract),
        }
    }

    fn resolve_decl(&mut self, decl: &ImplDecl) {
        let owner = self.unit;
        let unit = owner.name();
        let (contract, root) = match &decl.contract {
            ContractRef::Resolved { path, root } => (path, root),
            ContractRef::Dangling(reference) => {
                if self.filter.is_none() {
                    self.warn(ResolutionWarning::DanglingContract {
                        unit: unit.to_string(),
                        reference: reference.clone(),
                    });
                }
                return;
            }
        };
        if self.filter.is_some_and(|f| !f.contains(contract)) || decl.negative {
            return;
        }
        if decl.origin == ImplOrigin::Blanket {
            debug!(unit, %contract, "skipping blanket impl");
            return;
        }

        if let Some(reference) = decl.for_type.first_dangling() {
            self.warn(ResolutionWarning::DanglingType {
                unit: unit.to_string(),
                contract: contract.clone(),
                reference: reference.to_string(),
            });
            return;
        }
        if let Some(path) = self.unknown_cross_unit_type(decl) {
            self.warn(ResolutionWarning::UnknownCrossUnitType {
                unit: unit.to_string(),
                contract: contract.clone(),
                path,
            });
            return;
        }

        let synthetic = decl.is_synthetic();
        let types = decl.for_type.type_paths();
        let key = (contract.clone(), types.clone());
        if synthetic && self.negative.contains(&key) {
            debug!(unit, %contract, ?types, "negative impl suppresses synthetic impl");
            return;
        }

        let text = render_impl(contract, root, decl);
        let record = match ImplementorRecord::new(text, synthetic, types) {
            Ok(record) => record,
            Err(_) => {
                self.warn(ResolutionWarning::EmptyTypePath {
                    unit: unit.to_string(),
                    contract: contract.clone(),
                });
                return;
            }
        };
        let resolution = Resolution {
            contract: contract.clone(),
            unit: unit.to_string(),
            record,
        };

        match self.seen.get(&key) {
            None => {
                self.seen.insert(key, self.output.resolutions.len());
                self.output.resolutions.push(resolution);
            }
            Some(&position) => {
                let existing = &mut self.output.resolutions[position];
                if existing.record.is_synthetic() && !synthetic {
                    debug!(unit, %contract, "explicit impl replaces synthetic duplicate");
                    *existing = resolution;
                } else {
                    debug!(unit, %contract, "dropping duplicate impl");
                }
            }
        }
    }

    /// A path into another loaded unit that the unit does not declare.
    fn unknown_cross_unit_type(&self, decl: &ImplDecl) -> Option<String> {
        decl.for_type
            .resolved_paths()
            .into_iter()
            .filter(|path| path.kind.is_nominal_type())
            .filter(|path| self.store.contains(path.unit()))
            .find(|path| self.store.find_type(&path.segments).is_none())
            .map(|path| path.full())
    }

    fn warn(&mut self, warning: ResolutionWarning) {
        warn!("{warning}");
        self.output.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::decl::{DeclKind, LinkRoot, ResolvedPath, TypeDecl, TypeRef};
    use crate::rules::StructuralRule;

    fn sync_path() -> ContractPath {
        ContractPath::parse("core::marker::Sync").unwrap()
    }

    fn sync() -> ContractRef {
        ContractRef::resolved(sync_path(), LinkRoot::Unknown)
    }

    fn ty(path: &str, kind: DeclKind) -> TypeRef {
        TypeRef::Path(ResolvedPath::parse(path, kind))
    }

    fn resolve(store: &DeclarationStore, rules: &RuleSet) -> ResolveOutput {
        ContractResolver::new(store, rules).resolve_all()
    }

    fn summary(output: &ResolveOutput) -> Vec<(String, String, bool)> {
        output
            .resolutions
            .iter()
            .map(|r| (r.unit.clone(), r.record.types().join(","), r.record.is_synthetic()))
            .collect()
    }

    #[test]
    fn explicit_impls_are_not_synthetic() {
        let mut store = DeclarationStore::new();
        store.insert(
            CompilationUnit::new("keystream")
                .with_type(TypeDecl::new("keystream::Error", DeclKind::Enum))
                .with_impl(ImplDecl::explicit(sync(), ty("keystream::Error", DeclKind::Enum))),
        );

        let output = resolve(&store, &RuleSet::empty());
        assert!(output.warnings.is_empty());
        assert_eq!(
            summary(&output),
            [("keystream".into(), "keystream::Error".into(), false)]
        );
    }

    #[test]
    fn explicit_wins_over_synthetic_duplicate() {
        let mut store = DeclarationStore::new();
        store.insert(
            CompilationUnit::new("chacha")
                .with_type(TypeDecl::new("chacha::ChaCha", DeclKind::Struct))
                .with_type(TypeDecl::new("chacha::Key", DeclKind::Struct))
                .with_impl(ImplDecl::synthetic(sync(), ty("chacha::ChaCha", DeclKind::Struct)))
                .with_impl(ImplDecl::explicit(sync(), ty("chacha::Key", DeclKind::Struct)))
                .with_impl(ImplDecl::explicit(sync(), ty("chacha::ChaCha", DeclKind::Struct))),
        );

        let output = resolve(&store, &RuleSet::empty());
        assert_eq!(
            summary(&output),
            [
                ("chacha".into(), "chacha::ChaCha".into(), false),
                ("chacha".into(), "chacha::Key".into(), false),
            ]
        );
    }

    #[test]
    fn inferred_impl_is_suppressed_by_explicit_one() {
        let mut store = DeclarationStore::new();
        store.insert(
            CompilationUnit::new("byteorder")
                .with_type(TypeDecl::new("byteorder::BigEndian", DeclKind::Enum))
                .with_type(TypeDecl::new("byteorder::LittleEndian", DeclKind::Enum))
                .with_impl(ImplDecl::explicit(
                    sync(),
                    ty("byteorder::BigEndian", DeclKind::Enum),
                )),
        );

        let rules = RuleSet::empty().with(crate::rules::AutoTraitRule::sync());
        let output = resolve(&store, &rules);
        assert_eq!(
            summary(&output),
            [
                ("byteorder".into(), "byteorder::BigEndian".into(), false),
                ("byteorder".into(), "byteorder::LittleEndian".into(), true),
            ]
        );
    }

    #[test]
    fn negative_impl_suppresses_synthetic() {
        let mut store = DeclarationStore::new();
        store.insert(
            CompilationUnit::new("a")
                .with_impl(ImplDecl::synthetic(sync(), ty("a::Guard", DeclKind::Struct)))
                .with_impl(ImplDecl::explicit(sync(), ty("a::Guard", DeclKind::Struct)).negative())
                .with_type(TypeDecl::new("a::Guard", DeclKind::Struct)),
        );

        let output = resolve(&store, &RuleSet::builtin());
        assert!(
            output
                .resolutions
                .iter()
                .all(|r| r.contract != sync_path()),
            "{:?}",
            summary(&output)
        );
    }

    #[test]
    fn dangling_references_warn_and_drop() {
        let mut store = DeclarationStore::new();
        store.insert(
            CompilationUnit::new("a")
                .with_impl(ImplDecl::explicit(
                    ContractRef::Dangling("gone::Trait".into()),
                    TypeRef::Primitive("u8".into()),
                ))
                .with_impl(ImplDecl::explicit(sync(), TypeRef::Dangling("gone::Type".into())))
                .with_impl(ImplDecl::explicit(sync(), TypeRef::Generic("T".into())))
                .with_impl(ImplDecl::explicit(sync(), TypeRef::Primitive("u8".into()))),
        );

        let output = resolve(&store, &RuleSet::empty());
        assert_eq!(summary(&output), [("a".into(), "u8".into(), false)]);
        let warnings: Vec<_> = output.warnings.iter().map(|w| w.to_string()).collect();
        insta::assert_debug_snapshot!(warnings, @r#"
        [
            "a: impl of unresolvable trait `gone::Trait` dropped",
            "a: impl of `core::marker::Sync` for unresolvable type `gone::Type` dropped",
            "a: impl of `core::marker::Sync` has no concrete type path",
        ]
        "#);
    }

    #[test]
    fn broken_cross_unit_link_is_dropped() {
        let mut store = DeclarationStore::new();
        store.insert(
            CompilationUnit::new("byteorder")
                .with_type(TypeDecl::new("byteorder::BigEndian", DeclKind::Enum)),
        );
        store.insert(
            CompilationUnit::new("glue")
                .with_impl(ImplDecl::explicit(
                    sync(),
                    ty("byteorder::Removed", DeclKind::Struct),
                ))
                .with_impl(ImplDecl::explicit(
                    sync(),
                    ty("byteorder::BigEndian", DeclKind::Enum),
                ))
                .with_impl(ImplDecl::explicit(sync(), ty("serde::Value", DeclKind::Enum))),
        );

        let output = resolve(&store, &RuleSet::empty());
        assert_eq!(
            summary(&output),
            [
                ("glue".into(), "byteorder::BigEndian".into(), false),
                ("glue".into(), "serde::Value".into(), false),
            ]
        );
        assert!(matches!(
            &output.warnings[..],
            [ResolutionWarning::UnknownCrossUnitType { path, .. }] if path == "byteorder::Removed"
        ));
    }

    #[test]
    fn blanket_impls_are_skipped() {
        let mut store = DeclarationStore::new();
        store.insert(CompilationUnit::new("a").with_impl(
            ImplDecl::explicit(sync(), TypeRef::Generic("T".into())).with_origin(ImplOrigin::Blanket),
        ));

        let output = resolve(&store, &RuleSet::empty());
        assert!(output.resolutions.is_empty());
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn filter_restricts_contracts_and_rules() {
        let send = ContractPath::parse("core::marker::Send").unwrap();
        let mut store = DeclarationStore::new();
        store.insert(
            CompilationUnit::new("a")
                .with_type(TypeDecl::new("a::Plain", DeclKind::Struct))
                .with_impl(ImplDecl::explicit(
                    ContractRef::Dangling("gone::Trait".into()),
                    TypeRef::Primitive("u8".into()),
                )),
        );

        let rules = RuleSet::builtin();
        let filter = BTreeSet::from([send.clone()]);
        let output = ContractResolver::new(&store, &rules).resolve(&filter);
        assert!(output.warnings.is_empty());
        assert_eq!(output.resolutions.len(), 1);
        assert_eq!(output.resolutions[0].contract, send);
    }

    /// Counts how often the store-wide analysis runs.
    struct CountingRule {
        contract: ContractPath,
        calls: Rc<Cell<usize>>,
    }

    impl StructuralRule for CountingRule {
        fn contract(&self) -> &ContractPath {
            &self.contract
        }

        fn infer(&self, store: &DeclarationStore) -> HashMap<String, Vec<ImplDecl>> {
            self.calls.set(self.calls.get() + 1);
            store
                .units()
                .iter()
                .map(|unit| {
                    let decls = unit
                        .types()
                        .iter()
                        .map(|decl| ImplDecl::synthetic(sync(), decl.as_type_ref()))
                        .collect();
                    (unit.name().to_string(), decls)
                })
                .collect()
        }
    }

    #[test]
    fn rules_run_once_per_resolution() {
        let mut store = DeclarationStore::new();
        for name in ["byteorder", "chacha", "keystream"] {
            store.insert(
                CompilationUnit::new(name)
                    .with_type(TypeDecl::new(&format!("{name}::Plain"), DeclKind::Struct)),
            );
        }
        let calls = Rc::new(Cell::new(0));
        let rules = RuleSet::empty().with(CountingRule {
            contract: sync_path(),
            calls: calls.clone(),
        });

        let output = resolve(&store, &rules);
        assert_eq!(calls.get(), 1);
        assert_eq!(summary(&output), [
            ("byteorder".to_string(), "byteorder::Plain".to_string(), true),
            ("chacha".to_string(), "chacha::Plain".to_string(), true),
            ("keystream".to_string(), "keystream::Plain".to_string(), true),
        ]);

        let send = BTreeSet::from([ContractPath::parse("core::marker::Send").unwrap()]);
        ContractResolver::new(&store, &rules).resolve(&send);
        assert_eq!(calls.get(), 1, "filtered-out rules are not run");
    }
}
