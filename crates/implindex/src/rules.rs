//! Structural inference: contracts a type satisfies without an impl written
//! for it.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::contract::ContractPath;
use crate::decl::{
    ContractRef, DeclKind, GenericParam, ImplDecl, LinkRoot, ResolvedPath, TypeDecl, TypeRef,
};
use crate::store::{CompilationUnit, DeclarationStore};

/// Where the standard library documentation lives.
pub const STD_DOCS: &str = "https://doc.rust-lang.org/nightly/";

/// Crates whose items are re-exported under each other's names.
const STD_ROOTS: [&str; 3] = ["std", "core", "alloc"];

/// A rule that derives impls from the shape of declarations.
pub trait StructuralRule {
    /// The contract this rule proves.
    fn contract(&self) -> &ContractPath;

    /// Synthetic impls for the types of every unit in `store`, keyed by unit
    /// name. Called once per resolution, so whole-store analysis happens
    /// here and not per unit.
    fn infer(&self, store: &DeclarationStore) -> HashMap<String, Vec<ImplDecl>>;
}

/// The rules applied during one resolution.
pub struct RuleSet {
    rules: Vec<Box<dyn StructuralRule>>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self { rules: vec![] }
    }

    /// `Send` and `Sync`.
    pub fn builtin() -> Self {
        Self::empty()
            .with(AutoTraitRule::send())
            .with(AutoTraitRule::sync())
    }

    pub fn with(mut self, rule: impl StructuralRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn StructuralRule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Infers an auto trait for every type whose fields all satisfy it.
///
/// A field fails when it is a raw pointer, a trait object that does not name
/// the trait, a blocker type, a type with a negative impl, or a known type
/// that fails itself. Types whose fields were stripped are only satisfied
/// through an impl in the input. Recursive types satisfy unless something on
/// the cycle fails.
pub struct AutoTraitRule {
    contract: ContractPath,
    root: LinkRoot,
    blockers: Vec<Vec<String>>,
}

impl AutoTraitRule {
    pub fn new(contract: ContractPath, root: LinkRoot) -> Self {
        Self {
            contract,
            root,
            blockers: vec![],
        }
    }

    /// Adds a type that never satisfies the contract. Standard library paths
    /// may be given without their crate (`cell::RefCell`).
    pub fn blocked_by(mut self, path: &str) -> Self {
        let segments: Vec<String> = path.split("::").map(str::to_string).collect();
        self.blockers.push(std_tail(&segments).to_vec());
        self
    }

    pub fn send() -> Self {
        Self::new(marker("Send"), LinkRoot::Remote(STD_DOCS.to_string()))
            .blocked_by("rc::Rc")
            .blocked_by("rc::Weak")
            .blocked_by("sync::MutexGuard")
    }

    pub fn sync() -> Self {
        Self::new(marker("Sync"), LinkRoot::Remote(STD_DOCS.to_string()))
            .blocked_by("cell::Cell")
            .blocked_by("cell::RefCell")
            .blocked_by("cell::UnsafeCell")
            .blocked_by("cell::OnceCell")
            .blocked_by("rc::Rc")
            .blocked_by("rc::Weak")
            .blocked_by("sync::mpsc::Receiver")
    }

    fn is_contract(&self, segments: &[String]) -> bool {
        std_tail(segments) == std_tail(self.contract.segments())
    }

    fn is_blocker(&self, path: &ResolvedPath) -> bool {
        self.blockers
            .iter()
            .any(|blocker| matches_blocker(&path.segments, blocker))
    }

    /// Outermost type paths of every impl of this contract, split by polarity.
    fn declared_impls<'a>(
        &self,
        impls: impl Iterator<Item = &'a ImplDecl>,
    ) -> (HashSet<String>, HashSet<String>) {
        let mut positive = HashSet::new();
        let mut negative = HashSet::new();
        for decl in impls {
            let (Some(contract), TypeRef::Path(ty)) = (decl.contract.path(), &decl.for_type)
            else {
                continue;
            };
            if !self.is_contract(contract.segments()) {
                continue;
            }
            if decl.negative {
                negative.insert(ty.full());
            } else {
                positive.insert(ty.full());
            }
        }
        (positive, negative)
    }

    /// Greatest fixed point: start from every candidate and drop types with a
    /// failing field until nothing changes.
    fn satisfied_types(&self, store: &DeclarationStore) -> HashSet<String> {
        let table = store.type_table();
        let (declared, negative) =
            self.declared_impls(store.units().iter().flat_map(|u| u.impls()));

        let mut satisfied: HashSet<String> = table
            .iter()
            .filter(|(path, decl)| {
                declared.contains(*path) || (decl.fields_complete && !negative.contains(*path))
            })
            .map(|(path, _)| path.clone())
            .collect();

        loop {
            let failing: Vec<String> = satisfied
                .iter()
                .filter(|path| !declared.contains(*path))
                .filter(|path| {
                    let check = FieldCheck {
                        rule: self,
                        table: &table,
                        negative: &negative,
                        satisfied: &satisfied,
                    };
                    !table[*path].fields.iter().all(|field| check.field(field))
                })
                .cloned()
                .collect();
            if failing.is_empty() {
                return satisfied;
            }
            for path in failing {
                satisfied.remove(&path);
            }
        }
    }

    fn synthesize(&self, decl: &TypeDecl) -> ImplDecl {
        let bound = ResolvedPath::new(self.contract.segments().to_vec(), DeclKind::Trait)
            .with_root(self.root.clone());
        let generics = decl
            .generics
            .iter()
            .map(|name| GenericParam {
                name: name.clone(),
                bounds: vec![bound.clone()],
            })
            .collect();
        ImplDecl::synthetic(
            ContractRef::resolved(self.contract.clone(), self.root.clone()),
            decl.as_type_ref(),
        )
        .with_generics(generics)
    }

    fn infer_unit(&self, satisfied: &HashSet<String>, unit: &CompilationUnit) -> Vec<ImplDecl> {
        let (positive, negative) = self.declared_impls(unit.impls().iter());

        let inferred: Vec<ImplDecl> = unit
            .types()
            .iter()
            .filter(|decl| {
                let path = decl.full();
                satisfied.contains(&path) && !positive.contains(&path) && !negative.contains(&path)
            })
            .map(|decl| self.synthesize(decl))
            .collect();

        debug!(
            unit = unit.name(),
            contract = %self.contract,
            count = inferred.len(),
            "inferred structural impls"
        );
        inferred
    }
}

impl StructuralRule for AutoTraitRule {
    fn contract(&self) -> &ContractPath {
        &self.contract
    }

    fn infer(&self, store: &DeclarationStore) -> HashMap<String, Vec<ImplDecl>> {
        let satisfied = self.satisfied_types(store);
        store
            .units()
            .iter()
            .map(|unit| (unit.name().to_string(), self.infer_unit(&satisfied, unit)))
            .filter(|(_, inferred)| !inferred.is_empty())
            .collect()
    }
}

struct FieldCheck<'a> {
    rule: &'a AutoTraitRule,
    table: &'a HashMap<String, &'a TypeDecl>,
    negative: &'a HashSet<String>,
    satisfied: &'a HashSet<String>,
}

impl FieldCheck<'_> {
    fn field(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Path(path) => {
                let full = path.full();
                if self.rule.is_blocker(path) || self.negative.contains(&full) {
                    return false;
                }
                if self.table.contains_key(&full) && !self.satisfied.contains(&full) {
                    return false;
                }
                path.args.iter().all(|arg| self.field(arg))
            }
            TypeRef::Primitive(_) | TypeRef::Generic(_) => true,
            TypeRef::Ref { inner, .. } | TypeRef::Slice(inner) | TypeRef::Array { inner, .. } => {
                self.field(inner)
            }
            TypeRef::Tuple(types) => types.iter().all(|ty| self.field(ty)),
            TypeRef::TraitObject(bounds) => bounds
                .iter()
                .any(|bound| self.rule.is_contract(&bound.segments)),
            TypeRef::RawPointer { .. } | TypeRef::Dangling(_) | TypeRef::Opaque => false,
        }
    }
}

fn marker(name: &str) -> ContractPath {
    ContractPath::new(vec!["core".into(), "marker".into(), name.into()])
        .unwrap_or_else(|_| unreachable!("marker trait paths are valid identifiers"))
}

fn std_tail(segments: &[String]) -> &[String] {
    match segments.split_first() {
        Some((root, rest)) if STD_ROOTS.contains(&root.as_str()) => rest,
        _ => segments,
    }
}

/// Standard library items move between modules and get re-exported, so a
/// std blocker matches any std path ending in its name and passing through
/// its modules. Other blockers match exactly.
fn matches_blocker(path: &[String], blocker: &[String]) -> bool {
    match path.split_first() {
        Some((root, rest)) if STD_ROOTS.contains(&root.as_str()) => {
            let Some((name, modules)) = blocker.split_last() else {
                return false;
            };
            rest.last() == Some(name) && modules.iter().all(|m| rest.contains(m))
        }
        _ => path == blocker,
    }
}
