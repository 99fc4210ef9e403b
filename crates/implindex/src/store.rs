use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::contract::ContractPath;
use crate::decl::{ImplDecl, TypeDecl};

/// The declarations of one library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilationUnit {
    name: String,
    version: Option<String>,
    types: Vec<TypeDecl>,
    impls: Vec<ImplDecl>,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            types: vec![],
            impls: vec![],
        }
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.push_type(decl);
        self
    }

    pub fn with_impl(mut self, decl: ImplDecl) -> Self {
        self.push_impl(decl);
        self
    }

    pub fn push_type(&mut self, decl: TypeDecl) {
        self.types.push(decl);
    }

    pub fn push_impl(&mut self, decl: ImplDecl) {
        self.impls.push(decl);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    /// Impls in declaration order.
    pub fn impls(&self) -> &[ImplDecl] {
        &self.impls
    }
}

/// All units known to one generation run, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct DeclarationStore {
    units: Vec<CompilationUnit>,
}

impl DeclarationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit. A unit with the same name replaces the earlier one in
    /// place, and the earlier one is returned.
    pub fn insert(&mut self, unit: CompilationUnit) -> Option<CompilationUnit> {
        match self.units.iter_mut().find(|u| u.name == unit.name) {
            Some(existing) => {
                warn!(unit = %unit.name, "unit loaded twice, keeping the last one");
                Some(std::mem::replace(existing, unit))
            }
            None => {
                self.units.push(unit);
                None
            }
        }
    }

    pub fn units(&self) -> &[CompilationUnit] {
        &self.units
    }

    pub fn get(&self, name: &str) -> Option<&CompilationUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Looks up a type by its fully-qualified path in the unit that owns it.
    pub fn find_type(&self, segments: &[String]) -> Option<&TypeDecl> {
        let unit = self.get(segments.first()?)?;
        unit.types.iter().find(|t| t.path == segments)
    }

    /// Every type in the store, keyed by fully-qualified path.
    pub fn type_table(&self) -> HashMap<String, &TypeDecl> {
        self.units
            .iter()
            .flat_map(|u| &u.types)
            .map(|t| (t.full(), t))
            .collect()
    }

    /// All contracts named by any resolvable impl.
    pub fn contracts(&self) -> BTreeSet<ContractPath> {
        self.units
            .iter()
            .flat_map(|u| &u.impls)
            .filter_map(|i| i.contract.path().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{ContractRef, DeclKind, LinkRoot, TypeRef};

    fn sync() -> ContractRef {
        ContractRef::resolved(
            ContractPath::parse("core::marker::Sync").unwrap(),
            LinkRoot::Unknown,
        )
    }

    #[test]
    fn insert_keeps_order_and_replaces_duplicates() {
        let mut store = DeclarationStore::new();
        assert!(store.insert(CompilationUnit::new("chacha")).is_none());
        assert!(store.insert(CompilationUnit::new("byteorder")).is_none());

        let replaced = store.insert(
            CompilationUnit::new("chacha").with_version(Some("0.3.0".to_string())),
        );
        assert_eq!(replaced.unwrap().version(), None);

        let names: Vec<_> = store.units().iter().map(CompilationUnit::name).collect();
        assert_eq!(names, ["chacha", "byteorder"]);
        assert_eq!(store.get("chacha").unwrap().version(), Some("0.3.0"));
    }

    #[test]
    fn find_type_looks_in_owning_unit() {
        let mut store = DeclarationStore::new();
        store.insert(
            CompilationUnit::new("keystream")
                .with_type(TypeDecl::new("keystream::Error", DeclKind::Enum)),
        );

        let path = ["keystream".to_string(), "Error".to_string()];
        assert!(store.find_type(&path).is_some());
        assert!(store.find_type(&["keystream".to_string()]).is_none());
        assert!(store.find_type(&[]).is_none());
        assert!(store.type_table().contains_key("keystream::Error"));
    }

    #[test]
    fn contracts_skip_dangling_traits() {
        let ty = TypeRef::Primitive("u8".to_string());
        let mut store = DeclarationStore::new();
        store.insert(
            CompilationUnit::new("a")
                .with_impl(ImplDecl::explicit(sync(), ty.clone()))
                .with_impl(ImplDecl::explicit(
                    ContractRef::Dangling("gone::Trait".to_string()),
                    ty,
                )),
        );

        let contracts: Vec<_> = store.contracts().iter().map(|c| c.to_string()).collect();
        assert_eq!(contracts, ["core::marker::Sync"]);
    }
}
