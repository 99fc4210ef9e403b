use implindex::{
    CompilationUnit, ContractPath, ContractRef, DeclKind, DeclarationStore, ImplDecl, LinkRoot,
    ResolvedPath, STD_DOCS, TypeDecl, TypeRef,
};

pub fn run_cli(args: &[&str]) -> (String, String, bool) {
    match implgen::run_cli(args) {
        Ok(stdout) => (stdout, String::new(), true),
        Err(stderr) => (String::new(), stderr, false),
    }
}

/// `byteorder`, `chacha` and `keystream`, each with hand-written `Sync` impls.
pub fn sync_store() -> DeclarationStore {
    let mut store = DeclarationStore::new();
    store.insert(unit("byteorder", &[
        ("byteorder::BigEndian", DeclKind::Enum),
        ("byteorder::LittleEndian", DeclKind::Enum),
    ]));
    store.insert(unit("chacha", &[("chacha::ChaCha", DeclKind::Struct)]));
    store.insert(unit("keystream", &[("keystream::Error", DeclKind::Enum)]));
    store
}

pub fn sync() -> ContractPath {
    ContractPath::parse("core::marker::Sync").unwrap()
}

fn unit(name: &str, types: &[(&str, DeclKind)]) -> CompilationUnit {
    let mut unit = CompilationUnit::new(name);
    for (path, kind) in types {
        unit.push_type(TypeDecl::new(path, *kind));
        unit.push_impl(ImplDecl::explicit(
            ContractRef::resolved(sync(), LinkRoot::Remote(STD_DOCS.to_string())),
            TypeRef::Path(ResolvedPath::parse(path, *kind)),
        ));
    }
    unit
}
