//! Declarations of one compilation unit, independent of where they were
//! extracted from.

use crate::contract::ContractPath;

/// What kind of item a path points at. Decides the `class` and file name
/// prefix of rendered links.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Struct,
    Enum,
    Union,
    Trait,
    TypeAlias,
    Primitive,
    ForeignType,
    Other,
}

impl DeclKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Struct => "struct",
            DeclKind::Enum => "enum",
            DeclKind::Union => "union",
            DeclKind::Trait => "trait",
            DeclKind::TypeAlias => "type",
            DeclKind::Primitive => "primitive",
            DeclKind::ForeignType => "foreigntype",
            DeclKind::Other => "item",
        }
    }

    /// Types that a unit owns a declaration for.
    pub fn is_nominal_type(self) -> bool {
        matches!(self, DeclKind::Struct | DeclKind::Enum | DeclKind::Union)
    }
}

/// Where the documentation of a path lives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LinkRoot {
    /// Same documentation tree; links are relative.
    Local,
    /// Documentation hosted elsewhere, e.g. `https://doc.rust-lang.org/nightly/`.
    Remote(String),
    /// No known location; rendered without a link.
    Unknown,
}

/// A path that resolved to a known item.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedPath {
    pub segments: Vec<String>,
    pub kind: DeclKind,
    pub root: LinkRoot,
    pub args: Vec<TypeRef>,
}

impl ResolvedPath {
    pub fn new(segments: Vec<String>, kind: DeclKind) -> Self {
        Self {
            segments,
            kind,
            root: LinkRoot::Local,
            args: vec![],
        }
    }

    pub fn parse(path: &str, kind: DeclKind) -> Self {
        Self::new(path.split("::").map(str::to_string).collect(), kind)
    }

    pub fn with_root(mut self, root: LinkRoot) -> Self {
        self.root = root;
        self
    }

    pub fn with_args(mut self, args: Vec<TypeRef>) -> Self {
        self.args = args;
        self
    }

    pub fn full(&self) -> String {
        self.segments.join("::")
    }

    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Name of the unit that declares the item.
    pub fn unit(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or_default()
    }
}

/// A type as written in a declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Path(ResolvedPath),
    Primitive(String),
    /// A generic parameter such as `T`.
    Generic(String),
    Ref {
        mutable: bool,
        inner: Box<TypeRef>,
    },
    RawPointer {
        mutable: bool,
        inner: Box<TypeRef>,
    },
    Tuple(Vec<TypeRef>),
    Slice(Box<TypeRef>),
    Array {
        inner: Box<TypeRef>,
        len: String,
    },
    TraitObject(Vec<ResolvedPath>),
    /// A reference the front end could not resolve, kept as written.
    Dangling(String),
    /// Anything without a stable identity (`impl Trait`, `_`, function
    /// pointers, qualified paths).
    Opaque,
}

impl TypeRef {
    /// Visits this type and everything nested in it, outermost first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a TypeRef)) {
        f(self);
        match self {
            TypeRef::Path(path) => {
                for arg in &path.args {
                    arg.walk(f);
                }
            }
            TypeRef::Ref { inner, .. }
            | TypeRef::RawPointer { inner, .. }
            | TypeRef::Slice(inner)
            | TypeRef::Array { inner, .. } => inner.walk(f),
            TypeRef::Tuple(types) => {
                for ty in types {
                    ty.walk(f);
                }
            }
            TypeRef::TraitObject(bounds) => {
                for arg in bounds.iter().flat_map(|bound| &bound.args) {
                    arg.walk(f);
                }
            }
            TypeRef::Primitive(_)
            | TypeRef::Generic(_)
            | TypeRef::Dangling(_)
            | TypeRef::Opaque => {}
        }
    }

    /// Every resolved path this type mentions, outermost first.
    pub fn resolved_paths(&self) -> Vec<&ResolvedPath> {
        let mut out = vec![];
        self.walk(&mut |ty| match ty {
            TypeRef::Path(path) => out.push(path),
            TypeRef::TraitObject(bounds) => out.extend(bounds),
            _ => {}
        });
        out
    }

    /// The fully-qualified identifiers this type is anchored to, in order.
    /// Primitives count; generic parameters do not.
    pub fn type_paths(&self) -> Vec<String> {
        let mut out = vec![];
        self.walk(&mut |ty| match ty {
            TypeRef::Path(path) => out.push(path.full()),
            TypeRef::Primitive(name) => out.push(name.clone()),
            TypeRef::TraitObject(bounds) => out.extend(bounds.iter().map(ResolvedPath::full)),
            _ => {}
        });
        out
    }

    /// The first unresolvable reference inside this type, if any.
    pub fn first_dangling(&self) -> Option<&str> {
        let mut found = None;
        self.walk(&mut |ty| {
            if let TypeRef::Dangling(reference) = ty
                && found.is_none()
            {
                found = Some(reference.as_str());
            }
        });
        found
    }
}

/// A struct, enum or union declared by a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDecl {
    pub path: Vec<String>,
    pub kind: DeclKind,
    /// Names of the type's generic type parameters, in order.
    pub generics: Vec<String>,
    /// Types of all fields, across all variants for enums.
    pub fields: Vec<TypeRef>,
    /// False when some fields (or variants) were stripped from the input.
    pub fields_complete: bool,
}

impl TypeDecl {
    pub fn new(path: &str, kind: DeclKind) -> Self {
        Self {
            path: path.split("::").map(str::to_string).collect(),
            kind,
            generics: vec![],
            fields: vec![],
            fields_complete: true,
        }
    }

    pub fn with_generics(mut self, generics: &[&str]) -> Self {
        self.generics = generics.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn with_field(mut self, field: TypeRef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_stripped_fields(mut self) -> Self {
        self.fields_complete = false;
        self
    }

    pub fn full(&self) -> String {
        self.path.join("::")
    }

    /// The type applied to its own generic parameters, e.g. `Foo<T>`.
    pub fn as_type_ref(&self) -> TypeRef {
        TypeRef::Path(
            ResolvedPath::new(self.path.clone(), self.kind)
                .with_args(self.generics.iter().cloned().map(TypeRef::Generic).collect()),
        )
    }
}

/// The trait side of an impl.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContractRef {
    Resolved { path: ContractPath, root: LinkRoot },
    /// The trait could not be resolved, kept as written.
    Dangling(String),
}

impl ContractRef {
    pub fn resolved(path: ContractPath, root: LinkRoot) -> Self {
        ContractRef::Resolved { path, root }
    }

    pub fn path(&self) -> Option<&ContractPath> {
        match self {
            ContractRef::Resolved { path, .. } => Some(path),
            ContractRef::Dangling(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericParam {
    pub name: String,
    pub bounds: Vec<ResolvedPath>,
}

/// How an impl came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImplOrigin {
    /// Written in source.
    Explicit,
    /// Derived by structural inference (auto traits).
    Synthetic,
    /// `impl<T: Bound> Trait for T`; covers no concrete type by itself.
    Blanket,
}

/// One `impl Trait for Type` declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImplDecl {
    pub contract: ContractRef,
    pub for_type: TypeRef,
    pub generics: Vec<GenericParam>,
    pub origin: ImplOrigin,
    /// `impl !Trait for Type`.
    pub negative: bool,
}

impl ImplDecl {
    pub fn explicit(contract: ContractRef, for_type: TypeRef) -> Self {
        Self {
            contract,
            for_type,
            generics: vec![],
            origin: ImplOrigin::Explicit,
            negative: false,
        }
    }

    pub fn synthetic(contract: ContractRef, for_type: TypeRef) -> Self {
        Self {
            origin: ImplOrigin::Synthetic,
            ..Self::explicit(contract, for_type)
        }
    }

    pub fn with_generics(mut self, generics: Vec<GenericParam>) -> Self {
        self.generics = generics;
        self
    }

    pub fn with_origin(mut self, origin: ImplOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn negative(mut self) -> Self {
        self.negative = true;
        self
    }

    pub fn is_synthetic(&self) -> bool {
        self.origin == ImplOrigin::Synthetic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> TypeRef {
        TypeRef::Path(ResolvedPath::parse(p, DeclKind::Struct))
    }

    #[test]
    fn type_paths_are_outermost_first() {
        let vec = ResolvedPath::parse("alloc::vec::Vec", DeclKind::Struct);
        let ty = TypeRef::Path(vec.with_args(vec![
            path("chacha::ChaCha"),
            TypeRef::Primitive("u8".to_string()),
        ]));
        assert_eq!(
            ty.type_paths(),
            ["alloc::vec::Vec", "chacha::ChaCha", "u8"]
        );
    }

    #[test]
    fn generic_parameters_are_not_type_paths() {
        let ty = TypeRef::Ref {
            mutable: false,
            inner: Box::new(TypeRef::Generic("T".to_string())),
        };
        assert!(ty.type_paths().is_empty());
        assert!(TypeRef::Tuple(vec![]).type_paths().is_empty());
    }

    #[test]
    fn first_dangling_finds_nested_reference() {
        let ty = TypeRef::Tuple(vec![
            path("keystream::Error"),
            TypeRef::Slice(Box::new(TypeRef::Dangling("missing::Thing".to_string()))),
        ]);
        assert_eq!(ty.first_dangling(), Some("missing::Thing"));
        assert_eq!(path("keystream::Error").first_dangling(), None);
    }

    #[test]
    fn type_decl_applies_its_own_generics() {
        let decl = TypeDecl::new("chacha::State", DeclKind::Struct).with_generics(&["E"]);
        let TypeRef::Path(applied) = decl.as_type_ref() else {
            unreachable!()
        };
        assert_eq!(applied.full(), "chacha::State");
        assert_eq!(applied.args, [TypeRef::Generic("E".to_string())]);
    }

    #[test]
    fn resolved_path_names_its_unit() {
        let p = ResolvedPath::parse("byteorder::BigEndian", DeclKind::Enum);
        assert_eq!(p.unit(), "byteorder");
        assert_eq!(p.name(), "BigEndian");
    }
}
