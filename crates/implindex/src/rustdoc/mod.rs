//! Builds a [`CompilationUnit`] from rustdoc JSON.

mod crate_wrapper;
mod item_ext;

use std::collections::HashMap;

use rustdoc_types::{
    Crate, ExternalCrate, GenericArg, GenericArgs, GenericBound, GenericParamDefKind, Generics,
    Id, Impl, Item, ItemEnum, ItemKind, ItemSummary, Path, Type, WherePredicate,
};
use tracing::debug;

use crate::contract::{ContractPath, is_unit_name};
use crate::decl::{
    ContractRef, DeclKind, GenericParam, ImplDecl, ImplOrigin, LinkRoot, ResolvedPath, TypeDecl,
    TypeRef,
};
use crate::error::GenerationError;
use crate::store::CompilationUnit;

use crate_wrapper::CrateWrapper;
use item_ext::ItemExt;

pub use rustdoc_types::FORMAT_VERSION;

/// Converts one crate's rustdoc JSON into the declarations of a unit.
///
/// Collects the crate's public structs, enums and unions with their field
/// types, and every trait impl it declares.
pub fn unit_from_crate(crate_: &Crate) -> Result<CompilationUnit, GenerationError> {
    if crate_.format_version != FORMAT_VERSION {
        return Err(GenerationError::UnsupportedFormat {
            found: crate_.format_version,
            expected: FORMAT_VERSION,
        });
    }

    let mut wrapper = CrateWrapper::new(crate_);
    let name = wrapper.root_name().ok_or(GenerationError::MissingRoot)?;
    if !is_unit_name(&name) {
        return Err(GenerationError::InvalidUnitName(name));
    }
    let converter = TypeConverter::new(&crate_.paths, &crate_.external_crates);
    let mut unit = CompilationUnit::new(name).with_version(crate_.crate_version.clone());

    for item in wrapper.local_items() {
        match &item.inner {
            ItemEnum::Struct(_) | ItemEnum::Enum(_) | ItemEnum::Union(_) => {
                if let Some(decl) = type_decl(&mut wrapper, &converter, item) {
                    unit.push_type(decl);
                }
            }
            ItemEnum::Impl(impl_) => {
                if let Some(decl) = impl_decl(&converter, impl_) {
                    unit.push_impl(decl);
                }
            }
            _ => {}
        }
    }

    if !wrapper.missing_ids().is_empty() {
        debug!(
            unit = unit.name(),
            count = wrapper.missing_ids().len(),
            "ids missing from the rustdoc index"
        );
    }
    debug!(
        unit = unit.name(),
        types = unit.types().len(),
        impls = unit.impls().len(),
        "loaded declarations"
    );
    Ok(unit)
}

/// Only items with an entry in `paths` are public, and only those can be
/// linked to.
fn type_decl(
    wrapper: &mut CrateWrapper<'_>,
    converter: &TypeConverter<'_>,
    item: &Item,
) -> Option<TypeDecl> {
    let summary = converter.paths.get(&item.id)?;
    let members = item.members()?;

    let mut fields = vec![];
    let mut complete = members.complete;
    for id in members.ids {
        let Some(member) = wrapper.get_item(id) else {
            complete = false;
            continue;
        };
        match &member.inner {
            ItemEnum::StructField(ty) => fields.push(converter.convert(ty)),
            // enum variant
            _ => match member.members() {
                Some(variant) => {
                    complete &= variant.complete;
                    for field_id in variant.ids {
                        match wrapper.get_item(field_id).map(|f| &f.inner) {
                            Some(ItemEnum::StructField(ty)) => fields.push(converter.convert(ty)),
                            _ => complete = false,
                        }
                    }
                }
                None => complete = false,
            },
        }
    }

    Some(TypeDecl {
        path: summary.path.clone(),
        kind: decl_kind(summary.kind),
        generics: type_param_names(generics_of(item)?),
        fields,
        fields_complete: complete,
    })
}

fn generics_of(item: &Item) -> Option<&Generics> {
    match &item.inner {
        ItemEnum::Struct(s) => Some(&s.generics),
        ItemEnum::Enum(e) => Some(&e.generics),
        ItemEnum::Union(u) => Some(&u.generics),
        _ => None,
    }
}

fn type_param_names(generics: &Generics) -> Vec<String> {
    generics
        .params
        .iter()
        .filter(|param| matches!(param.kind, GenericParamDefKind::Type { .. }))
        .map(|param| param.name.clone())
        .collect()
}

/// Inherent impls have no trait and are not implementors of anything.
fn impl_decl(converter: &TypeConverter<'_>, impl_: &Impl) -> Option<ImplDecl> {
    let trait_ = impl_.trait_.as_ref()?;
    let origin = if impl_.blanket_impl.is_some() {
        ImplOrigin::Blanket
    } else if impl_.is_synthetic {
        ImplOrigin::Synthetic
    } else {
        ImplOrigin::Explicit
    };

    let mut decl = ImplDecl::explicit(converter.contract(trait_), converter.convert(&impl_.for_))
        .with_generics(converter.generic_params(&impl_.generics))
        .with_origin(origin);
    if impl_.is_negative {
        decl = decl.negative();
    }
    Some(decl)
}

fn decl_kind(kind: ItemKind) -> DeclKind {
    match kind {
        ItemKind::Struct => DeclKind::Struct,
        ItemKind::Enum => DeclKind::Enum,
        ItemKind::Union => DeclKind::Union,
        ItemKind::Trait => DeclKind::Trait,
        ItemKind::TypeAlias => DeclKind::TypeAlias,
        ItemKind::Primitive => DeclKind::Primitive,
        ItemKind::ExternType => DeclKind::ForeignType,
        _ => DeclKind::Other,
    }
}

/// Resolves rustdoc types against the crate's `paths` table.
struct TypeConverter<'c> {
    paths: &'c HashMap<Id, ItemSummary>,
    external_crates: &'c HashMap<u32, ExternalCrate>,
}

impl<'c> TypeConverter<'c> {
    fn new(
        paths: &'c HashMap<Id, ItemSummary>,
        external_crates: &'c HashMap<u32, ExternalCrate>,
    ) -> Self {
        Self {
            paths,
            external_crates,
        }
    }

    fn convert(&self, ty: &Type) -> TypeRef {
        match ty {
            Type::ResolvedPath(path) => match self.resolve(path) {
                Some(resolved) => TypeRef::Path(resolved),
                None => TypeRef::Dangling(path.path.clone()),
            },
            Type::Primitive(name) => TypeRef::Primitive(name.clone()),
            Type::Generic(name) => TypeRef::Generic(name.clone()),
            Type::BorrowedRef {
                is_mutable, type_, ..
            } => TypeRef::Ref {
                mutable: *is_mutable,
                inner: Box::new(self.convert(type_)),
            },
            Type::RawPointer { is_mutable, type_ } => TypeRef::RawPointer {
                mutable: *is_mutable,
                inner: Box::new(self.convert(type_)),
            },
            Type::Tuple(types) => TypeRef::Tuple(types.iter().map(|t| self.convert(t)).collect()),
            Type::Slice(inner) => TypeRef::Slice(Box::new(self.convert(inner))),
            Type::Array { type_, len } => TypeRef::Array {
                inner: Box::new(self.convert(type_)),
                len: len.clone(),
            },
            Type::DynTrait(dyn_trait) => TypeRef::TraitObject(
                dyn_trait
                    .traits
                    .iter()
                    .filter_map(|poly| self.resolve(&poly.trait_))
                    .collect(),
            ),
            _ => TypeRef::Opaque,
        }
    }

    fn resolve(&self, path: &Path) -> Option<ResolvedPath> {
        let summary = self.paths.get(&path.id)?;
        Some(
            ResolvedPath::new(summary.path.clone(), decl_kind(summary.kind))
                .with_root(self.link_root(summary.crate_id))
                .with_args(self.type_args(path.args.as_deref())),
        )
    }

    fn type_args(&self, args: Option<&GenericArgs>) -> Vec<TypeRef> {
        match args {
            Some(GenericArgs::AngleBracketed { args, .. }) => args
                .iter()
                .filter_map(|arg| match arg {
                    GenericArg::Type(ty) => Some(self.convert(ty)),
                    _ => None,
                })
                .collect(),
            _ => vec![],
        }
    }

    fn contract(&self, trait_: &Path) -> ContractRef {
        let resolved = self.paths.get(&trait_.id).and_then(|summary| {
            let path = ContractPath::new(summary.path.clone()).ok()?;
            Some(ContractRef::resolved(path, self.link_root(summary.crate_id)))
        });
        resolved.unwrap_or_else(|| ContractRef::Dangling(trait_.path.clone()))
    }

    /// Type parameters with their trait bounds, including bounds from
    /// `where T: ..` clauses, which is where rustdoc puts the conditions of
    /// its synthetic auto-trait impls. Lifetimes and consts are dropped, as
    /// are bounds that do not resolve and predicates on anything other than
    /// a bare parameter.
    fn generic_params(&self, generics: &Generics) -> Vec<GenericParam> {
        let mut params: Vec<GenericParam> = generics
            .params
            .iter()
            .filter_map(|param| match &param.kind {
                GenericParamDefKind::Type { bounds, .. } => Some(GenericParam {
                    name: param.name.clone(),
                    bounds: self.trait_bounds(bounds),
                }),
                _ => None,
            })
            .collect();

        for predicate in &generics.where_predicates {
            let WherePredicate::BoundPredicate {
                type_: Type::Generic(name),
                bounds,
                ..
            } = predicate
            else {
                continue;
            };
            let bounds = self.trait_bounds(bounds);
            match params.iter_mut().find(|param| param.name == *name) {
                Some(param) => {
                    for bound in bounds {
                        if !param.bounds.contains(&bound) {
                            param.bounds.push(bound);
                        }
                    }
                }
                None => params.push(GenericParam {
                    name: name.clone(),
                    bounds,
                }),
            }
        }
        params
    }

    fn trait_bounds(&self, bounds: &[GenericBound]) -> Vec<ResolvedPath> {
        bounds
            .iter()
            .filter_map(|bound| match bound {
                GenericBound::TraitBound { trait_, .. } => self.resolve(trait_),
                _ => None,
            })
            .collect()
    }

    fn link_root(&self, crate_id: u32) -> LinkRoot {
        if crate_id == 0 {
            return LinkRoot::Local;
        }
        match self
            .external_crates
            .get(&crate_id)
            .and_then(|krate| krate.html_root_url.clone())
        {
            Some(url) => LinkRoot::Remote(url),
            None => LinkRoot::Unknown,
        }
    }
}
