use rustdoc_types::{Id, Item, ItemEnum, StructKind, VariantKind};

/// Member ids of a type-like item, and whether rustdoc stripped any.
pub struct Members {
    pub ids: Vec<Id>,
    pub complete: bool,
}

impl Members {
    fn new(ids: impl IntoIterator<Item = Id>, complete: bool) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            complete,
        }
    }

    /// Tuple fields; `None` marks a stripped field.
    fn tuple(fields: &[Option<Id>]) -> Self {
        Self::new(
            fields.iter().flatten().copied(),
            fields.iter().all(Option::is_some),
        )
    }
}

pub trait ItemExt {
    /// Fields of structs, unions and variants, or the variants of an enum.
    fn members(&self) -> Option<Members>;
}

impl ItemExt for Item {
    fn members(&self) -> Option<Members> {
        let members = match &self.inner {
            ItemEnum::Struct(s) => match &s.kind {
                StructKind::Unit => Members::new(Vec::new(), true),
                StructKind::Tuple(fields) => Members::tuple(fields),
                StructKind::Plain {
                    fields,
                    has_stripped_fields,
                } => Members::new(fields.iter().copied(), !has_stripped_fields),
            },
            ItemEnum::Union(u) => Members::new(u.fields.iter().copied(), !u.has_stripped_fields),
            ItemEnum::Enum(e) => Members::new(e.variants.iter().copied(), !e.has_stripped_variants),
            ItemEnum::Variant(v) => match &v.kind {
                VariantKind::Plain => Members::new(Vec::new(), true),
                VariantKind::Tuple(fields) => Members::tuple(fields),
                VariantKind::Struct {
                    fields,
                    has_stripped_fields,
                } => Members::new(fields.iter().copied(), !has_stripped_fields),
            },
            _ => return None,
        };
        Some(members)
    }
}
