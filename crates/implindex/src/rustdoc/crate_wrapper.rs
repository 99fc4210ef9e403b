use rustdoc_types::{Crate, Id, Item};

/// The [`Crate`] type represents the deserialized form of the rustdoc JSON
/// input. This wrapper adds lookups and keeps track of broken references.
pub struct CrateWrapper<'c> {
    crate_: &'c Crate,

    /// Ids referenced from items but absent from [`Crate::index`]. Fields and
    /// variants hidden by `#[doc(hidden)]` end up here.
    missing_ids: Vec<Id>,
}

impl<'c> CrateWrapper<'c> {
    pub fn new(crate_: &'c Crate) -> Self {
        Self {
            crate_,
            missing_ids: vec![],
        }
    }

    pub fn get_item(&mut self, id: Id) -> Option<&'c Item> {
        self.crate_.index.get(&id).or_else(|| {
            self.missing_ids.push(id);
            None
        })
    }

    /// Name of the crate root module, which is the unit name.
    pub fn root_name(&mut self) -> Option<String> {
        self.get_item(self.crate_.root)?.name.clone()
    }

    /// Items of this crate in id order, so that output follows the order in
    /// which rustdoc assigned ids rather than hash map order.
    pub fn local_items(&self) -> Vec<&'c Item> {
        let mut items: Vec<_> = self
            .crate_
            .index
            .values()
            .filter(|item| item.crate_id == 0)
            .collect();
        items.sort_by_key(|item| item.id.0);
        items
    }

    pub fn missing_ids(&self) -> &[Id] {
        &self.missing_ids
    }
}
