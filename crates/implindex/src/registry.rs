//! Consumer side of the shard format: loading shards and merging them.

use std::collections::BTreeMap;

use tracing::debug;

use crate::contract::ContractPath;
use crate::index::Index;
use crate::record::ImplementorRecord;

/// The mapping one shard carries: unit name to records, for one contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub contract: ContractPath,
    pub units: Vec<(String, Vec<ImplementorRecord>)>,
}

impl Fragment {
    pub fn new(contract: ContractPath) -> Self {
        Self {
            contract,
            units: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl From<&Index> for Fragment {
    fn from(index: &Index) -> Self {
        Self {
            contract: index.contract().clone(),
            units: index
                .units()
                .map(|(name, records)| (name.to_string(), records.to_vec()))
                .collect(),
        }
    }
}

/// Merged view of every loaded shard.
///
/// A registry starts either attached, merging fragments as they load, or
/// detached, queueing them until [`Registry::attach`] is called. Merging is
/// last-write-wins per (contract, unit), so loading a shard twice is the
/// same as loading it once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registry {
    attached: bool,
    merged: BTreeMap<ContractPath, BTreeMap<String, Vec<ImplementorRecord>>>,
    pending: Vec<Fragment>,
}

impl Registry {
    /// A registry with a consumer already present.
    pub fn attached() -> Self {
        Self {
            attached: true,
            ..Self::default()
        }
    }

    /// A registry whose consumer has not loaded yet.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn load(&mut self, fragment: Fragment) {
        if self.attached {
            self.merge(fragment);
        } else {
            debug!(contract = %fragment.contract, "queueing fragment until attached");
            self.pending.push(fragment);
        }
    }

    /// Attaches the consumer and merges everything queued so far, oldest first.
    pub fn attach(&mut self) {
        self.attached = true;
        let pending = std::mem::take(&mut self.pending);
        for fragment in pending {
            self.merge(fragment);
        }
    }

    pub fn pending(&self) -> &[Fragment] {
        &self.pending
    }

    pub fn implementors(
        &self,
        contract: &ContractPath,
    ) -> Option<&BTreeMap<String, Vec<ImplementorRecord>>> {
        self.merged.get(contract)
    }

    pub fn contracts(&self) -> impl Iterator<Item = &ContractPath> {
        self.merged.keys()
    }

    fn merge(&mut self, fragment: Fragment) {
        if fragment.is_empty() {
            return;
        }
        let units = self.merged.entry(fragment.contract).or_default();
        for (unit, records) in fragment.units {
            units.insert(unit, records);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync() -> ContractPath {
        ContractPath::parse("core::marker::Sync").unwrap()
    }

    fn fragment(units: &[(&str, &[&str])]) -> Fragment {
        Fragment {
            contract: sync(),
            units: units
                .iter()
                .map(|(unit, types)| {
                    let records = types
                        .iter()
                        .map(|ty| {
                            ImplementorRecord::new(format!("impl Sync for {ty}"), false, vec![
                                ty.to_string(),
                            ])
                            .unwrap()
                        })
                        .collect();
                    (unit.to_string(), records)
                })
                .collect(),
        }
    }

    #[test]
    fn loading_twice_is_idempotent() {
        let shard = fragment(&[("chacha", &["chacha::ChaCha"])]);
        let mut once = Registry::attached();
        once.load(shard.clone());
        let mut twice = once.clone();
        twice.load(shard);
        assert_eq!(once, twice);
        assert_eq!(twice.implementors(&sync()).unwrap()["chacha"].len(), 1);
    }

    #[test]
    fn load_order_does_not_matter() {
        let a = fragment(&[("byteorder", &["byteorder::BigEndian", "byteorder::LittleEndian"])]);
        let b = fragment(&[("keystream", &["keystream::Error"])]);

        let mut forward = Registry::attached();
        forward.load(a.clone());
        forward.load(b.clone());
        let mut backward = Registry::attached();
        backward.load(b);
        backward.load(a);
        assert_eq!(forward, backward);
    }

    #[test]
    fn detached_registry_queues_until_attached() {
        let a = fragment(&[("chacha", &["chacha::ChaCha"])]);
        let b = fragment(&[("keystream", &["keystream::Error"])]);

        let mut detached = Registry::detached();
        detached.load(a.clone());
        detached.load(b.clone());
        assert_eq!(detached.pending().len(), 2);
        assert!(detached.implementors(&sync()).is_none());

        detached.attach();
        assert!(detached.pending().is_empty());

        let mut attached = Registry::attached();
        attached.load(a);
        attached.load(b);
        assert_eq!(detached, attached);
    }

    #[test]
    fn empty_fragment_leaves_no_entry() {
        let mut registry = Registry::attached();
        registry.load(Fragment::new(sync()));
        assert!(registry.implementors(&sync()).is_none());
        assert_eq!(registry.contracts().count(), 0);
    }

    #[test]
    fn later_load_replaces_a_unit() {
        let mut registry = Registry::attached();
        registry.load(fragment(&[("chacha", &["chacha::ChaCha", "chacha::Old"])]));
        registry.load(fragment(&[("chacha", &["chacha::ChaCha"])]));
        assert_eq!(registry.implementors(&sync()).unwrap()["chacha"].len(), 1);
    }
}
