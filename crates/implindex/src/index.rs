use std::collections::{BTreeMap, BTreeSet};

use crate::contract::ContractPath;
use crate::record::ImplementorRecord;
use crate::resolver::Resolution;

/// The implementors of one contract, grouped by the unit that declares them.
///
/// Units keep the order in which they were first seen, records keep
/// discovery order. Units without records are never present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Index {
    contract: ContractPath,
    units: Vec<(String, Vec<ImplementorRecord>)>,
}

impl Index {
    pub fn new(contract: ContractPath) -> Self {
        Self {
            contract,
            units: vec![],
        }
    }

    pub fn contract(&self) -> &ContractPath {
        &self.contract
    }

    pub fn push(&mut self, unit: &str, record: ImplementorRecord) {
        match self.units.iter_mut().find(|(name, _)| name == unit) {
            Some((_, records)) => records.push(record),
            None => self.units.push((unit.to_string(), vec![record])),
        }
    }

    pub fn units(&self) -> impl Iterator<Item = (&str, &[ImplementorRecord])> {
        self.units
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    pub fn get(&self, unit: &str) -> Option<&[ImplementorRecord]> {
        self.units
            .iter()
            .find(|(name, _)| name == unit)
            .map(|(_, records)| records.as_slice())
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn record_count(&self) -> usize {
        self.units.iter().map(|(_, records)| records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// One index per contract, ordered by contract path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexSet {
    indexes: BTreeMap<ContractPath, Index>,
}

impl IndexSet {
    pub fn get(&self, contract: &ContractPath) -> Option<&Index> {
        self.indexes.get(contract)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Index> {
        self.indexes.values()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Every unit that contributed at least one record to any contract.
    pub fn contributing_units(&self) -> BTreeSet<&str> {
        self.iter()
            .flat_map(|index| index.units().map(|(name, _)| name))
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.iter().map(Index::record_count).sum()
    }
}

/// Groups resolver output into per-contract indexes.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    required: BTreeSet<ContractPath>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure `contract` gets an index even when nothing implements it.
    pub fn require(mut self, contract: ContractPath) -> Self {
        self.required.insert(contract);
        self
    }

    pub fn build(self, resolutions: impl IntoIterator<Item = Resolution>) -> IndexSet {
        let mut indexes: BTreeMap<ContractPath, Index> = self
            .required
            .into_iter()
            .map(|contract| (contract.clone(), Index::new(contract)))
            .collect();

        for resolution in resolutions {
            indexes
                .entry(resolution.contract.clone())
                .or_insert_with(|| Index::new(resolution.contract))
                .push(&resolution.unit, resolution.record);
        }

        IndexSet { indexes }
    }
}
