//! In-memory object catalog (`spec.md` §3 `CatalogEntry`), grounded on
//! `original_source/src/ssa/catalog.py`'s tag/entry model.

use hifitime::Epoch;

use crate::element_set::ElementSet;
use crate::errors::PropagatorError;
use crate::propagators::AnalyticPropagator;
use crate::state::State;

/// Sovereignty/role tags a [`CatalogEntry`] may carry. `spec.md` §3 lists
/// these as booleans on the entry rather than a closed enum, since an
/// object can be more than one at once (e.g. a tracked rocket body that is
/// also someone's primary asset).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tags {
    pub primary: bool,
    pub debris: bool,
    pub rocket_body: bool,
}

/// One catalog member: an immutable element set, its tags, and the most
/// recent [`State`] produced for it during the current run.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub element_set: ElementSet,
    pub tags: Tags,
    pub last_state: Option<State>,
}

impl CatalogEntry {
    pub fn new(element_set: ElementSet, tags: Tags) -> Self {
        Self {
            element_set,
            tags,
            last_state: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.element_set.catalog_id
    }

    /// Refreshes `last_state` via the analytic propagator, enforcing
    /// `spec.md` §3's monotone-epoch invariant: a refresh may not move the
    /// cached state backward in time.
    pub fn refresh(&mut self, epoch: Epoch) -> Result<State, PropagatorError> {
        if let Some(prev) = self.last_state {
            debug_assert!(epoch >= prev.epoch, "catalog refresh moved epoch backward");
        }
        let propagator = AnalyticPropagator::new(self.element_set.clone())?;
        let state = propagator.propagate(epoch)?;
        self.last_state = Some(state);
        Ok(state)
    }
}

/// Owns every [`CatalogEntry`] for the lifetime of one screening run
/// (`spec.md` §3: "Ownership: the Catalog exclusively owns ElementSets and
/// CatalogEntries for the duration of a screening run").
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    pub fn get(&self, id: u64) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut CatalogEntry> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn primaries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.tags.primary)
    }

    pub fn secondaries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| !e.tags.primary)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS_LINE1: &str = "1 25544U 98067A   20001.50000000  .00001234  00000-0  12345-4 0  9999";
    const ISS_LINE2: &str = "2 25544  51.6333 123.4560 0007763  90.0000 270.0000 15.49289811  5678";

    #[test]
    fn primaries_and_secondaries_partition_by_tag() {
        let es = ElementSet::parse(25544, "ISS (ZARYA)", ISS_LINE1, ISS_LINE2).unwrap();
        let mut catalog = Catalog::new();
        catalog.insert(CatalogEntry::new(
            es.clone(),
            Tags {
                primary: true,
                ..Default::default()
            },
        ));
        let mut debris_es = es;
        debris_es.catalog_id = 99999;
        catalog.insert(CatalogEntry::new(
            debris_es,
            Tags {
                debris: true,
                ..Default::default()
            },
        ));

        assert_eq!(catalog.primaries().count(), 1);
        assert_eq!(catalog.secondaries().count(), 1);
    }
}
