//! Versioned in-memory price table.
//!
//! The table holds an immutable snapshot behind an `RwLock<Arc<_>>`. Readers
//! clone the `Arc` and look prices up without holding the lock; a writer
//! swaps in a whole new snapshot under the write lock. Readers therefore
//! never observe a partially replaced table, and replacement is all-or-
//! nothing.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::model::PriceEntry;
use crate::errors::{Error, Result};
use crate::pricing::CoverageType;

#[derive(Debug, Default)]
struct Snapshot {
    prices: HashMap<(CoverageType, String), Decimal>,
    version: i64,
    /// False only for a freshly constructed table that has never been
    /// hydrated. The first hydration is exempt from the staleness check;
    /// afterwards versions must strictly increase.
    hydrated: bool,
}

/// Thread-safe mapping from (coverage type, thickness) to unit price, tagged
/// with the version assigned by the remote authority.
#[derive(Debug, Default)]
pub struct PriceTable {
    inner: RwLock<Arc<Snapshot>>,
}

impl PriceTable {
    /// Creates an empty, unhydrated table at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            // A poisoned lock still guards a consistent snapshot: writers
            // only ever swap the Arc, never mutate through it.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Looks up the unit price for a coverage type and thickness.
    ///
    /// Returns None when absent; callers must treat that as price-unknown.
    pub fn get(&self, coverage_type: CoverageType, thickness: &str) -> Option<Decimal> {
        self.snapshot()
            .prices
            .get(&(coverage_type, thickness.to_string()))
            .copied()
    }

    /// Atomically replaces the whole table.
    ///
    /// Rejects the replacement with `Error::StaleVersion` and leaves the
    /// table unchanged when `version` is not strictly greater than the
    /// current version of an already-hydrated table.
    pub fn replace_all(&self, entries: &[PriceEntry], version: i64) -> Result<()> {
        let mut prices = HashMap::with_capacity(entries.len());
        for entry in entries {
            prices.insert(
                (entry.coverage_type, entry.thickness.clone()),
                entry.unit_price,
            );
        }
        let next = Arc::new(Snapshot {
            prices,
            version,
            hydrated: true,
        });

        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.hydrated && version <= guard.version {
            return Err(Error::StaleVersion {
                current: guard.version,
                proposed: version,
            });
        }
        *guard = next;
        Ok(())
    }

    /// Returns every entry, sorted by (coverage type, numeric thickness
    /// prefix, label) for deterministic display.
    pub fn snapshot_all(&self) -> Vec<PriceEntry> {
        let snapshot = self.snapshot();
        let mut entries: Vec<PriceEntry> = snapshot
            .prices
            .iter()
            .map(|((coverage_type, thickness), price)| {
                PriceEntry::new(*coverage_type, thickness.clone(), *price)
            })
            .collect();
        entries.sort_by(|a, b| {
            (a.coverage_type.as_str(), a.thickness_sort_key(), &a.thickness).cmp(&(
                b.coverage_type.as_str(),
                b.thickness_sort_key(),
                &b.thickness,
            ))
        });
        entries
    }

    pub fn current_version(&self) -> i64 {
        self.snapshot().version
    }

    /// Whether the table has ever been hydrated.
    pub fn is_hydrated(&self) -> bool {
        self.snapshot().hydrated
    }
}
