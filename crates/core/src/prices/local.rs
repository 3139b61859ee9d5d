//! Durable local cache of the last-known-good price table snapshot.
//!
//! The snapshot is stored as one JSON blob under a fixed key of a
//! `BlobStore`. Loading is forgiving: absent or corrupt data reads as None
//! so the caller falls back to bundled defaults. This is deliberately
//! distinct from a malformed *remote* response, which surfaces as a network
//! error instead.

use log::warn;
use std::sync::Arc;

use super::model::{PriceDocument, PriceEntry};
use super::store::BlobStore;
use crate::constants::PRICE_CACHE_KEY;
use crate::errors::{Error, Result};

pub struct LocalPriceStore {
    store: Arc<dyn BlobStore>,
}

impl LocalPriceStore {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Persists a table snapshot and its version.
    ///
    /// Best-effort from the caller's point of view: a failure is surfaced as
    /// `Error::Storage` so it can be logged, but callers keep their
    /// in-memory state.
    pub async fn save(&self, entries: &[PriceEntry], version: i64) -> Result<()> {
        let document = PriceDocument {
            entries: entries.to_vec(),
            version,
        };
        let bytes = serde_json::to_vec(&document).map_err(|e| Error::Storage(e.to_string()))?;
        self.store.write_blob(PRICE_CACHE_KEY, &bytes).await
    }

    /// Loads the cached snapshot, or None when no prior save exists or the
    /// stored data cannot be parsed. Never fails.
    pub async fn load(&self) -> Option<PriceDocument> {
        let bytes = match self.store.read_blob(PRICE_CACHE_KEY).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read price cache: {e}");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(document) => Some(document),
            Err(e) => {
                warn!("Discarding corrupt price cache: {e}");
                None
            }
        }
    }
}
