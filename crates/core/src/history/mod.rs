//! Bounded calculation history.
//!
//! Owned by the calling layer: the service never appends here itself. The
//! list is most-recent-first with a fixed capacity; appending past capacity
//! evicts the oldest entry. Entries are identified by the quote's uuid, so
//! rapid successive saves can never collide the way wall-clock keys would.

use log::warn;
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::{HISTORY_CAPACITY, HISTORY_KEY};
use crate::errors::Result;
use crate::pricing::Quote;
use crate::prices::BlobStore;

pub struct QuoteHistory {
    store: Arc<dyn BlobStore>,
    capacity: usize,
}

impl QuoteHistory {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            capacity: HISTORY_CAPACITY,
        }
    }

    #[cfg(test)]
    fn with_capacity(store: Arc<dyn BlobStore>, capacity: usize) -> Self {
        Self { store, capacity }
    }

    /// Returns the stored history, most recent first. Absent or corrupt
    /// stored data reads as empty.
    pub async fn list(&self) -> Vec<Quote> {
        let bytes = match self.store.read_blob(HISTORY_KEY).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read quote history: {e}");
                return Vec::new();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!("Discarding corrupt quote history: {e}");
                Vec::new()
            }
        }
    }

    /// Prepends a quote, evicting the oldest entry past capacity.
    pub async fn append(&self, quote: Quote) -> Result<()> {
        let mut quotes = self.list().await;
        quotes.insert(0, quote);
        quotes.truncate(self.capacity);
        self.persist(&quotes).await
    }

    /// Removes the quote with the given id. Removing an unknown id is a
    /// no-op.
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let mut quotes = self.list().await;
        quotes.retain(|q| q.id != id);
        self.persist(&quotes).await
    }

    /// Clears the whole history.
    pub async fn clear(&self) -> Result<()> {
        self.store.remove_blob(HISTORY_KEY).await
    }

    async fn persist(&self, quotes: &[Quote]) -> Result<()> {
        let bytes = serde_json::to_vec(quotes)?;
        self.store.write_blob(HISTORY_KEY, &bytes).await
    }
}
