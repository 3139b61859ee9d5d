//! Storage and sync seams for the price table.
//!
//! `BlobStore` abstracts local durable storage ("load bytes by key" / "store
//! bytes by key"); `RemotePriceStore` abstracts the authoritative versioned
//! price record in the cloud. Implementations live in the storage and remote
//! crates; tests use in-memory mocks.

use async_trait::async_trait;

use super::model::{PriceDocument, PriceEntry};
use crate::auth::AdminSession;
use crate::errors::Result;

/// Local durable key-value storage for serialized blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Reads the blob stored under `key`, or None if absent.
    async fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `bytes` under `key`, replacing any previous value.
    async fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Removes the blob stored under `key`. Removing an absent key is not an
    /// error.
    async fn remove_blob(&self, key: &str) -> Result<()>;
}

/// Client for the authoritative remote price record.
///
/// The record is a single versioned document keyed by a fixed document-type
/// tag. Writes are gated on admin rights and guarded by a version
/// compare-and-swap so concurrent admin edits never silently overwrite each
/// other.
#[async_trait]
pub trait RemotePriceStore: Send + Sync {
    /// Fetches the latest version of the price document.
    ///
    /// Fails with `Error::NotFound` when no document exists yet (callers
    /// hydrate from bundled defaults) and `Error::Network` on transport
    /// failure or a malformed response.
    async fn fetch_latest(&self) -> Result<PriceDocument>;

    /// Pushes a new document version computed as `base_version + 1`.
    ///
    /// Checks `is_admin` before any write attempt and fails with
    /// `Error::Permission` when it does not hold. Fails with
    /// `Error::Conflict` when the remote's version has advanced past
    /// `base_version`; the caller must re-fetch and retry. A first-ever
    /// write (no document exists) inserts instead of updating.
    ///
    /// Returns the version assigned to the accepted write.
    async fn push_new_version(
        &self,
        entries: &[PriceEntry],
        base_version: i64,
        session: &AdminSession,
    ) -> Result<i64>;

    /// Whether the session's user holds the admin flag in their profile
    /// record. Returns false, never an error, on any lookup failure.
    async fn is_admin(&self, session: &AdminSession) -> bool;
}
