//! Price table module - versioned price data, local cache, cloud sync seams,
//! and the orchestrating service.

mod defaults;
mod local;
mod model;
mod service;
#[cfg(test)]
mod service_tests;
mod store;
mod table;

pub use defaults::{default_entries, DEFAULT_PRICES_VERSION};
pub use local::LocalPriceStore;
pub use model::{PriceDocument, PriceEntry, SaveOutcome};
pub use service::{PriceService, ServiceMode};
pub use store::{BlobStore, RemotePriceStore};
pub use table::PriceTable;
