//! kover-core - pricing rules, price table, and price synchronization.
//!
//! This crate contains the business logic of the kover price engine. It is
//! transport- and storage-agnostic: the remote price store and local blob
//! storage are traits implemented by the `kover-remote` and
//! `kover-storage-file` crates.
//!
//! # Overview
//!
//! - [`pricing`] - catalog enums, quote models, and the pure pricing rules
//!   (region gate, minimum-area gate, area tier coefficient).
//! - [`prices`] - the versioned in-memory [`prices::PriceTable`], its local
//!   cache, the cloud sync seam, and the orchestrating
//!   [`prices::PriceService`] with its online/offline state machine.
//! - [`history`] - bounded calculation history for the calling layer.
//! - [`auth`] - admin session model and the auth client seam.

pub mod auth;
pub mod constants;
pub mod errors;
pub mod history;
pub mod prices;
pub mod pricing;
pub mod validation;

pub use errors::{Error, Result};
