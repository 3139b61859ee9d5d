//! Remote price store and auth clients.
//!
//! Talks to a PostgREST-style cloud backend: the versioned price document
//! under `/rest/v1/price_documents`, admin profiles under
//! `/rest/v1/profiles`, and password auth under `/auth/v1`.

mod auth;
mod client;
mod prices;

pub use auth::RemoteAuthClient;
pub use client::RemoteClient;
pub use prices::RemotePriceClient;
