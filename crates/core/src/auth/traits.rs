//! Auth client seam.
//!
//! Transport mechanics (token refresh, HTTP details) live behind this trait;
//! the core only depends on the sign-in / sign-out / change-password
//! contract.

use async_trait::async_trait;

use super::AdminSession;
use crate::errors::Result;

/// Client for the remote auth endpoints of the price store.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Signs in with email and password.
    ///
    /// Returns a session whose `is_admin` flag is resolved from the user's
    /// profile record. Fails with `Error::Auth` on invalid credentials and
    /// `Error::Network` on transport failure.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AdminSession>;

    /// Clears any server-side session state. Idempotent; never fails the
    /// caller (transport problems are logged, not surfaced).
    async fn sign_out(&self, session: &AdminSession);

    /// Changes the password of the signed-in account.
    ///
    /// Requires a valid active session. Fails with `Error::Auth` when the
    /// session is no longer valid and `Error::Network` on transport failure.
    async fn update_password(&self, session: &AdminSession, new_password: &str) -> Result<()>;
}
