//! Admin session model.

use serde::{Deserialize, Serialize};

/// An authenticated admin-panel session.
///
/// Absence of a session (`Option<AdminSession>::None`) is the
/// unauthenticated state; a session only exists after a successful sign-in.
/// `is_admin` reflects the user's profile flag at sign-in time and gates
/// remote price writes. Absence of proof of admin rights is never treated
/// as "is admin".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub user_id: String,
    /// Bearer credential attached to authenticated remote calls.
    pub access_token: String,
    pub is_admin: bool,
}

impl AdminSession {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>, is_admin: bool) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
            is_admin,
        }
    }
}
