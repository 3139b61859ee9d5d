//! Admin session model and the auth client seam.

mod model;
mod traits;

pub use model::AdminSession;
pub use traits::AuthClient;
