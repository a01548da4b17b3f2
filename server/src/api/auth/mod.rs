//! Authentication module

mod context;
pub mod middleware;

pub use context::{Auth, AuthContext, AuthRejection};
pub use middleware::{AuthError, AuthState, require_auth};
