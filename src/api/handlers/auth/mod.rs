//! Auth handlers and supporting modules.
//!
//! Signup stores an Argon2id digest of the password. Authenticate checks it and
//! issues the `_cookie` session cookie; every todo endpoint resolves that
//! cookie through [`principal::require_auth`]. Sessions expire after the
//! configured TTL and are purged by a background sweeper.

mod flow;
pub(crate) mod login;
pub(crate) mod principal;
pub(crate) mod session;
pub(crate) mod signup;
mod state;
mod sweep;
pub(crate) mod types;
mod utils;

pub use state::{AuthConfig, AuthState};
pub use sweep::spawn_session_sweeper;
