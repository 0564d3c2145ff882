//! # Tickbox (session-authenticated to-do service)
//!
//! `tickbox` is a small HTTP/JSON backend: users sign up, log in to receive a
//! server-side session cookie, and manage their own to-do items.
//!
//! ## Sessions
//!
//! Logging in creates a row in `sessions` keyed by a random uuid token. The
//! token travels in the `_cookie` cookie (`HttpOnly`, `SameSite=Lax`, `Path=/`)
//! and is only valid until its `expires_at`. A background sweeper removes
//! expired rows; logout deletes the row immediately.
//!
//! ## Ownership
//!
//! Every todo belongs to exactly one user. Listing only returns the caller's
//! todos, and update/delete answer `403 Forbidden` when the target todo belongs
//! to someone else.
//!
//! ## Storage
//!
//! Data lives in an embedded SQLite database reached through a [`store::Store`]
//! handle that is built once at startup and handed to the router.

pub mod api;
pub mod cli;
pub mod error;
pub mod store;

pub use error::Error;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
