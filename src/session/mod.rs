//! Session store: per-user in-progress answer records.
//!
//! Sessions live only for the process lifetime. The `SessionStore` trait is
//! the seam for a persistent backend; the in-memory store is the default.

pub mod model;
pub mod store;

pub use model::Session;
pub use store::{InMemorySessionStore, SessionStore, spawn_expiry_task};
