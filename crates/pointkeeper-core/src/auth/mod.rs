//! Authentication module for managing the logged-in session.
//!
//! This module provides:
//! - `SessionStore`: identity and bearer token, restored at startup and
//!   shared with the API client as an explicit `Arc`
//! - `KeyValueStore`: durable storage behind the session (`FileStore`,
//!   `KeyringStore`, `MemoryStore`)
//!
//! The token is never inspected client-side; the server decides whether it
//! is still valid and a 401 evicts it.

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::KeyringStore;
pub use session::{RequestCredentials, SessionEvent, SessionState, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore, TOKEN_KEY, USER_KEY};
