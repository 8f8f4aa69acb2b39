//! Core library for pointkeeper.
//!
//! Everything the front end needs to talk to the loyalty API lives here:
//!
//! - `auth`: session store, durable key-value storage backends
//! - `api`: authenticated HTTP client and error normalization
//! - `models`: request/response types and the reward catalog
//! - `forms`: client-side validation for earn and redeem submissions
//! - `history`: transaction filtering and summaries
//! - `scope`: cancellable request scopes for view-bound loads
//! - `config`: on-disk configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod forms;
pub mod history;
pub mod models;
pub mod scope;
pub mod utils;

pub use api::{normalize_error, ApiClient, ApiError, NormalizedError};
pub use auth::{SessionEvent, SessionState, SessionStore};
pub use config::Config;
