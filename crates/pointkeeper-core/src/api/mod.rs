//! REST API client module for the loyalty service.
//!
//! This module provides the `ApiClient` for logging in, earning and
//! redeeming points, and reading the balance and transaction history.
//!
//! The API uses bearer token authentication; the token comes from the
//! shared `SessionStore` and a 401 on any call signs the session out.

pub mod client;
pub mod error;

pub use client::{ApiClient, REQUEST_TIMEOUT_SECS};
pub use error::{normalize_error, ApiError, NormalizedError};
