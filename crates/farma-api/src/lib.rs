//! # farma-api: Backend REST Client
//!
//! Talks to the pharmacy backend over HTTP/JSON and returns farma-core
//! types. Every response goes through `farma_core::normalize`, so the
//! backend's loosely shaped payloads never reach the terminal raw.
//!
//! ## Layout
//!
//! - [`backend`] - The [`PosBackend`] trait the terminal codes against
//! - [`client`] - [`FarmaClient`], the reqwest implementation
//! - [`error`] - [`ApiError`] and the status/transport mapping
//!
//! ## Session
//! The backend keeps the login in a cookie. `FarmaClient` holds a cookie
//! store, so one client instance (or its clones) is one operator session.

pub mod backend;
pub mod client;
pub mod error;

pub use backend::PosBackend;
pub use client::{normalize_base_url, ClientConfig, FarmaClient};
pub use error::{ApiError, ApiResult};
