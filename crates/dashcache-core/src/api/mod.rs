//! REST API client module for the dashboard backend.
//!
//! This module provides the `ApiClient` for fetching orders, staff,
//! products and dashboard statistics. Each fetch method is a plain async
//! function returning a typed payload; caching is layered on top by
//! `CachedDataController`, not done here.
//!
//! Requests carry a bearer token when one is configured.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
