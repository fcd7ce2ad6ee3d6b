//! # API Module
//!
//! Token-aware HTTP access to the DevSync REST backend. Callers get a uniform
//! contract: JSON in, JSON out, bearer auth attached, one silent refresh on an
//! expired access token, and a single structured error type.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::{ApiClient, RequestOptions};
pub use error::ApiError;
