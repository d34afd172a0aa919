//! HTTP/REST API layer for Lockbox.
//!
//! Axum-based REST API at `/api/v1/` with per-owner API key authentication,
//! envelope response format, and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
