//! HTTP request handlers for the REST API.

pub mod generator;
pub mod vault;
