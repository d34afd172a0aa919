//! Shared domain types for Lockbox.
//!
//! This crate contains the core domain types used across the Lockbox vault:
//! vault items, sealed records, owners, generator options, configuration and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod config;
pub mod error;
pub mod generator;
pub mod owner;
pub mod vault;
