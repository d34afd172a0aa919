//! Vault lifecycle services and repository trait definitions for Lockbox.
//!
//! This crate defines the "ports" (repository and cipher traits) that the
//! infrastructure layer implements. It depends only on `lockbox-types` -- never
//! on `lockbox-infra` or any database/IO crate.

pub mod crypto;
pub mod ephemeral;
pub mod repository;
pub mod service;
