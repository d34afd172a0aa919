//! Infrastructure layer for Lockbox.
//!
//! Contains implementations of the ports defined in `lockbox-core`: the
//! PBKDF2/AES-256-GCM vault cipher, the credential generator, SQLite storage,
//! and configuration loading.

pub mod config;
pub mod crypto;
pub mod sqlite;
