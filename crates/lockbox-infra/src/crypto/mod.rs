//! Cryptographic operations for Lockbox.
//!
//! - `cipher`: PBKDF2 + AES-256-GCM sealing of vault passwords
//! - `generator`: CSPRNG-backed credential generation
//! - `hash`: SHA-256 hashing of API keys

pub mod cipher;
pub mod generator;
pub mod hash;
