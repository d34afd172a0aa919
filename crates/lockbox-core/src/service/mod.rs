//! Business logic services (use cases).
//!
//! Services orchestrate repository calls and the cipher. They depend on
//! traits (ports) -- never on concrete infrastructure implementations.

pub mod pool;
pub mod vault;
