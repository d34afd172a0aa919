//! Observability setup for Lockbox: tracing subscriber and optional
//! OpenTelemetry export.

pub mod tracing_setup;
