//! Prometheus metrics for the gateway.
//!
//! Replaces the OTLP/OpenTelemetry exporter pipeline with a plain
//! [`prometheus`] registry: the gateway exposes a `/metrics` endpoint rather
//! than shipping to a collector, so there's nothing to batch or export.

pub mod metrics;

pub use metrics::Metrics;
