//! Metrics collection and export for streamwatch.
//!
//! Recording goes through the `metrics` crate facade, so call sites compile
//! to no-ops until a recorder is installed. With the `prometheus` feature,
//! [`init_metrics`] installs a Prometheus recorder whose handle renders the
//! text exposition format.
//!
//! ```rust,ignore
//! use streamwatch_metrics::{counter, notify};
//!
//! counter!(notify::EVENTS_ROUTED_TOTAL, "platform" => "twitch").increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
