//! Prep Pulse - Progress analytics engine for interview-preparation activity
//!
//! Pulse transforms heterogeneous activity records into comparable progress
//! metrics through a deterministic pipeline: schema adaptation → score
//! normalization → trend/bucket/radar aggregation → snapshot encoding.
//!
//! ## Modules
//!
//! - **Schema**: tolerant prep.activity.v1 parsing and validation
//! - **Normalizer**: per-kind native-scale table onto a common 0-100 range
//! - **Aggregators**: trend windows, period buckets, radar dimensions, targets
//! - **Encoder**: versioned prep.progress.v1 snapshot payloads

pub mod buckets;
pub mod encoder;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod radar;
pub mod schema;
pub mod targets;
pub mod trend;
pub mod types;

// Feed client for the aggregation endpoint (requires the `fetch` feature)
#[cfg(feature = "fetch")]
pub mod source;

pub use error::MetricsError;
pub use pipeline::{activity_to_snapshot, ProgressEngine, ViewOptions};

// Schema exports
pub use schema::{ActivityAdapter, ActivityEvent, SCHEMA_VERSION};

// Aggregation exports
pub use buckets::{bucket_by_period, progress_series};
pub use normalizer::normalize_score;
pub use radar::radar_dimensions;
pub use targets::evaluate_targets;
pub use trend::{aggregate_overall, TrendWindows};

#[cfg(feature = "fetch")]
pub use source::{ActivityFeed, FetchOutcome};

/// Engine version embedded in all snapshot payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for snapshot payloads
pub const PRODUCER_NAME: &str = "prep-pulse";
