//! Coupling and hotspot analysis over aggregated history.
//!
//! Consumes the co-change counters built by `strata-history` and per-file
//! size/complexity metrics to emit normalized logical-coupling records,
//! percentile-thresholded hotspot classifications, and defect correlations.

pub mod correlation;
pub mod coupling;
pub mod hotspots;
pub mod metrics;
