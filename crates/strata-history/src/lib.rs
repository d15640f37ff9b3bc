//! Git history mining and single-pass evolution aggregation.
//!
//! Mines commit history using git2, classifies defect-related commits by
//! message keywords, and aggregates per-file touch counts and per-pair
//! co-change counts in one streaming pass over the log.

pub mod classify;
pub mod cochange;
pub mod mining;
