// src/pipeline/mod.rs

//! Cache-aware extraction pipeline.
//!
//! The pipeline owns the fetcher and the cache layer and wraps every
//! scraper run in the same idempotency protocol: bookkeeping, failure-memo
//! short-circuit, cache lookup, extraction, store.

mod batch;
mod extract;

pub use batch::{BatchOutcome, BatchRequest, BatchSummary};
pub use extract::Pipeline;
