//! tagstats Cache - Single-Flight Coalescing Layer
//!
//! Generic caching in front of expensive asynchronous computations. The
//! cache knows nothing about hashtags or statistics; it guarantees that
//! concurrent requests for the same key share one in-flight computation
//! and that successful results are reused for a bounded freshness window.

pub mod single_flight;

pub use single_flight::{CacheError, SingleFlightCache, DEFAULT_TTL};
