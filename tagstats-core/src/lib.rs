//! tagstats Core - Statistics Record Types
//!
//! Pure data structures with no I/O. The aggregation store and the HTTP
//! layer both depend on this crate; it contains the per-user statistics
//! record and the numeric coercions applied at the store boundary.

pub mod stats;

pub use stats::{round_road_km, truncate_count, RawUserAggregates, Timestamp, UserId, UserStats};
