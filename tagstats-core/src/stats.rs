//! Per-user campaign statistics.
//!
//! A [`UserStats`] row summarizes everything one contributor did under a
//! single campaign hashtag. Rows are produced by the aggregation query
//! and normalized here, immediately at the store boundary, before any
//! caching or serialization happens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Stable numeric identifier for a contributor.
pub type UserId = i64;

// ============================================================================
// BOUNDARY COERCIONS
// ============================================================================

/// Round a road-kilometer aggregate to exactly 3 decimal places.
///
/// Road lengths are measured continuously, so the aggregate keeps a
/// fractional part but is clamped to millimeter-of-kilometer precision.
pub fn round_road_km(km: f64) -> f64 {
    (km * 1000.0).round() / 1000.0
}

/// Truncate a count aggregate to an integer.
///
/// Counts are discrete. A fractional aggregate (possible when the store
/// sums mixed-type columns) is truncated, never rounded: `4.9` becomes
/// `4`. This asymmetry with [`round_road_km`] is intentional.
pub fn truncate_count(count: f64) -> i64 {
    count.trunc() as i64
}

// ============================================================================
// STATISTICS RECORDS
// ============================================================================

/// Raw per-user aggregates as returned by the store, before coercion.
///
/// Sums arrive as floats because the underlying columns are not uniformly
/// typed; [`UserStats::from_aggregates`] applies the normalization rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RawUserAggregates {
    pub user_id: UserId,
    pub name: String,
    pub changesets: i64,
    pub edits: i64,
    pub roads: f64,
    pub buildings: f64,
    pub created_at: Timestamp,
}

/// One row per (contributor, hashtag): everything the contributor did
/// under that campaign hashtag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserStats {
    /// Contributor display name.
    pub name: String,
    /// Stable numeric identifier.
    pub user_id: UserId,
    /// Count of distinct change-sets tagged with the hashtag.
    pub changesets: i64,
    /// Sum of edit-count contributions across those change-sets.
    pub edits: i64,
    /// Road kilometers added + modified, rounded to 3 decimal places.
    pub roads: f64,
    /// Building add + modify counts, truncated to an integer.
    pub buildings: i64,
    /// Timestamp of the most recent qualifying change-set.
    pub created_at: DateTime<Utc>,
}

impl UserStats {
    /// Normalize raw store aggregates into a statistics row.
    pub fn from_aggregates(raw: RawUserAggregates) -> Self {
        Self {
            name: raw.name,
            user_id: raw.user_id,
            changesets: raw.changesets,
            edits: raw.edits,
            roads: round_road_km(raw.roads),
            buildings: truncate_count(raw.buildings),
            created_at: raw.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(roads: f64, buildings: f64) -> RawUserAggregates {
        RawUserAggregates {
            user_id: 42,
            name: "u1".to_string(),
            changesets: 2,
            edits: 10,
            roads,
            buildings,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn roads_round_to_three_decimals() {
        // 1.2345 added + 0.0005 added across two change-sets
        let stats = UserStats::from_aggregates(raw(1.2345 + 0.0005, 0.0));
        assert_eq!(stats.roads, 1.235);
    }

    #[test]
    fn buildings_truncate_instead_of_rounding() {
        let stats = UserStats::from_aggregates(raw(0.0, 4.9));
        assert_eq!(stats.buildings, 4);
    }

    #[test]
    fn integral_aggregates_pass_through() {
        let stats = UserStats::from_aggregates(raw(3.0, 7.0));
        assert_eq!(stats.roads, 3.0);
        assert_eq!(stats.buildings, 7);
        assert_eq!(stats.changesets, 2);
        assert_eq!(stats.edits, 10);
    }

    #[test]
    fn serializes_with_flat_field_names() -> Result<(), serde_json::Error> {
        let stats = UserStats::from_aggregates(raw(1.2341, 4.0));
        let json = serde_json::to_string(&stats)?;

        assert!(json.contains("\"name\":\"u1\""));
        assert!(json.contains("\"user_id\":42"));
        assert!(json.contains("\"changesets\":2"));
        assert!(json.contains("\"roads\":1.234"));
        assert!(json.contains("\"buildings\":4"));
        Ok(())
    }

    proptest! {
        #[test]
        fn rounding_is_idempotent(km in -10_000.0f64..10_000.0) {
            let rounded = round_road_km(km);
            prop_assert_eq!(round_road_km(rounded), rounded);
        }

        #[test]
        fn rounding_stays_within_half_a_unit(km in -10_000.0f64..10_000.0) {
            let rounded = round_road_km(km);
            prop_assert!((rounded - km).abs() < 0.000_500_1);
        }

        #[test]
        fn truncation_never_exceeds_the_aggregate(count in 0.0f64..1e9) {
            prop_assert!(truncate_count(count) as f64 <= count);
            prop_assert!(count - (truncate_count(count) as f64) < 1.0);
        }
    }
}
