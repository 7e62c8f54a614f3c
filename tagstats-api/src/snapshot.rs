//! Map Snapshot Store
//!
//! Precomputed per-hashtag map geometries live in Redis as lists of
//! JSON-encoded elements, written by the ingestion pipeline. This module
//! reads them back: one LRANGE per request, each element decoded
//! independently, with a decode failure surfacing as an endpoint-level
//! error.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value as JsonValue;

use crate::error::{ApiError, ApiResult};

/// Key prefix the ingestion pipeline uses for map snapshot lists.
pub const MAP_KEY_PREFIX: &str = "osmstats::map::";

/// Snapshot list key for a hashtag.
///
/// Map keys are written lowercased; this is deliberately asymmetric
/// with the statistics cache, which keys on the hashtag as supplied.
pub fn map_key(hashtag: &str) -> String {
    format!("{}#{}", MAP_KEY_PREFIX, hashtag.to_lowercase())
}

/// Read-only client for the snapshot store.
#[derive(Clone)]
pub struct SnapshotStore {
    conn: ConnectionManager,
}

impl SnapshotStore {
    /// Connect to the snapshot store at `url`.
    pub async fn connect(url: &str) -> ApiResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| ApiError::invalid_input(format!("Invalid snapshot store URL {}: {}", url, e)))?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Read the full list stored under `key`, decoding each element.
    pub async fn read_list(&self, key: &str) -> ApiResult<Vec<JsonValue>> {
        let mut conn = self.conn.clone();
        let elements: Vec<String> = conn.lrange(key, 0, -1).await?;

        elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                serde_json::from_str(element).map_err(|e| {
                    ApiError::decode_failed(format!(
                        "Snapshot element {} under {} is not valid JSON: {}",
                        index, key, e
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_key_is_lowercased() {
        assert_eq!(map_key("MissingMaps"), "osmstats::map::#missingmaps");
        assert_eq!(map_key("mapathon"), "osmstats::map::#mapathon");
    }
}
