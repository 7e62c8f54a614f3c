//! Trend Distribution Client
//!
//! Client for the trend ("forgettable") service, which maintains a
//! decaying distribution over recently active hashtags. The service
//! ranks bins itself; this client only surfaces the bin labels in
//! order. No caching, no retries, no coalescing on this path.

use serde::Deserialize;

use crate::error::ApiResult;

// ============================================================================
// RESPONSE DOCUMENT
// ============================================================================

/// Top-level trend service document.
#[derive(Debug, Clone, Deserialize)]
struct TrendDocument {
    data: TrendDistribution,
}

/// The ranked distribution inside the document.
#[derive(Debug, Clone, Deserialize)]
struct TrendDistribution {
    data: Vec<TrendBin>,
}

/// One ranked bin; only the label is surfaced.
#[derive(Debug, Clone, Deserialize)]
struct TrendBin {
    bin: String,
}

impl TrendDocument {
    fn into_bins(self) -> Vec<String> {
        self.data.data.into_iter().map(|entry| entry.bin).collect()
    }
}

// ============================================================================
// CLIENT
// ============================================================================

/// HTTP client for the trend service.
#[derive(Clone)]
pub struct TrendClient {
    http: reqwest::Client,
    base_url: String,
}

impl TrendClient {
    /// Create a client against the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// The `n` most probable bins of `distribution`, most probable
    /// first. Every bin the service returns is surfaced.
    pub async fn n_most_probable(&self, distribution: &str, n: u32) -> ApiResult<Vec<String>> {
        let url = format!("{}/nmostprobable", self.base_url);
        let count = n.to_string();

        let document: TrendDocument = self
            .http
            .get(&url)
            .query(&[("distribution", distribution), ("N", count.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(document.into_bins())
    }
}
