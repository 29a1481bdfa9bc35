//! Response shapes for the Metrika and Webmaster REST APIs.
//!
//! Only the fields this crate reads are modelled. Missing arrays and null
//! metrics default to empty / zero rather than failing deserialization.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Metrika: /stat/v1/data
// ---------------------------------------------------------------------------

/// Body of a Metrika reporting (`/stat/v1/data`) response.
#[derive(Debug, Default, Deserialize)]
pub struct StatResponse {
    #[serde(default)]
    pub data: Vec<StatRow>,
    #[serde(default)]
    pub total_rows: Option<i64>,
}

/// One row of a report: dimension values plus metrics in request order.
#[derive(Debug, Default, Deserialize)]
pub struct StatRow {
    #[serde(default)]
    pub dimensions: Vec<DimensionValue>,
    #[serde(default)]
    pub metrics: Vec<Option<f64>>,
}

impl StatRow {
    /// Metric at `index`, or `0.0` when absent or null.
    #[must_use]
    pub fn metric(&self, index: usize) -> f64 {
        self.metrics.get(index).copied().flatten().unwrap_or(0.0)
    }

    /// Name of the first dimension, or `""`.
    #[must_use]
    pub fn dimension_name(&self) -> &str {
        self.dimensions
            .first()
            .and_then(|d| d.name.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DimensionValue {
    #[serde(default)]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Metrika: /management/v1/counters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CountersResponse {
    #[serde(default)]
    pub counters: Vec<Counter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Counter {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub site: Option<String>,
}

// ---------------------------------------------------------------------------
// Webmaster
// ---------------------------------------------------------------------------

/// `GET /v4/user`
#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub user_id: i64,
}

/// `GET /v4/user/{user_id}/hosts/{host_id}/summary`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostSummary {
    #[serde(default)]
    pub sqi: Option<i64>,
    #[serde(default)]
    pub searchable_pages_count: Option<i64>,
    #[serde(default)]
    pub excluded_pages_count: Option<i64>,
}

/// `GET /v4/user/{user_id}/hosts/{host_id}/search-queries/popular`
#[derive(Debug, Default, Deserialize)]
pub struct PopularQueriesResponse {
    #[serde(default)]
    pub queries: Vec<PopularQuery>,
    #[serde(default)]
    pub count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    #[serde(default)]
    pub query_id: Option<String>,
    pub query_text: String,
    #[serde(default)]
    pub indicators: QueryIndicators,
}

/// Indicator values keyed by their upper-case API names.
#[derive(Debug, Default, Deserialize)]
pub struct QueryIndicators {
    #[serde(rename = "TOTAL_SHOWS", default)]
    pub total_shows: Option<f64>,
    #[serde(rename = "TOTAL_CLICKS", default)]
    pub total_clicks: Option<f64>,
    #[serde(rename = "AVG_SHOW_POSITION", default)]
    pub avg_show_position: Option<f64>,
    #[serde(rename = "AVG_CLICK_POSITION", default)]
    pub avg_click_position: Option<f64>,
}
