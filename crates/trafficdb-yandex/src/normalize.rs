//! Normalization of Metrika and Webmaster responses into report summaries
//! and the flat records persisted by `trafficdb-db`.
//!
//! Everything here is pure: no I/O, no clock. Empty result sets map to zeroed
//! values instead of errors.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use trafficdb_core::{
    ChannelTotals, OrganicPageRecord, Period, SearchQueryRecord, TrafficByUrlRecord,
};

use crate::types::{PopularQueriesResponse, StatResponse};

/// Visit-behaviour metrics for a section and period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BehaviorMetrics {
    pub visits: i32,
    /// Percentage, one decimal place.
    pub bounce_rate: Decimal,
    /// Pages per visit, two decimal places.
    pub page_depth: Decimal,
    /// Whole seconds.
    pub avg_visit: Decimal,
}

/// Organic search visits bucketed by engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchEngineSplit {
    pub yandex: i32,
    pub google: i32,
    pub other: i32,
}

/// An organic landing page under a tracked section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingPage {
    pub page_url: String,
    pub visits: i32,
    pub bounce_rate: Decimal,
    /// Percentage of visits among all pages in the same response.
    pub traffic_share: Decimal,
}

/// Visits attributed to one last-click traffic source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceVisits {
    pub source: String,
    pub visits: i32,
}

/// Search-query statistics from Webmaster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStat {
    pub query_text: String,
    pub shows: i32,
    pub clicks: i32,
    pub avg_show_position: Decimal,
    pub avg_click_position: Decimal,
}

// ---------------------------------------------------------------------------
// Numeric helpers
// ---------------------------------------------------------------------------

/// Converts an API float count into an `i32`, clamping negatives and
/// non-finite values to zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_count(value: f64) -> i32 {
    if !value.is_finite() || value <= 0.0 {
        0
    } else if value >= f64::from(i32::MAX) {
        i32::MAX
    } else {
        value.round() as i32
    }
}

/// Converts `value` to a [`Decimal`] rounded half away from zero to `dp` places.
#[must_use]
pub fn round_decimal(value: f64, dp: u32) -> Decimal {
    Decimal::try_from(value)
        .unwrap_or_default()
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// `part / total * 100` rounded to one decimal; zero when `total` is zero.
#[must_use]
pub fn traffic_share(part: i64, total: i64) -> Decimal {
    if total <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(total))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Response -> summary
// ---------------------------------------------------------------------------

/// First metric of the first row, or zero for an empty report.
#[must_use]
pub fn first_visits(response: &StatResponse) -> i32 {
    response.data.first().map_or(0, |row| to_count(row.metric(0)))
}

/// Maps a `visits, bounceRate, pageDepth, avgVisitDurationSeconds` report.
#[must_use]
pub fn behavior_from_response(response: &StatResponse) -> BehaviorMetrics {
    let Some(row) = response.data.first() else {
        return BehaviorMetrics::default();
    };

    BehaviorMetrics {
        visits: to_count(row.metric(0)),
        bounce_rate: round_decimal(row.metric(1), 1),
        page_depth: round_decimal(row.metric(2), 2),
        avg_visit: round_decimal(row.metric(3).trunc(), 0),
    }
}

/// Buckets a `ym:s:searchEngine` report by case-insensitive engine name.
#[must_use]
pub fn search_engines_from_response(response: &StatResponse) -> SearchEngineSplit {
    response
        .data
        .iter()
        .fold(SearchEngineSplit::default(), |mut split, row| {
            let engine = row.dimension_name().to_lowercase();
            let visits = to_count(row.metric(0));
            if engine.contains("yandex") {
                split.yandex = split.yandex.saturating_add(visits);
            } else if engine.contains("google") {
                split.google = split.google.saturating_add(visits);
            } else {
                split.other = split.other.saturating_add(visits);
            }
            split
        })
}

/// Maps a `ym:s:startURL` report with `visits, bounceRate` metrics, computing
/// each page's share of the summed visits.
#[must_use]
pub fn landing_pages_from_response(response: &StatResponse) -> Vec<LandingPage> {
    let total: i64 = response
        .data
        .iter()
        .map(|row| i64::from(to_count(row.metric(0))))
        .sum();

    response
        .data
        .iter()
        .map(|row| {
            let visits = to_count(row.metric(0));
            LandingPage {
                page_url: row.dimension_name().to_string(),
                visits,
                bounce_rate: round_decimal(row.metric(1), 1),
                traffic_share: traffic_share(i64::from(visits), total),
            }
        })
        .collect()
}

/// Maps a `ym:s:externalReferer` report into referring domain -> visits.
#[must_use]
pub fn referrals_from_response(response: &StatResponse) -> BTreeMap<String, i32> {
    let mut referrals = BTreeMap::new();
    for row in &response.data {
        let visits = to_count(row.metric(0));
        let entry = referrals
            .entry(row.dimension_name().to_string())
            .or_insert(0_i32);
        *entry = entry.saturating_add(visits);
    }
    referrals
}

/// Maps a `ym:s:lastTrafficSource` report, keeping the API's row order.
#[must_use]
pub fn top_sources_from_response(response: &StatResponse) -> Vec<SourceVisits> {
    response
        .data
        .iter()
        .map(|row| SourceVisits {
            source: row.dimension_name().to_string(),
            visits: to_count(row.metric(0)),
        })
        .collect()
}

/// Maps a Webmaster popular-queries response.
#[must_use]
pub fn query_stats_from_response(response: &PopularQueriesResponse) -> Vec<QueryStat> {
    response
        .queries
        .iter()
        .map(|q| QueryStat {
            query_text: q.query_text.clone(),
            shows: to_count(q.indicators.total_shows.unwrap_or(0.0)),
            clicks: to_count(q.indicators.total_clicks.unwrap_or(0.0)),
            avg_show_position: round_decimal(q.indicators.avg_show_position.unwrap_or(0.0), 2),
            avg_click_position: round_decimal(q.indicators.avg_click_position.unwrap_or(0.0), 2),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Summary -> record
// ---------------------------------------------------------------------------

/// Builds the `all_traffic_by_url` row for one section and period.
#[must_use]
pub fn traffic_record(
    url: &str,
    period: &Period,
    channels: ChannelTotals,
    behavior: &BehaviorMetrics,
    engines: SearchEngineSplit,
) -> TrafficByUrlRecord {
    TrafficByUrlRecord {
        url: url.to_string(),
        date_from: period.start,
        date_to: period.end,
        channels,
        google_traffic: engines.google,
        yandex_traffic: engines.yandex,
        bounce_rate: behavior.bounce_rate,
        page_depth: behavior.page_depth,
        avg_visit: behavior.avg_visit,
        visits: behavior.visits,
        month_year: period.month_label(),
    }
}

/// Builds the `organic_pages_by_url` row for one landing page.
#[must_use]
pub fn organic_page_record(base_url: &str, period: &Period, page: &LandingPage) -> OrganicPageRecord {
    OrganicPageRecord {
        base_url: base_url.to_string(),
        page_url: page.page_url.clone(),
        date_from: period.start,
        date_to: period.end,
        bounce_rate: page.bounce_rate,
        visits: page.visits,
        traffic_share: page.traffic_share,
        month_year: period.month_label(),
    }
}

/// Builds the `search_queries_webmaster` row for one query.
#[must_use]
pub fn search_query_record(period: &Period, stat: &QueryStat) -> SearchQueryRecord {
    SearchQueryRecord {
        query_text: stat.query_text.clone(),
        date_from: period.start,
        date_to: period.end,
        shows: stat.shows,
        clicks: stat.clicks,
        avg_show_position: stat.avg_show_position,
        month_year: period.month_label(),
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
