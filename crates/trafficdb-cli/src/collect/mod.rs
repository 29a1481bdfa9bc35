//! `collect` command: month-by-month ingestion from Metrika and Webmaster.
//!
//! Everything runs sequentially. An API error aborts the remaining work; a
//! failed row write is logged by the store and counted, and the loop goes on.

use std::ops::AddAssign;

use anyhow::Context;
use chrono::NaiveDate;
use trafficdb_core::{load_sites, monthly_periods, parse_date, AppConfig, Period};
use trafficdb_db::Store;
use trafficdb_yandex::{
    organic_page_record, search_query_record, traffic_record, MetrikaClient, WebmasterClient,
    YandexError,
};

use crate::Source;

/// Row counts for one collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CollectSummary {
    pub written: usize,
    pub failed: usize,
}

impl CollectSummary {
    fn record(&mut self, upserted: Option<i64>) {
        if upserted.is_some() {
            self.written += 1;
        } else {
            self.failed += 1;
        }
    }
}

impl AddAssign for CollectSummary {
    fn add_assign(&mut self, other: Self) {
        self.written += other.written;
        self.failed += other.failed;
    }
}

/// Turns the optional `--from` / `--to` arguments into monthly periods.
///
/// Missing bounds default to the calendar month containing `today`.
pub(crate) fn resolve_periods(
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
) -> anyhow::Result<Vec<Period>> {
    let month = Period::current_month(today);
    let start = from.map(parse_date).transpose()?.unwrap_or(month.start);
    let end = to.map(parse_date).transpose()?.unwrap_or(month.end);
    if start > end {
        anyhow::bail!("--from {start} is after --to {end}");
    }
    Ok(monthly_periods(start, end))
}

/// Runs the collection for `periods` against the configured APIs.
///
/// # Errors
///
/// Returns an error if the sites file or database settings are invalid, or
/// if any API call fails.
pub(crate) async fn run_collect(
    config: &AppConfig,
    periods: &[Period],
    source: Source,
) -> anyhow::Result<CollectSummary> {
    let store = Store::from_config(&config.database)?;
    let mut summary = CollectSummary::default();

    if source.includes_metrika() {
        let sites = load_sites(&config.sites_path)?;
        let metrika = MetrikaClient::new(
            &config.oauth_token,
            &config.metrika_counter_id,
            config.request_timeout_secs,
        )?;
        summary += collect_traffic(
            &store,
            &metrika,
            &sites.tracked_urls,
            periods,
            config.landing_page_limit,
        )
        .await
        .context("Metrika collection aborted")?;
    }

    if source.includes_webmaster() {
        let webmaster = WebmasterClient::connect(
            &config.oauth_token,
            &config.webmaster_host_id,
            config.webmaster_user_id,
            config.request_timeout_secs,
        )
        .await?;
        summary += collect_search_queries(&store, &webmaster, periods)
            .await
            .context("Webmaster collection aborted")?;
    }

    tracing::info!(
        periods = periods.len(),
        written = summary.written,
        failed = summary.failed,
        "collection finished"
    );
    println!(
        "collected {} period(s): {} rows written, {} failed",
        periods.len(),
        summary.written,
        summary.failed
    );
    Ok(summary)
}

/// Collects per-section traffic and organic landing pages.
///
/// For each URL and period: channel totals, behavior metrics and the search
/// engine split become one `all_traffic_by_url` row, then every organic
/// landing page below the URL becomes one `organic_pages_by_url` row.
///
/// # Errors
///
/// Returns the first [`YandexError`]; rows written before it stay written.
pub(crate) async fn collect_traffic(
    store: &Store,
    metrika: &MetrikaClient,
    urls: &[String],
    periods: &[Period],
    landing_limit: u32,
) -> Result<CollectSummary, YandexError> {
    let mut summary = CollectSummary::default();

    for url in urls {
        for period in periods {
            tracing::info!(url = %url, period = %period, "collecting traffic");

            let channels = metrika.channel_totals(period, url).await?;
            let behavior = metrika.behavior_metrics(period, Some(url)).await?;
            let engines = metrika.search_engine_split(period, Some(url)).await?;
            let record = traffic_record(url, period, channels, &behavior, engines);
            summary.record(store.upsert_traffic_by_url(&record).await);

            let pages = metrika
                .organic_landing_pages(period, url, landing_limit)
                .await?;
            tracing::debug!(url = %url, period = %period, pages = pages.len(), "landing pages");
            for page in &pages {
                let record = organic_page_record(url, period, page);
                summary.record(store.upsert_organic_page(&record).await);
            }
        }
    }

    Ok(summary)
}

/// Collects the popular search queries for every period.
///
/// # Errors
///
/// Returns the first [`YandexError`].
pub(crate) async fn collect_search_queries(
    store: &Store,
    webmaster: &WebmasterClient,
    periods: &[Period],
) -> Result<CollectSummary, YandexError> {
    let mut summary = CollectSummary::default();

    for period in periods {
        tracing::info!(period = %period, host = webmaster.host_id(), "collecting search queries");
        let queries = webmaster.top_search_queries(period).await?;
        for stat in &queries {
            let record = search_query_record(period, stat);
            summary.record(store.upsert_search_query(&record).await);
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
