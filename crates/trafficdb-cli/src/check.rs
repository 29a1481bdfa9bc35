//! `check` command: confirms the OAuth token reaches both APIs.

use anyhow::Context;
use chrono::{Local, NaiveDate};
use trafficdb_core::{AppConfig, Period};
use trafficdb_yandex::{MetrikaClient, WebmasterClient};

pub(crate) async fn run_check(config: &AppConfig) -> anyhow::Result<()> {
    let metrika = MetrikaClient::new(
        &config.oauth_token,
        &config.metrika_counter_id,
        config.request_timeout_secs,
    )?;
    let line = check_metrika(&metrika, Local::now().date_naive())
        .await
        .context("Metrika check failed")?;
    println!("{line}");

    let webmaster = WebmasterClient::connect(
        &config.oauth_token,
        &config.webmaster_host_id,
        config.webmaster_user_id,
        config.request_timeout_secs,
    )
    .await
    .context("Webmaster user lookup failed")?;
    let line = check_webmaster(&webmaster)
        .await
        .context("Webmaster check failed")?;
    println!("{line}");

    Ok(())
}

/// The configured counter must be visible to the token.
pub(crate) async fn check_metrika(
    metrika: &MetrikaClient,
    today: NaiveDate,
) -> anyhow::Result<String> {
    let counters = metrika.counters().await?;
    let counter = counters
        .iter()
        .find(|c| c.id.to_string() == metrika.counter_id())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "counter {} is not visible to this token ({} counters available)",
                metrika.counter_id(),
                counters.len()
            )
        })?;

    let period = Period::current_month(today);
    let visits = metrika.total_visits(&period).await?;
    tracing::debug!(counter = counter.id, visits, "Metrika reachable");

    Ok(format!(
        "metrika: counter {} ({}) ok, {visits} visits in {}",
        counter.id,
        counter.site.as_deref().unwrap_or(&counter.name),
        period.month_label()
    ))
}

pub(crate) async fn check_webmaster(webmaster: &WebmasterClient) -> anyhow::Result<String> {
    let summary = webmaster.summary().await?;
    let searchable = summary
        .searchable_pages_count
        .ok_or_else(|| anyhow::anyhow!("host {} returned an empty summary", webmaster.host_id()))?;

    Ok(format!(
        "webmaster: host {} ok (user {}), {searchable} searchable pages, SQI {}",
        webmaster.host_id(),
        webmaster.user_id(),
        summary.sqi.unwrap_or(0)
    ))
}
