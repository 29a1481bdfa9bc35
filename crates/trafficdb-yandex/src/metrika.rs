//! HTTP client for the Yandex Metrika reporting and management APIs.
//!
//! Every report method issues exactly one `GET /stat/v1/data` request per
//! logical query (the channel breakdown issues one per channel) and maps the
//! rows through [`crate::normalize`].

use std::collections::BTreeMap;

use reqwest::{Client, Url};
use trafficdb_core::{Channel, ChannelTotals, Period};

use crate::error::{Service, YandexError};
use crate::filter::{url_prefix_pattern, Filter};
use crate::http::{build_client, get_json, parse_base_url};
use crate::normalize::{
    behavior_from_response, first_visits, landing_pages_from_response, referrals_from_response,
    search_engines_from_response, top_sources_from_response, BehaviorMetrics, LandingPage,
    SearchEngineSplit, SourceVisits,
};
use crate::types::{Counter, CountersResponse, StatResponse};

const DEFAULT_BASE_URL: &str = "https://api-metrika.yandex.net/";
const STAT_PATH: &str = "stat/v1/data";
const COUNTERS_PATH: &str = "management/v1/counters";

const METRIC_VISITS: &str = "ym:s:visits";
const METRICS_BEHAVIOR: &str =
    "ym:s:visits,ym:s:bounceRate,ym:s:pageDepth,ym:s:avgVisitDurationSeconds";
const METRICS_LANDING: &str = "ym:s:visits,ym:s:bounceRate";

const SEARCH_ENGINE_LIMIT: u32 = 10;

/// Parameters for one `/stat/v1/data` request.
#[derive(Debug, Clone)]
pub(crate) struct StatQuery<'a> {
    period: &'a Period,
    metrics: &'static str,
    dimensions: Option<&'static str>,
    filter: Option<Filter>,
    sort: Option<&'static str>,
    limit: Option<u32>,
    full_accuracy: bool,
}

impl<'a> StatQuery<'a> {
    fn new(period: &'a Period, metrics: &'static str) -> Self {
        Self {
            period,
            metrics,
            dimensions: None,
            filter: None,
            sort: None,
            limit: None,
            full_accuracy: false,
        }
    }

    fn dimensions(mut self, dimensions: &'static str) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    fn sort(mut self, sort: &'static str) -> Self {
        self.sort = Some(sort);
        self
    }

    fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn full_accuracy(mut self) -> Self {
        self.full_accuracy = true;
        self
    }

    fn into_params(self, counter_id: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ids", counter_id.to_string()),
            ("metrics", self.metrics.to_string()),
            ("date1", self.period.start_param()),
            ("date2", self.period.end_param()),
        ];
        if let Some(dimensions) = self.dimensions {
            params.push(("dimensions", dimensions.to_string()));
        }
        if let Some(filter) = self.filter {
            params.push(("filters", filter.to_string()));
        }
        if let Some(sort) = self.sort {
            params.push(("sort", sort.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if self.full_accuracy {
            params.push(("accuracy", "full".to_string()));
        }
        params
    }
}

fn organic() -> Filter {
    Filter::eq("ym:s:trafficSource", Channel::Organic.as_str())
}

/// Client for one Metrika counter.
///
/// Use [`MetrikaClient::new`] for production or [`MetrikaClient::with_base_url`]
/// to point at a mock server in tests.
pub struct MetrikaClient {
    client: Client,
    base_url: Url,
    counter_id: String,
}

impl MetrikaClient {
    /// Creates a client pointed at the production Metrika API.
    ///
    /// # Errors
    ///
    /// Returns [`YandexError::InvalidConfig`] if the HTTP client cannot be built.
    pub fn new(token: &str, counter_id: &str, timeout_secs: u64) -> Result<Self, YandexError> {
        Self::with_base_url(token, counter_id, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`YandexError::InvalidConfig`] if the HTTP client cannot be
    /// built or `base_url` is not a valid URL.
    pub fn with_base_url(
        token: &str,
        counter_id: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, YandexError> {
        Ok(Self {
            client: build_client(token, timeout_secs)?,
            base_url: parse_base_url(base_url)?,
            counter_id: counter_id.to_owned(),
        })
    }

    #[must_use]
    pub fn counter_id(&self) -> &str {
        &self.counter_id
    }

    /// Lists counters visible to the token.
    ///
    /// # Errors
    ///
    /// [`YandexError::Auth`] on 403, [`YandexError::Api`] on any other failure,
    /// [`YandexError::Deserialize`] on an unexpected body.
    pub async fn counters(&self) -> Result<Vec<Counter>, YandexError> {
        let url = self.endpoint(COUNTERS_PATH)?;
        let body: CountersResponse = get_json(&self.client, Service::Metrika, url, &[]).await?;
        Ok(body.counters)
    }

    /// Total visits to the whole counter for `period`.
    ///
    /// # Errors
    ///
    /// See [`MetrikaClient::counters`].
    pub async fn total_visits(&self, period: &Period) -> Result<i32, YandexError> {
        let body = self.stat(StatQuery::new(period, METRIC_VISITS)).await?;
        Ok(first_visits(&body))
    }

    /// Visits to the section `url` arriving through `channel`.
    ///
    /// # Errors
    ///
    /// See [`MetrikaClient::counters`].
    pub async fn channel_visits(
        &self,
        period: &Period,
        channel: Channel,
        url: &str,
    ) -> Result<i32, YandexError> {
        let filter = Filter::eq("ym:s:trafficSource", channel.as_str())
            .and(Filter::eq("ym:s:startURLPathLevel2", url));
        let body = self
            .stat(StatQuery::new(period, METRIC_VISITS).filter(filter))
            .await?;
        Ok(first_visits(&body))
    }

    /// Visits to the section `url` for every [`Channel`], one request each.
    ///
    /// # Errors
    ///
    /// Stops at the first failing request. See [`MetrikaClient::counters`].
    pub async fn channel_totals(
        &self,
        period: &Period,
        url: &str,
    ) -> Result<ChannelTotals, YandexError> {
        let mut totals = ChannelTotals::default();
        for channel in Channel::ALL {
            let visits = self.channel_visits(period, channel, url).await?;
            totals = totals.with(channel, visits);
        }
        Ok(totals)
    }

    /// Visits, bounce rate, page depth and average visit duration, optionally
    /// restricted to visits entering directly on the section `base_url`.
    ///
    /// # Errors
    ///
    /// See [`MetrikaClient::counters`]. An empty report is not an error.
    pub async fn behavior_metrics(
        &self,
        period: &Period,
        base_url: Option<&str>,
    ) -> Result<BehaviorMetrics, YandexError> {
        let mut query = StatQuery::new(period, METRICS_BEHAVIOR);
        if let Some(base) = base_url {
            query = query.filter(Filter::matches(
                "ym:s:startURL",
                url_prefix_pattern(base, "[^/]*/?$"),
            ));
        }
        let body = self.stat(query).await?;
        Ok(behavior_from_response(&body))
    }

    /// Organic visits split into Yandex / Google / other engines.
    ///
    /// # Errors
    ///
    /// See [`MetrikaClient::counters`].
    pub async fn search_engine_split(
        &self,
        period: &Period,
        url: Option<&str>,
    ) -> Result<SearchEngineSplit, YandexError> {
        let mut filter = organic().and(Filter::ne("ym:s:searchEngine", "(none)"));
        if let Some(url) = url {
            filter = filter.and(Filter::eq("ym:pv:URLPathLevel2", url));
        }
        let query = StatQuery::new(period, METRIC_VISITS)
            .dimensions("ym:s:searchEngine")
            .filter(filter)
            .limit(SEARCH_ENGINE_LIMIT);
        let body = self.stat(query).await?;
        Ok(search_engines_from_response(&body))
    }

    /// Organic landing pages one level or more below `base_url`, most visited
    /// first, with each page's share of the returned visits.
    ///
    /// # Errors
    ///
    /// See [`MetrikaClient::counters`].
    pub async fn organic_landing_pages(
        &self,
        period: &Period,
        base_url: &str,
        limit: u32,
    ) -> Result<Vec<LandingPage>, YandexError> {
        let filter = organic().and(Filter::matches(
            "ym:s:startURL",
            url_prefix_pattern(base_url, "[^/]+/.*"),
        ));
        let query = StatQuery::new(period, METRICS_LANDING)
            .dimensions("ym:s:startURL")
            .filter(filter)
            .sort("-ym:s:visits")
            .limit(limit)
            .full_accuracy();
        let body = self.stat(query).await?;
        Ok(landing_pages_from_response(&body))
    }

    /// Visits per external referring domain, optionally for one entry URL.
    ///
    /// # Errors
    ///
    /// See [`MetrikaClient::counters`].
    pub async fn referral_traffic(
        &self,
        period: &Period,
        entry_url: Option<&str>,
    ) -> Result<BTreeMap<String, i32>, YandexError> {
        let mut query = StatQuery::new(period, METRIC_VISITS).dimensions("ym:s:externalReferer");
        if let Some(entry) = entry_url {
            query = query.filter(Filter::eq("ym:s:startURL", entry));
        }
        let body = self.stat(query).await?;
        Ok(referrals_from_response(&body))
    }

    /// Counter-wide visits per last-click traffic source, most visited first.
    ///
    /// # Errors
    ///
    /// See [`MetrikaClient::counters`].
    pub async fn top_sources(
        &self,
        period: &Period,
        limit: u32,
    ) -> Result<Vec<SourceVisits>, YandexError> {
        let query = StatQuery::new(period, METRIC_VISITS)
            .dimensions("ym:s:lastTrafficSource")
            .sort("-ym:s:visits")
            .limit(limit);
        let body = self.stat(query).await?;
        Ok(top_sources_from_response(&body))
    }

    async fn stat(&self, query: StatQuery<'_>) -> Result<StatResponse, YandexError> {
        let url = self.endpoint(STAT_PATH)?;
        let params = query.into_params(&self.counter_id);
        get_json(&self.client, Service::Metrika, url, &params).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, YandexError> {
        self.base_url
            .join(path)
            .map_err(|e| YandexError::InvalidConfig(format!("cannot join '{path}': {e}")))
    }
}
