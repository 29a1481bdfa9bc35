//! HTTP client for the Yandex Webmaster v4 API.
//!
//! Host-scoped endpoints live under `/user/{user_id}/hosts/{host_id}/`. The
//! numeric user id is not derivable from the token, so [`WebmasterClient::connect`]
//! looks it up with `GET /user` when it is not configured.

use reqwest::{Client, Url};
use trafficdb_core::Period;

use crate::error::{Service, YandexError};
use crate::http::{build_client, get_json, parse_base_url};
use crate::normalize::{query_stats_from_response, QueryStat};
use crate::types::{HostSummary, PopularQueriesResponse, UserResponse};

const DEFAULT_BASE_URL: &str = "https://api.webmaster.yandex.net/v4/";

/// Indicators requested for every popular-queries report.
const QUERY_INDICATORS: [&str; 4] = [
    "TOTAL_SHOWS",
    "TOTAL_CLICKS",
    "AVG_SHOW_POSITION",
    "AVG_CLICK_POSITION",
];

/// Client bound to one Webmaster user and host.
pub struct WebmasterClient {
    client: Client,
    base_url: Url,
    user_id: i64,
    host_id: String,
}

impl WebmasterClient {
    /// Creates a client against the production API, resolving the user id
    /// when `user_id` is `None`.
    ///
    /// # Errors
    ///
    /// [`YandexError::InvalidConfig`] if the client cannot be built; any
    /// error from the user lookup otherwise.
    pub async fn connect(
        token: &str,
        host_id: &str,
        user_id: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Self, YandexError> {
        Self::connect_with_base_url(token, host_id, user_id, timeout_secs, DEFAULT_BASE_URL).await
    }

    /// Same as [`WebmasterClient::connect`] with a custom base URL (for
    /// testing with wiremock).
    ///
    /// # Errors
    ///
    /// See [`WebmasterClient::connect`].
    pub async fn connect_with_base_url(
        token: &str,
        host_id: &str,
        user_id: Option<i64>,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, YandexError> {
        let client = build_client(token, timeout_secs)?;
        let base_url = parse_base_url(base_url)?;

        let user_id = match user_id {
            Some(id) => id,
            None => {
                let url = join_segments(&base_url, &["user"])?;
                let body: UserResponse = get_json(&client, Service::Webmaster, url, &[]).await?;
                tracing::debug!(user_id = body.user_id, "resolved Webmaster user id");
                body.user_id
            }
        };

        Ok(Self {
            client,
            base_url,
            user_id,
            host_id: host_id.to_owned(),
        })
    }

    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    #[must_use]
    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// Indexing summary for the host.
    ///
    /// # Errors
    ///
    /// [`YandexError::Auth`] on 403, [`YandexError::Api`] on any other failure,
    /// [`YandexError::Deserialize`] on an unexpected body.
    pub async fn summary(&self) -> Result<HostSummary, YandexError> {
        let url = self.host_endpoint(&["summary"])?;
        get_json(&self.client, Service::Webmaster, url, &[]).await
    }

    /// Popular search queries for `period`, ordered by total clicks.
    ///
    /// # Errors
    ///
    /// See [`WebmasterClient::summary`].
    pub async fn top_search_queries(&self, period: &Period) -> Result<Vec<QueryStat>, YandexError> {
        let url = self.host_endpoint(&["search-queries", "popular"])?;
        let params = popular_query_params(period);
        let body: PopularQueriesResponse =
            get_json(&self.client, Service::Webmaster, url, &params).await?;
        Ok(query_stats_from_response(&body))
    }

    fn host_endpoint(&self, tail: &[&str]) -> Result<Url, YandexError> {
        let user_id = self.user_id.to_string();
        let mut segments = vec!["user", user_id.as_str(), "hosts", self.host_id.as_str()];
        segments.extend_from_slice(tail);
        join_segments(&self.base_url, &segments)
    }
}

fn popular_query_params(period: &Period) -> Vec<(&'static str, String)> {
    let mut params = vec![("order_by", "TOTAL_CLICKS".to_string())];
    params.extend(
        QUERY_INDICATORS
            .iter()
            .map(|indicator| ("query_indicator", (*indicator).to_string())),
    );
    params.push(("date_from", period.start_param()));
    params.push(("date_to", period.end_param()));
    params
}

/// Appends percent-encoded path segments to `base`.
fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, YandexError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| YandexError::InvalidConfig(format!("base URL '{base}' cannot have a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
