//! Request plumbing shared by both clients.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::{Service, YandexError};

const USER_AGENT: &str = "trafficdb/0.1 (web-analytics)";

/// Longest response body excerpt kept in an error message.
const BODY_EXCERPT_CHARS: usize = 300;

/// Builds a client that sends `Authorization: OAuth <token>` on every request.
pub(crate) fn build_client(token: &str, timeout_secs: u64) -> Result<Client, YandexError> {
    let mut auth = HeaderValue::from_str(&format!("OAuth {token}"))
        .map_err(|e| YandexError::InvalidConfig(format!("token is not a valid header value: {e}")))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| YandexError::InvalidConfig(format!("failed to build HTTP client: {e}")))
}

/// Parses `base_url`, forcing exactly one trailing slash so that relative
/// joins append to the path instead of replacing its last segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, YandexError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised)
        .map_err(|e| YandexError::InvalidConfig(format!("invalid base URL '{base_url}': {e}")))
}

/// Sends one GET and decodes the JSON body.
///
/// 403 maps to [`YandexError::Auth`]; any other non-2xx status or transport
/// failure maps to [`YandexError::Api`]. No retries.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    service: Service,
    url: Url,
    query: &[(&str, String)],
) -> Result<T, YandexError> {
    tracing::debug!(%service, path = url.path(), "GET");

    let response = client
        .get(url.clone())
        .query(query)
        .send()
        .await
        .map_err(|e| YandexError::transport(service, &e))?;

    let status = response.status();
    if status == StatusCode::FORBIDDEN {
        return Err(YandexError::Auth { service });
    }

    if !status.is_success() {
        let body = response.text().await.ok();
        let excerpt: String = body
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(BODY_EXCERPT_CHARS)
            .collect();
        return Err(YandexError::Api {
            service,
            status: Some(status.as_u16()),
            message: format!("HTTP {status} from {}: {excerpt}", url.path()),
            body,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| YandexError::transport(service, &e))?;

    serde_json::from_str(&body).map_err(|source| YandexError::Deserialize {
        service,
        context: url.path().to_string(),
        source,
    })
}
