//! Integration tests for `MetrikaClient` using wiremock HTTP mocks.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use trafficdb_core::Period;
use trafficdb_yandex::{MetrikaClient, Service, YandexError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> MetrikaClient {
    MetrikaClient::with_base_url("test-token", "99370966", 5, base_url)
        .expect("client construction should not fail")
}

fn june() -> Period {
    Period::new(
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
    )
}

fn visits_body(visits: f64) -> serde_json::Value {
    json!({ "data": [{ "dimensions": [], "metrics": [visits] }], "total_rows": 1 })
}

#[tokio::test]
async fn channel_totals_issues_one_request_per_channel() {
    let server = MockServer::start().await;
    let url = "https://example.org/section/";

    let expected = [
        ("organic", 120.0),
        ("direct", 40.0),
        ("social", 7.0),
        ("referral", 3.0),
        ("ad", 0.0),
        ("internal", 15.0),
        ("email", 1.0),
    ];

    for (channel, visits) in expected {
        let filter = format!(
            "ym:s:trafficSource=='{channel}' AND ym:s:startURLPathLevel2=='{url}'"
        );
        Mock::given(method("GET"))
            .and(path("/stat/v1/data"))
            .and(header("Authorization", "OAuth test-token"))
            .and(query_param("ids", "99370966"))
            .and(query_param("metrics", "ym:s:visits"))
            .and(query_param("date1", "2025-06-15"))
            .and(query_param("date2", "2025-06-30"))
            .and(query_param("filters", filter.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(visits_body(visits)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = test_client(&server.uri());
    let totals = client
        .channel_totals(&june(), url)
        .await
        .expect("should fetch channel totals");

    assert_eq!(totals.organic, 120);
    assert_eq!(totals.direct, 40);
    assert_eq!(totals.social, 7);
    assert_eq!(totals.referral, 3);
    assert_eq!(totals.ad, 0);
    assert_eq!(totals.internal, 15);
    assert_eq!(totals.email, 1);
}

#[tokio::test]
async fn channel_visits_defaults_to_zero_without_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [], "total_rows": 0 })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let visits = client
        .channel_visits(&june(), trafficdb_core::Channel::Email, "https://example.org/a/")
        .await
        .expect("empty report is not an error");
    assert_eq!(visits, 0);
}

#[tokio::test]
async fn behavior_metrics_with_url_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .and(query_param(
            "metrics",
            "ym:s:visits,ym:s:bounceRate,ym:s:pageDepth,ym:s:avgVisitDurationSeconds",
        ))
        .and(query_param(
            "filters",
            r"ym:s:startURL=~'^https://example\\.org/section/[^/]*/?$'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "dimensions": [], "metrics": [250.0, 31.2456, 1.5678, 74.9] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let metrics = client
        .behavior_metrics(&june(), Some("https://example.org/section/?utm_source=x"))
        .await
        .expect("should fetch behavior metrics");

    assert_eq!(metrics.visits, 250);
    assert_eq!(metrics.bounce_rate, Decimal::new(312, 1));
    assert_eq!(metrics.page_depth, Decimal::new(157, 2));
    assert_eq!(metrics.avg_visit, Decimal::from(74));
}

#[tokio::test]
async fn behavior_metrics_zeroed_when_report_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let metrics = client
        .behavior_metrics(&june(), None)
        .await
        .expect("empty report is not an error");

    assert_eq!(metrics.visits, 0);
    assert_eq!(metrics.bounce_rate, Decimal::ZERO);
    assert_eq!(metrics.page_depth, Decimal::ZERO);
    assert_eq!(metrics.avg_visit, Decimal::ZERO);
}

#[tokio::test]
async fn search_engine_split_buckets_engines() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .and(query_param("dimensions", "ym:s:searchEngine"))
        .and(query_param("limit", "10"))
        .and(query_param(
            "filters",
            "ym:s:trafficSource=='organic' AND ym:s:searchEngine!='(none)' \
             AND ym:pv:URLPathLevel2=='https://example.org/section/'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "dimensions": [{ "name": "Yandex" }], "metrics": [90.0] },
                { "dimensions": [{ "name": "Google" }], "metrics": [30.0] },
                { "dimensions": [{ "name": "Yandex (mobile)" }], "metrics": [10.0] },
                { "dimensions": [{ "name": "Bing" }], "metrics": [2.0] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let split = client
        .search_engine_split(&june(), Some("https://example.org/section/"))
        .await
        .expect("should fetch engine split");

    assert_eq!(split.yandex, 100);
    assert_eq!(split.google, 30);
    assert_eq!(split.other, 2);
}

#[tokio::test]
async fn organic_landing_pages_compute_traffic_share() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .and(query_param("dimensions", "ym:s:startURL"))
        .and(query_param("metrics", "ym:s:visits,ym:s:bounceRate"))
        .and(query_param("sort", "-ym:s:visits"))
        .and(query_param("limit", "100"))
        .and(query_param("accuracy", "full"))
        .and(query_param(
            "filters",
            r"ym:s:trafficSource=='organic' AND ym:s:startURL=~'^https://example\\.org/section/[^/]+/.*'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "dimensions": [{ "name": "https://example.org/section/one/" }], "metrics": [30.0, 20.04] },
                { "dimensions": [{ "name": "https://example.org/section/two/" }], "metrics": [10.0, 45.56] },
                { "dimensions": [{ "name": "https://example.org/section/three/" }], "metrics": [0.0, 0.0] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let pages = client
        .organic_landing_pages(&june(), "https://example.org/section/", 100)
        .await
        .expect("should fetch landing pages");

    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0].page_url, "https://example.org/section/one/");
    assert_eq!(pages[0].traffic_share, Decimal::new(750, 1));
    assert_eq!(pages[1].traffic_share, Decimal::new(250, 1));
    assert_eq!(pages[2].traffic_share, Decimal::ZERO);
    assert_eq!(pages[0].bounce_rate, Decimal::new(200, 1));
    assert_eq!(pages[1].bounce_rate, Decimal::new(456, 1));
}

#[tokio::test]
async fn referral_traffic_maps_domains() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .and(query_param("dimensions", "ym:s:externalReferer"))
        .and(query_param(
            "filters",
            "ym:s:startURL=='https://example.org/section/'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "dimensions": [{ "name": "vk.com" }], "metrics": [11.0] },
                { "dimensions": [{ "name": "t.me" }], "metrics": [5.0] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let referrals = client
        .referral_traffic(&june(), Some("https://example.org/section/"))
        .await
        .expect("should fetch referrals");

    assert_eq!(referrals.len(), 2);
    assert_eq!(referrals["vk.com"], 11);
    assert_eq!(referrals["t.me"], 5);
}

#[tokio::test]
async fn counters_are_listed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/management/v1/counters"))
        .and(header("Authorization", "OAuth test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": 1,
            "counters": [{ "id": 99_370_966, "name": "example.org", "site": "example.org" }]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let counters = client.counters().await.expect("should list counters");
    assert_eq!(counters.len(), 1);
    assert_eq!(counters[0].id, 99_370_966);
    assert_eq!(counters[0].site.as_deref(), Some("example.org"));
}

#[tokio::test]
async fn forbidden_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errors": [{ "error_type": "access_denied", "message": "Access is denied" }],
            "code": 403
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .behavior_metrics(&june(), None)
        .await
        .expect_err("403 must fail");

    assert!(
        matches!(err, YandexError::Auth { service: Service::Metrika }),
        "expected Auth error, got: {err:?}"
    );
    assert!(err.is_auth());
}

#[tokio::test]
async fn server_error_is_api_error_with_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .total_visits(&june())
        .await
        .expect_err("500 must fail");

    match err {
        YandexError::Api {
            service,
            status,
            body,
            ..
        } => {
            assert_eq!(service, Service::Metrika);
            assert_eq!(status, Some(500));
            assert_eq!(body.as_deref(), Some("backend exploded"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn bad_request_is_api_error_not_auth() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .respond_with(ResponseTemplate::new(400).set_body_string("wrong filter"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .search_engine_split(&june(), None)
        .await
        .expect_err("400 must fail");

    assert!(!err.is_auth());
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn connection_failure_is_api_error_without_status() {
    // Port 1 is privileged and unused on test hosts.
    let client = test_client("http://127.0.0.1:1");
    let err = client
        .total_visits(&june())
        .await
        .expect_err("unreachable server must fail");

    assert!(
        matches!(err, YandexError::Api { status: None, body: None, .. }),
        "expected transport Api error, got: {err:?}"
    );
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .total_visits(&june())
        .await
        .expect_err("non-json body must fail");

    assert!(
        matches!(err, YandexError::Deserialize { service: Service::Metrika, .. }),
        "expected Deserialize error, got: {err:?}"
    );
}

#[tokio::test]
async fn top_sources_sorts_by_visits_with_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .and(query_param("metrics", "ym:s:visits"))
        .and(query_param("dimensions", "ym:s:lastTrafficSource"))
        .and(query_param("sort", "-ym:s:visits"))
        .and(query_param("limit", "5"))
        .and(query_param("date1", "2025-06-15"))
        .and(query_param("date2", "2025-06-30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "dimensions": [{ "name": "Search engine traffic" }], "metrics": [410.0] },
                { "dimensions": [{ "name": "Direct traffic" }], "metrics": [88.0] }
            ],
            "total_rows": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let sources = client
        .top_sources(&june(), 5)
        .await
        .expect("should fetch top sources");

    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].source, "Search engine traffic");
    assert_eq!(sources[0].visits, 410);
    assert_eq!(sources[1].source, "Direct traffic");
    assert_eq!(sources[1].visits, 88);
}
