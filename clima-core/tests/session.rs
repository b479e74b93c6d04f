//! End-to-end tests for a search session, using wiremock as the config endpoint and the
//! weather provider.

use std::time::Duration;

use clima_core::{Config, KeyStatus, LookupError, Session, WeatherResult, render};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    Config {
        config_url: format!("{}/api/config", server.uri()),
        weather_base_url: format!("{}/data/2.5", server.uri()),
        min_search_interval_ms: 0,
        ..Config::default()
    }
}

fn current_body(name: &str) -> Value {
    json!({
        "cod": 200,
        "name": name,
        "coord": { "lat": 40.4165, "lon": -3.7026 },
        "main": { "temp": 21.37, "humidity": 40 },
        "weather": [{ "description": "cielo claro", "icon": "01d" }],
        "wind": { "speed": 3.6 },
        "timezone": 7200
    })
}

fn forecast_body(entries: usize) -> Value {
    let list: Vec<Value> = (0..entries)
        .map(|i| {
            json!({
                "dt": 1_717_243_200 + (i as i64) * 10_800,
                "main": { "temp": 15.0 + i as f64 },
                "weather": [{ "description": format!("paso {i}"), "icon": "02d" }]
            })
        })
        .collect();

    json!({ "cod": "200", "city": { "name": "Madrid", "timezone": 7200 }, "list": list })
}

async fn mount_key(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "apiKey": "KEY" })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_current(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn mount_forecast(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn forbid_forecast(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or_default()
}

#[tokio::test]
async fn search_returns_current_and_first_sixteen_forecast_entries() {
    let server = MockServer::start().await;
    mount_key(&server).await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Madrid"))
        .and(query_param("units", "metric"))
        .and(query_param("lang", "es"))
        .and(query_param("appid", "KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Madrid")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("q", "Madrid"))
        .and(query_param("appid", "KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(20)))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::new(&config_for(&server)).unwrap();
    let result = session.search("Madrid").await.unwrap();

    let WeatherResult::Complete(report) = result else {
        panic!("expected a complete report");
    };

    assert_eq!(report.current.city_name, "Madrid");
    assert_eq!(report.current.humidity_pct, 40);
    assert_eq!(report.forecast.entries.len(), 16);

    let descriptions: Vec<&str> = report
        .forecast
        .entries
        .iter()
        .map(|e| e.description.as_str())
        .collect();
    let expected: Vec<String> = (0..16).map(|i| format!("paso {i}")).collect();
    assert_eq!(descriptions, expected);
    assert!(
        report
            .forecast
            .entries
            .windows(2)
            .all(|w| w[0].timestamp_utc < w[1].timestamp_utc)
    );
}

#[tokio::test]
async fn configured_forecast_limit_never_exceeds_sixteen() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(&server, ResponseTemplate::new(200).set_body_json(current_body("Madrid"))).await;
    mount_forecast(&server, ResponseTemplate::new(200).set_body_json(forecast_body(40))).await;

    let config = Config {
        forecast_limit: 40,
        ..config_for(&server)
    };
    let session = Session::new(&config).unwrap();
    let result = session.search("Madrid").await.unwrap();

    assert_eq!(result.forecast().map(|f| f.entries.len()), Some(16));
}

#[tokio::test]
async fn city_with_spaces_and_accents_is_url_escaped() {
    let server = MockServer::start().await;
    mount_key(&server).await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "San Sebastián, ES"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("San Sebastián")))
        .expect(1)
        .mount(&server)
        .await;
    mount_forecast(&server, ResponseTemplate::new(200).set_body_json(forecast_body(3))).await;

    let session = Session::new(&config_for(&server)).unwrap();
    let result = session.search(" San Sebastián, ES ").await.unwrap();
    assert_eq!(result.current().city_name, "San Sebastián");
}

#[tokio::test]
async fn invalid_input_makes_no_requests() {
    let server = MockServer::start().await;
    let session = Session::new(&config_for(&server)).unwrap();

    for input in ["", "   ", "Madrid<br>", "Paris&appid=x", "Tokyo 東京", "1234"] {
        let err = session.search(input).await.unwrap_err();
        assert!(matches!(err, LookupError::InvalidInput(_)), "{input:?} gave {err:?}");
    }

    assert_eq!(request_count(&server).await, 0);
    assert_eq!(session.keys().status(), KeyStatus::Empty);
}

#[tokio::test]
async fn rapid_second_search_is_rate_limited_without_requests() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(&server, ResponseTemplate::new(200).set_body_json(current_body("Lima"))).await;
    mount_forecast(&server, ResponseTemplate::new(200).set_body_json(forecast_body(2))).await;

    let config = Config {
        min_search_interval_ms: 2000,
        ..config_for(&server)
    };
    let session = Session::new(&config).unwrap();

    session.search("Lima").await.unwrap();
    let after_first = request_count(&server).await;

    let err = session.search("Lima").await.unwrap_err();
    assert!(matches!(err, LookupError::RateLimited(_)));
    assert_eq!(request_count(&server).await, after_first);
}

#[tokio::test]
async fn spaced_searches_both_proceed() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(&server, ResponseTemplate::new(200).set_body_json(current_body("Lima"))).await;
    mount_forecast(&server, ResponseTemplate::new(200).set_body_json(forecast_body(2))).await;

    let config = Config {
        min_search_interval_ms: 100,
        ..config_for(&server)
    };
    let session = Session::new(&config).unwrap();

    session.search("Lima").await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    session.search("Lima").await.unwrap();

    // One key fetch, then two request pairs.
    assert_eq!(request_count(&server).await, 5);
}

#[tokio::test]
async fn unauthorized_maps_to_invalid_key_and_skips_forecast() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(
        &server,
        ResponseTemplate::new(401).set_body_json(json!({
            "cod": 401,
            "message": "Invalid API key."
        })),
    )
    .await;
    forbid_forecast(&server).await;

    let session = Session::new(&config_for(&server)).unwrap();
    let err = session.search("Madrid").await.unwrap_err();
    assert!(matches!(err, LookupError::InvalidKey));
}

#[tokio::test]
async fn rejected_key_in_ok_envelope_maps_to_invalid_key() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "cod": 401,
            "message": "Invalid API key."
        })),
    )
    .await;
    forbid_forecast(&server).await;

    let session = Session::new(&config_for(&server)).unwrap();
    let err = session.search("Madrid").await.unwrap_err();
    assert!(matches!(err, LookupError::InvalidKey));
}

#[tokio::test]
async fn not_found_maps_to_city_not_found() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(
        &server,
        ResponseTemplate::new(404).set_body_json(json!({ "cod": "404", "message": "city not found" })),
    )
    .await;
    forbid_forecast(&server).await;

    let session = Session::new(&config_for(&server)).unwrap();
    let err = session.search("Atlantis").await.unwrap_err();
    assert!(matches!(err, LookupError::CityNotFound));
}

#[tokio::test]
async fn soft_error_in_ok_envelope_maps_to_city_not_found() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "cod": "404", "message": "city not found" })),
    )
    .await;
    forbid_forecast(&server).await;

    let session = Session::new(&config_for(&server)).unwrap();
    let err = session.search("Atlantis").await.unwrap_err();
    assert!(matches!(err, LookupError::CityNotFound));
}

#[tokio::test]
async fn unexpected_status_maps_to_upstream_error() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(&server, ResponseTemplate::new(503)).await;
    forbid_forecast(&server).await;

    let session = Session::new(&config_for(&server)).unwrap();
    let err = session.search("Madrid").await.unwrap_err();
    assert!(matches!(err, LookupError::UpstreamError(503)));
}

#[tokio::test]
async fn malformed_current_body_is_reported() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "cod": 200, "name": "Madrid" })),
    )
    .await;
    forbid_forecast(&server).await;

    let session = Session::new(&config_for(&server)).unwrap();
    let err = session.search("Madrid").await.unwrap_err();
    assert!(matches!(err, LookupError::MalformedResponse(_)));
}

#[tokio::test]
async fn forecast_failure_keeps_current_conditions() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(&server, ResponseTemplate::new(200).set_body_json(current_body("Quito"))).await;
    mount_forecast(&server, ResponseTemplate::new(502)).await;

    let session = Session::new(&config_for(&server)).unwrap();
    let result = session.search("Quito").await.unwrap();

    assert_eq!(result.current().city_name, "Quito");
    assert!(result.forecast().is_none());
    assert!(matches!(result.error(), Some(LookupError::ForecastUnavailable)));
}

#[tokio::test]
async fn forecast_soft_error_is_forecast_unavailable() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(&server, ResponseTemplate::new(200).set_body_json(current_body("Quito"))).await;
    mount_forecast(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "cod": "500", "message": "internal" })),
    )
    .await;

    let session = Session::new(&config_for(&server)).unwrap();
    let result = session.search("Quito").await.unwrap();
    assert!(matches!(result.error(), Some(LookupError::ForecastUnavailable)));
}

#[tokio::test]
async fn slow_current_conditions_time_out() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(current_body("Madrid"))
            .set_delay(Duration::from_secs(5)),
    )
    .await;
    forbid_forecast(&server).await;

    let config = Config {
        request_timeout_ms: 200,
        ..config_for(&server)
    };
    let session = Session::new(&config).unwrap();

    let err = tokio::time::timeout(Duration::from_secs(3), session.search("Madrid"))
        .await
        .expect("pipeline must not hang past its stage timeout")
        .unwrap_err();
    assert!(matches!(err, LookupError::Timeout));
}

#[tokio::test]
async fn key_is_fetched_once_per_session() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(&server, ResponseTemplate::new(200).set_body_json(current_body("Cusco"))).await;
    mount_forecast(&server, ResponseTemplate::new(200).set_body_json(forecast_body(1))).await;

    let mut session = Session::new(&config_for(&server)).unwrap();
    session.prefetch_key();

    session.search("Cusco").await.unwrap();
    session.search("Cusco").await.unwrap();

    assert_eq!(session.keys().status(), KeyStatus::Ready);
    // `mount_key` expects exactly one config request; verified when the server drops.
}

#[tokio::test]
async fn failed_key_fetch_is_sticky() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "Application configuration error." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Madrid")))
        .expect(0)
        .mount(&server)
        .await;

    let session = Session::new(&config_for(&server)).unwrap();

    assert!(matches!(
        session.search("Madrid").await,
        Err(LookupError::KeyUnavailable)
    ));
    assert!(matches!(
        session.search("Madrid").await,
        Err(LookupError::KeyUnavailable)
    ));
    assert_eq!(session.keys().status(), KeyStatus::Failed);
}

#[tokio::test]
async fn config_without_api_key_field_is_key_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "something": "else" })))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::new(&config_for(&server)).unwrap();
    assert!(matches!(
        session.search("Madrid").await,
        Err(LookupError::KeyUnavailable)
    ));
}

#[tokio::test]
async fn script_in_city_name_renders_as_text() {
    let server = MockServer::start().await;
    mount_key(&server).await;
    mount_current(
        &server,
        ResponseTemplate::new(200).set_body_json(current_body("<script>alert('x')</script>")),
    )
    .await;
    mount_forecast(&server, ResponseTemplate::new(200).set_body_json(forecast_body(1))).await;

    let session = Session::new(&config_for(&server)).unwrap();
    let result = session.search("Madrid").await.unwrap();

    let html = render::report_html(&result);
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"));
}
