//! HTTP IP source tests against a local mock server

use cfdns_core::config::IpSourceConfig;
use cfdns_core::{Error, IpSource};
use cfdns_ip_http::HttpIpSource;
use serde_json::json;
use std::net::Ipv4Addr;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn source_for(server: &MockServer, body: ResponseTemplate) -> HttpIpSource {
    Mock::given(method("GET"))
        .and(path("/myip.php"))
        .respond_with(body)
        .mount(server)
        .await;

    HttpIpSource::new(&IpSourceConfig {
        url: format!("{}/myip.php", server.uri()),
        timeout_secs: 5,
        ..IpSourceConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn reads_configured_field() {
    let server = MockServer::start().await;
    let source = source_for(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"myip": "203.0.113.7"})),
    )
    .await;

    assert_eq!(source.current().await.unwrap(), Ipv4Addr::new(203, 0, 113, 7));
}

#[tokio::test]
async fn every_call_hits_the_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"myip": "203.0.113.7"})))
        .expect(3)
        .mount(&server)
        .await;

    let source = HttpIpSource::new(&IpSourceConfig {
        url: server.uri(),
        ..IpSourceConfig::default()
    })
    .unwrap();

    for _ in 0..3 {
        source.current().await.unwrap();
    }
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let server = MockServer::start().await;
    let source = source_for(&server, ResponseTemplate::new(500)).await;

    assert!(matches!(source.current().await, Err(Error::IpUnavailable(_))));
}

#[tokio::test]
async fn non_json_body_is_unavailable() {
    let server = MockServer::start().await;
    let source = source_for(
        &server,
        ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
    )
    .await;

    assert!(matches!(source.current().await, Err(Error::IpUnavailable(_))));
}

#[tokio::test]
async fn missing_field_is_unavailable() {
    let server = MockServer::start().await;
    let source = source_for(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"ip": "203.0.113.7"})),
    )
    .await;

    assert!(matches!(source.current().await, Err(Error::IpUnavailable(_))));
}

#[tokio::test]
async fn ipv6_answer_is_unavailable() {
    let server = MockServer::start().await;
    let source = source_for(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"myip": "2001:db8::1"})),
    )
    .await;

    assert!(matches!(source.current().await, Err(Error::IpUnavailable(_))));
}

#[tokio::test]
async fn unreachable_service_is_unavailable() {
    let source = HttpIpSource::new(&IpSourceConfig {
        url: "http://127.0.0.1:9/myip.php".to_string(),
        timeout_secs: 2,
        ..IpSourceConfig::default()
    })
    .unwrap();

    assert!(matches!(source.current().await, Err(Error::IpUnavailable(_))));
}
