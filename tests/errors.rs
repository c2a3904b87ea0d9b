mod common;

use common::{MockTransport, json_response};
use metrika_reporting_ga::{Client, ReportQuery, ReportingError, TransportError};
use reqwest::StatusCode;
use std::io;

fn client(transport: MockTransport) -> Client {
    let query = ReportQuery::new()
        .with_counter_id(12345)
        .with_metrics(["ga:visits", "ga:users"]);
    Client::with_transport("y0_test", transport)
        .unwrap()
        .with_query(query)
}

#[test]
fn client_error_carries_server_message_and_response() {
    let body = r#"{"error":{"code":"oauth_invalid","message":"Invalid token"}}"#;
    let server = MockTransport::fixed(400, body);
    let err = client(server).request(1, 1000).unwrap_err();

    let text = err.to_string();
    assert!(text.contains("oauth_invalid"), "{}", text);
    assert!(text.contains("Invalid token"), "{}", text);

    let response = err.response().expect("response attached");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), body);
    let decoded: serde_json::Value = response.json().unwrap();
    assert_eq!(decoded["error"]["code"], "oauth_invalid");
}

#[test]
fn top_level_error_shape() {
    let server = MockTransport::fixed(403, r#"{"code":403,"message":"Access is denied"}"#);
    match client(server).request(1, 10) {
        Err(ReportingError::Api { message, code, .. }) => {
            assert_eq!(message, "Access is denied");
            assert_eq!(code, "403");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn transport_failure_is_passed_through() {
    let server = MockTransport::new(|_| {
        Err(TransportError::new(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    });
    let err = client(server).request(1, 10).unwrap_err();

    assert_eq!(err.to_string(), "connection refused");
    match err {
        ReportingError::Transport(inner) => {
            let io_err = inner.downcast_ref::<io::Error>().expect("io error");
            assert_eq!(io_err.kind(), io::ErrorKind::ConnectionRefused);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn server_side_failure_is_not_decoded() {
    let server = MockTransport::fixed(500, r#"{"error":{"code":"internal","message":"boom"}}"#);
    let err = client(server).request(1, 10).unwrap_err();
    assert!(matches!(err, ReportingError::Status { .. }));
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}

#[test]
fn malformed_success_body_is_structural() {
    let server = MockTransport::fixed(200, r#"{"rows":[["a"]]}"#);
    let err = client(server.clone()).request(1, 10).unwrap_err();
    assert!(matches!(err, ReportingError::Decode(_)));
    assert!(err.response().is_none());

    let server = MockTransport::fixed(200, "not json");
    assert!(matches!(
        client(server).request(1, 10),
        Err(ReportingError::Decode(_))
    ));
}

#[test]
fn missing_metrics_never_reach_the_server() {
    let server = MockTransport::new(|_| Ok(json_response(200, "{}")));
    let client = Client::with_transport("y0_test", server.clone())
        .unwrap()
        .with_query(ReportQuery::new().with_counter_id("12345"));

    assert!(matches!(client.request(1, 10), Err(ReportingError::Config(_))));
    assert!(matches!(client.rows(100).next(), Some(Err(ReportingError::Config(_)))));
    assert_eq!(server.request_count(), 0);
}

#[test]
fn outgoing_request_shape() {
    let server = MockTransport::fixed(
        200,
        r#"{"columnHeaders":[{"name":"ga:visits"},{"name":"ga:users"}],"rows":[["10","7"]],"totalResults":1}"#,
    );
    let client = client(server.clone()).with_url("http://localhost:9/ga");
    let report = client.request(1, 1000).unwrap();
    assert_eq!(report.header(), ["ga:visits", "ga:users"]);

    let request = &server.requests()[0];
    assert_eq!(request.url, "http://localhost:9/ga");
    assert_eq!(request.query_value("ids"), Some("ga:12345"));
    assert_eq!(request.query_value("metrics"), Some("ga:visits,ga:users"));
    assert_eq!(request.headers["authorization"], "OAuth y0_test");
    assert_eq!(request.headers["accept-encoding"], "gzip, deflate");
}
