//! Scripted in-memory transport for driving the client without a network.

#![allow(dead_code)]

use metrika_reporting_ga::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Transport that answers every request with a closure and records the
/// requests it has seen. Clones share the recorded requests.
#[derive(Clone)]
pub struct MockTransport {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always responds with `status` and `body`.
    pub fn fixed(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(move |_| Ok(json_response(status, &body)))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpTransport for MockTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }
}

pub fn json_response(status: u16, body: &str) -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    HttpResponse::new(StatusCode::from_u16(status).unwrap(), headers, body)
}

/// Report page body with `ga:pagePath` / `ga:visits` columns.
pub fn page_body(rows: &[(String, u64)], total: u64) -> String {
    let rows: Vec<Value> = rows
        .iter()
        .map(|(path, visits)| json!([path, visits.to_string()]))
        .collect();
    json!({
        "columnHeaders": [
            {"name": "ga:pagePath", "columnType": "DIMENSION", "dataType": "STRING"},
            {"name": "ga:visits", "columnType": "METRIC", "dataType": "INTEGER"}
        ],
        "rows": rows,
        "totalResults": total
    })
    .to_string()
}

/// Server holding `total` rows, honouring `start-index` and `max-results`.
pub fn paged_server(total: u64) -> MockTransport {
    MockTransport::new(move |req| {
        let start: u64 = req.query_value("start-index").unwrap().parse().unwrap();
        let count: u64 = req.query_value("max-results").unwrap().parse().unwrap();
        let end = (start + count).min(total + 1);
        let rows: Vec<(String, u64)> = (start..end).map(|i| (format!("/page/{}", i), i)).collect();
        Ok(json_response(200, &page_body(&rows, total)))
    })
}
