// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Request handler: maps inbound HTTP requests onto bridge operations
//!
//! Decoded adapter output is relayed verbatim with the operation's success
//! status. Faults are answered in plain text with a message that never
//! carries subprocess details.

use crate::bridge::{ExecutionBridge, Operation};
use crate::error::AdapterError;
use crate::request::{AdapterConfig, NO_BODY};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

/// API route definitions
pub mod routes {
    pub const COLLECT: &str = "/collect";
    pub const TEST: &str = "/test";
    pub const ENDPOINT_URLS: &str = "/endpointURLs";
    pub const DEFINITION: &str = "/definition";
    pub const API_VERSION: &str = "/apiVersion";
    pub const VERSION: &str = "/version";
    pub const HEALTH: &str = "/health";
}

/// Version of the HTTP contract between the platform and the adapter server
pub const API_VERSION: ApiVersion = ApiVersion {
    major: 1,
    minor: 0,
    maintenance: 0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    pub maintenance: u32,
}

/// HTTP request
#[derive(Debug, Default)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub client_addr: Option<SocketAddr>,
}

impl HttpRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Client address for log lines, `-` when unknown
    pub fn peer(&self) -> String {
        self.client_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }
}

/// HTTP response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    /// Create a JSON response
    pub fn json<T: Serialize>(status: u16, data: &T) -> Self {
        let body = serde_json::to_string(data).unwrap_or_default();
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a plain-text response
    pub fn text(status: u16, message: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            "text/plain; charset=utf-8".to_string(),
        );
        Self {
            status,
            headers,
            body: message.to_string(),
        }
    }

    /// 200 OK
    pub fn ok<T: Serialize>(data: &T) -> Self {
        Self::json(200, data)
    }

    /// 400 Bad Request
    pub fn bad_request(message: &str) -> Self {
        Self::text(400, message)
    }

    /// 404 Not Found
    pub fn not_found(message: &str) -> Self {
        Self::text(404, message)
    }

    /// 405 Method Not Allowed
    pub fn method_not_allowed(message: &str) -> Self {
        Self::text(405, message)
    }

    /// Status and public message of a bridge fault
    pub fn from_error(err: &AdapterError) -> Self {
        Self::text(err.status_code(), &err.public_message())
    }
}

/// Dispatches requests to the bridge
#[derive(Clone)]
pub struct RequestHandler {
    bridge: ExecutionBridge,
    request_logging: bool,
}

impl RequestHandler {
    pub fn new(bridge: ExecutionBridge) -> Self {
        let request_logging = bridge.config().server.request_logging;
        Self {
            bridge,
            request_logging,
        }
    }

    /// Handle an HTTP request
    pub fn handle(&self, request: HttpRequest) -> HttpResponse {
        let start = Instant::now();
        let response = self.route(&request);

        if self.request_logging {
            log::info!(
                "{} {} {} {} {}ms",
                request.peer(),
                request.method,
                request.path,
                response.status,
                start.elapsed().as_millis()
            );
        }

        response
    }

    fn route(&self, request: &HttpRequest) -> HttpResponse {
        match (request.method.as_str(), request.path.as_str()) {
            ("POST", routes::COLLECT) => self.handle_operation(Operation::Collect, request),
            ("POST", routes::TEST) => self.handle_operation(Operation::Test, request),
            ("POST", routes::ENDPOINT_URLS) => {
                self.handle_operation(Operation::EndpointUrls, request)
            }
            ("GET", routes::DEFINITION) => self.handle_definition(),
            ("GET", routes::API_VERSION) => HttpResponse::ok(&API_VERSION),
            ("GET", routes::VERSION) => HttpResponse::ok(&self.bridge.config().version_string()),
            ("GET", routes::HEALTH) => HttpResponse::ok(&serde_json::json!({"status": "healthy"})),
            (
                _,
                routes::COLLECT
                | routes::TEST
                | routes::ENDPOINT_URLS
                | routes::DEFINITION
                | routes::API_VERSION
                | routes::VERSION
                | routes::HEALTH,
            ) => HttpResponse::method_not_allowed("Method not allowed"),
            _ => HttpResponse::not_found("Unknown route"),
        }
    }

    fn handle_operation(&self, operation: Operation, request: &HttpRequest) -> HttpResponse {
        let Some(body) = request.body.as_deref() else {
            log::debug!("No body in request");
            return HttpResponse::bad_request(NO_BODY);
        };
        let config = match AdapterConfig::from_body(body) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("{}", e);
                return HttpResponse::from_error(&e);
            }
        };

        match self.bridge.execute(operation, Some(&config)) {
            Ok(response) => HttpResponse::json(response.status, &response.body),
            Err(e) => HttpResponse::from_error(&e),
        }
    }

    /// An adapter may legitimately produce no definition; that is a 204.
    fn handle_definition(&self) -> HttpResponse {
        match self.bridge.execute(Operation::AdapterDefinition, None) {
            Ok(response) => HttpResponse::json(response.status, &response.body),
            Err(e) if e.is_no_result() => HttpResponse::json(204, &serde_json::json!({})),
            Err(e) => HttpResponse::from_error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ServiceConfig;
    use std::sync::Arc;
    use tempfile::TempDir;

    const BODY: &str = r#"{"adapterKey": {"name": "i", "adapterKind": "X", "objectKind": "X_instance",
        "identifiers": [{"key": "host", "value": "h1", "isPartOfUniqueness": true}]}}"#;

    /// Handler whose operations run the given shell snippets
    fn handler(dir: &TempDir, scripts: &[(&str, &str)]) -> RequestHandler {
        let mut config = ServiceConfig::default();
        for (operation, script) in scripts {
            let path = dir.path().join(format!("{}.sh", operation));
            std::fs::write(&path, script).unwrap();
            config
                .commands
                .insert(operation.to_string(), format!("/bin/sh {}", path.display()));
        }
        config.version.major = 2;
        config.version.minor = 7;
        config.bridge.read_timeout_secs = 10;
        RequestHandler::new(ExecutionBridge::new(Arc::new(config)))
    }

    #[test]
    fn test_peer_label() {
        let mut request = HttpRequest::new("GET", routes::HEALTH);
        assert_eq!(request.peer(), "-");
        request.client_addr = Some("10.1.2.3:5000".parse().unwrap());
        assert_eq!(request.peer(), "10.1.2.3:5000");
    }

    #[test]
    fn test_collect_relays_body_with_202() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(
            &dir,
            &[("collect", r#"printf '{"result":[],"relationships":[],"nonExistingObjects":[]}' > "$1""#)],
        );
        let response = handler.handle(HttpRequest::new("POST", routes::COLLECT).with_body(BODY));
        assert_eq!(response.status, 202);
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["result"], serde_json::json!([]));
    }

    #[test]
    fn test_endpoint_urls_status_200() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(
            &dir,
            &[("endpoint_urls", r#"printf '{"endpointUrls":["https://%s"]}' "$HOST" > "$1""#)],
        );
        let response =
            handler.handle(HttpRequest::new("POST", routes::ENDPOINT_URLS).with_body(BODY));
        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"endpointUrls":["https://h1"]}"#);
    }

    #[test]
    fn test_missing_body_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&dir, &[("test", "exit 1")]);
        let response = handler.handle(HttpRequest::new("POST", routes::TEST));
        assert_eq!(response.status, 400);
        assert_eq!(response.body, NO_BODY);

        let response = handler.handle(HttpRequest::new("POST", routes::TEST).with_body("{}"));
        assert_eq!(response.status, 400);
    }

    #[test]
    fn test_invalid_adapter_output_is_generic_500() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&dir, &[("test", r#"printf '{"broken' > "$1""#)]);
        let response = handler.handle(HttpRequest::new("POST", routes::TEST).with_body(BODY));
        assert_eq!(response.status, 500);
        assert_eq!(response.body, crate::error::GENERIC_SERVER_ERROR);
    }

    #[test]
    fn test_unconfigured_operation_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&dir, &[]);
        let response = handler.handle(HttpRequest::new("POST", routes::COLLECT).with_body(BODY));
        assert_eq!(response.status, 500);
        assert_eq!(response.body, crate::error::GENERIC_SERVER_ERROR);
    }

    #[test]
    fn test_definition_without_result_is_204() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&dir, &[("adapter_definition", "exit 0")]);
        let response = handler.handle(HttpRequest::new("GET", routes::DEFINITION));
        assert_eq!(response.status, 204);
        assert_eq!(response.body, "{}");
    }

    #[test]
    fn test_definition_with_result_is_200() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(
            &dir,
            &[("adapter_definition", r#"printf '{"adapterKind":"X"}' > "$1""#)],
        );
        let response = handler.handle(HttpRequest::new("GET", routes::DEFINITION));
        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"adapterKind":"X"}"#);
    }

    #[test]
    fn test_static_routes() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&dir, &[]);

        let response = handler.handle(HttpRequest::new("GET", routes::API_VERSION));
        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"major":1,"minor":0,"maintenance":0}"#);

        let response = handler.handle(HttpRequest::new("GET", routes::VERSION));
        assert_eq!(response.body, r#""2.7""#);

        let response = handler.handle(HttpRequest::new("get", routes::HEALTH));
        assert_eq!(response.status, 200);
    }

    #[test]
    fn test_unknown_route_and_method() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&dir, &[]);
        assert_eq!(handler.handle(HttpRequest::new("GET", "/nope")).status, 404);
        assert_eq!(handler.handle(HttpRequest::new("GET", routes::COLLECT)).status, 405);
    }
}
