// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! HTTP server for the adapter front end
//!
//! A lightweight HTTP/1.1 listener built on tokio. Each connection carries
//! one request; the handler runs on the blocking pool because a bridge call
//! waits on the adapter subprocess.
//!
//! # Examples
//!
//! ```no_run
//! use adapterlib::bridge::ServiceConfig;
//! use adapterlib::http_server::HttpServer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> adapterlib::Result<()> {
//!     let config = Arc::new(ServiceConfig::from_toml_file("commands.toml")?);
//!     HttpServer::new(config).run().await
//! }
//! ```

use crate::bridge::{ExecutionBridge, ServerConfig, ServiceConfig};
use crate::error::{AdapterError, Result};
use crate::handler::{HttpRequest, HttpResponse, RequestHandler};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Largest accepted request line plus headers
const MAX_HEAD_SIZE: usize = 16 * 1024;

/// HTTP server dispatching to a [`RequestHandler`]
pub struct HttpServer {
    config: ServerConfig,
    handler: Arc<RequestHandler>,
}

impl HttpServer {
    /// Create a server running operations through a system-process bridge
    pub fn new(config: Arc<ServiceConfig>) -> Self {
        let server = config.server.clone();
        let handler = RequestHandler::new(ExecutionBridge::new(config));
        Self::with_handler(server, handler)
    }

    pub fn with_handler(config: ServerConfig, handler: RequestHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Bind the configured address and serve until the task is dropped
    pub async fn run(self) -> Result<()> {
        let addr = self.config.listen_address();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            AdapterError::Io(io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", addr, e),
            ))
        })?;
        log::info!("HTTP server listening on http://{}", addr);
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let max_body = self.config.max_body_size;
        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    log::warn!("Accept error: {}", e);
                    continue;
                }
            };

            let handler = self.handler.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, handler, max_body).await {
                    log::debug!("Connection from {} failed: {}", peer_addr, e);
                }
            });
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<RequestHandler>,
    max_body: usize,
) -> io::Result<()> {
    let response = match read_request(&mut stream, peer_addr, max_body).await? {
        Ok(request) => tokio::task::spawn_blocking(move || handler.handle(request))
            .await
            .unwrap_or_else(|e| {
                log::error!("Request handler panicked: {}", e);
                HttpResponse::text(500, crate::error::GENERIC_SERVER_ERROR)
            }),
        Err(response) => response,
    };
    stream.write_all(&render_response(&response)).await?;
    stream.shutdown().await
}

/// Read one request; protocol violations come back as a ready response
async fn read_request(
    stream: &mut TcpStream,
    peer_addr: SocketAddr,
    max_body: usize,
) -> io::Result<std::result::Result<HttpRequest, HttpResponse>> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find_head_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_HEAD_SIZE {
            return Ok(Err(HttpResponse::text(431, "Request header fields too large")));
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before end of headers",
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]);
    let Some(mut request) = parse_http_request(&head, peer_addr) else {
        return Ok(Err(HttpResponse::bad_request("Bad Request")));
    };

    let content_length = match request.header("content-length") {
        Some(value) => match value.parse::<usize>() {
            Ok(len) => len,
            Err(_) => return Ok(Err(HttpResponse::bad_request("Invalid Content-Length"))),
        },
        None => 0,
    };
    if content_length > max_body {
        return Ok(Err(HttpResponse::text(413, "Payload Too Large")));
    }

    let mut body = buf.split_off(head_end + 4);
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before end of body",
            ));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    if !body.is_empty() {
        request.body = Some(body);
    }
    Ok(Ok(request))
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Parse the request line and headers
fn parse_http_request(raw: &str, client_addr: SocketAddr) -> Option<HttpRequest> {
    let mut lines = raw.lines();
    let request_line = lines.next()?;
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return None;
    }

    let method = parts[0].to_uppercase();
    let full_path = parts[1];

    // Routes take no query parameters
    let path = full_path
        .split_once('?')
        .map_or(full_path, |(p, _)| p)
        .to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    Some(HttpRequest {
        method,
        path,
        headers,
        body: None,
        client_addr: Some(client_addr),
    })
}

fn render_response(response: &HttpResponse) -> Vec<u8> {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\n",
        response.status,
        status_text(response.status)
    );
    // 204 and 304 carry no body
    let body = if matches!(response.status, 204 | 304) {
        ""
    } else {
        response.body.as_str()
    };
    for (key, value) in &response.headers {
        if body.is_empty() && key == "content-type" {
            continue;
        }
        head.push_str(&format!("{}: {}\r\n", key, value));
    }
    head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    head.push_str("Connection: close\r\n\r\n");

    let mut bytes = head.into_bytes();
    bytes.extend_from_slice(body.as_bytes());
    bytes
}

fn status_text(code: u16) -> &'static str {
    match code {
        200 => "OK",
        202 => "Accepted",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
