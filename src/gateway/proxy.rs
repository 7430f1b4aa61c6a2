use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Result};
use axum::{
    body::StreamBody,
    extract::BodyStream,
    http::{header, HeaderMap, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
};
use reqwest::Url;

use crate::errors::RequestError;

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Removes the headers that only concern a single connection, including
/// any extra ones the `Connection` header names.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();
    for name in listed.iter().map(String::as_str).chain(HOP_BY_HOP) {
        headers.remove(name);
    }
}

/// Whether the inbound request announced a body worth streaming on.
fn carries_body(headers: &HeaderMap) -> bool {
    headers.contains_key(header::TRANSFER_ENCODING)
        || headers
            .get(header::CONTENT_LENGTH)
            .map_or(false, |length| length.as_bytes() != b"0")
}

/// Forwards requests to a single downstream service.
pub struct ReverseProxy {
    scheme: String,
    origin_host: String,
    client: reqwest::Client,
    response_timeout: Duration,
}

impl ReverseProxy {
    pub fn new(target: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(target).with_context(|| format!("Invalid proxy target {target:?}"))?;
        let host = url
            .host_str()
            .with_context(|| format!("Proxy target {target:?} has no host"))?;
        let origin_host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };
        // Redirects belong to the caller, not the gateway. The timeout
        // bounds the wait for response headers only, never the body.
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to create HTTP client")?;
        Ok(ReverseProxy {
            scheme: url.scheme().to_owned(),
            origin_host,
            client,
            response_timeout: timeout,
        })
    }

    /// Downstream `host[:port]`, as sent in `X-Origin-Host`.
    pub fn origin_host(&self) -> &str {
        &self.origin_host
    }

    /// The downstream URL for an inbound request: scheme and host swapped,
    /// path and query kept byte for byte.
    pub fn outbound_url(&self, uri: &Uri) -> String {
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
        format!("{}://{}{}", self.scheme, self.origin_host, path_and_query)
    }

    pub fn outbound_headers(
        &self,
        inbound: &HeaderMap,
        uri: &Uri,
        client_addr: Option<SocketAddr>,
    ) -> HeaderMap {
        let mut headers = inbound.clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);

        let inbound_host = inbound
            .get(header::HOST)
            .cloned()
            .or_else(|| uri.authority().and_then(|a| HeaderValue::from_str(a.as_str()).ok()));
        if let Some(host) = inbound_host {
            headers.append("x-forwarded-host", host);
        }
        if let Ok(origin) = HeaderValue::from_str(&self.origin_host) {
            headers.insert("x-origin-host", origin);
        }
        if let Some(addr) = client_addr {
            let ip = addr.ip().to_string();
            let forwarded_for = match inbound.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
                Some(prior) => format!("{prior}, {ip}"),
                None => ip,
            };
            if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
                headers.insert("x-forwarded-for", value);
            }
        }
        headers
    }

    /// Streams the request downstream and the answer back as is. Neither
    /// body is buffered in the gateway.
    pub async fn forward(
        &self,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: BodyStream,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response, RequestError> {
        let url = self.outbound_url(&uri);
        let mut request = self
            .client
            .request(method, url.as_str())
            .headers(self.outbound_headers(&headers, &uri, client_addr));
        if carries_body(&headers) {
            request = request.body(reqwest::Body::wrap_stream(body));
        }

        let response = match tokio::time::timeout(self.response_timeout, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => {
                tracing::warn!(url = %url, error = %e, "Downstream connect timed out");
                return Err(RequestError::GatewayTimeout);
            }
            Ok(Err(e)) => {
                tracing::error!(url = %url, error = %e, "Failed to forward request");
                return Err(RequestError::BadGateway);
            }
            Err(_) => {
                tracing::warn!(url = %url, "Downstream did not answer in time");
                return Err(RequestError::GatewayTimeout);
            }
        };

        let status = response.status();
        let mut response_headers = response.headers().clone();
        strip_hop_by_hop(&mut response_headers);
        tracing::debug!(url = %url, %status, "Forwarded request");
        Ok((
            status,
            response_headers,
            StreamBody::new(response.bytes_stream()),
        )
            .into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy() -> ReverseProxy {
        ReverseProxy::new("http://user-service:8080", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn url_keeps_path_and_query() {
        let uri: Uri = "/users/42?expand=profile&x=%2F".parse().unwrap();
        assert_eq!(
            proxy().outbound_url(&uri),
            "http://user-service:8080/users/42?expand=profile&x=%2F"
        );
    }

    #[test]
    fn origin_host_without_explicit_port() {
        let proxy = ReverseProxy::new("https://users.internal", Duration::from_secs(5)).unwrap();
        assert_eq!(proxy.origin_host(), "users.internal");
        let uri: Uri = "/users".parse().unwrap();
        assert_eq!(proxy.outbound_url(&uri), "https://users.internal/users");
    }

    #[test]
    fn forwarding_headers_are_set() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("gw.example.com"));
        inbound.insert("x-request-id", HeaderValue::from_static("abc"));
        inbound.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        let uri: Uri = "/users/42".parse().unwrap();
        let client: SocketAddr = "192.168.1.7:51000".parse().unwrap();

        let headers = proxy().outbound_headers(&inbound, &uri, Some(client));

        assert_eq!(headers.get(header::HOST), None);
        assert_eq!(headers["x-forwarded-host"], "gw.example.com");
        assert_eq!(headers["x-origin-host"], "user-service:8080");
        assert_eq!(headers["x-forwarded-for"], "10.0.0.1, 192.168.1.7");
        assert_eq!(headers["x-request-id"], "abc");
    }

    #[test]
    fn forwarded_host_keeps_earlier_proxies() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("gw.example.com"));
        inbound.insert("x-forwarded-host", HeaderValue::from_static("edge.example.com"));
        let uri: Uri = "/users/42".parse().unwrap();

        let headers = proxy().outbound_headers(&inbound, &uri, None);

        let hosts: Vec<_> = headers.get_all("x-forwarded-host").iter().collect();
        assert_eq!(hosts, ["edge.example.com", "gw.example.com"]);
    }

    #[test]
    fn body_is_forwarded_only_when_announced() {
        let mut headers = HeaderMap::new();
        assert!(!carries_body(&headers));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
        assert!(!carries_body(&headers));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        assert!(carries_body(&headers));

        let mut chunked = HeaderMap::new();
        chunked.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        assert!(carries_body(&chunked));
    }

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace"));
        inbound.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        inbound.insert("x-trace", HeaderValue::from_static("1"));
        inbound.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        inbound.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let uri: Uri = "/users".parse().unwrap();

        let headers = proxy().outbound_headers(&inbound, &uri, None);

        for name in ["connection", "keep-alive", "x-trace", "upgrade"] {
            assert!(headers.get(name).is_none(), "{name} was forwarded");
        }
        assert_eq!(headers[header::ACCEPT], "application/json");
        assert!(headers.get("x-forwarded-for").is_none());
    }

    #[test]
    fn target_without_host_is_refused() {
        assert!(ReverseProxy::new("not a url", Duration::from_secs(1)).is_err());
    }
}
