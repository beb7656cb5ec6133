//! Pooled HTTP transport for signed request URIs.
//!
//! Each pooled slot is an HTTP client limited to a single idle keep-alive
//! connection, so the slot lock doubles as the per-connection lock. Bodies of
//! non-success responses are decoded into typed server errors; client-level
//! failures are re-wrapped so callers never see raw HTTP errors.

use crate::error::ClientError;
use crate::pool::{ConnectionPool, PoolStats, DEFAULT_POOL_SIZE};
use crate::signer::Params;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_CHARSET, ACCEPT_ENCODING, CONTENT_TYPE};
use reqwest::Method;
use std::borrow::Cow;
use std::time::Duration;
use tracing::{debug, warn};

/// User agent of the emulated game client
pub const DEFAULT_USER_AGENT: &str = "UnityPlayer/2019.4.40f1 (UnityWebRequest/1.0, libcurl/7.80.0-DEV)";

/// Content type of query strings and request bodies
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Server host name
    pub host: String,
    /// Server port
    pub port: u16,
    /// Whether to use HTTPS
    pub ssl: bool,
    /// User-Agent header value
    pub user_agent: String,
    /// Timeout for one complete exchange
    pub timeout: Duration,
    /// Number of pooled connections
    pub pool_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 443,
            ssl: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl TransportConfig {
    /// Scheme, host and port prefix every request URI is appended to
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, identity"));
    headers
}

/// Executes requests through a fixed pool of persistent connections
#[derive(Debug)]
pub struct Transport {
    base_url: String,
    pool: ConnectionPool<reqwest::Client>,
}

impl Transport {
    /// Build the transport and its connection pool
    pub fn new(config: &TransportConfig) -> Result<Self, ClientError> {
        let pool = ConnectionPool::new(config.pool_size, || {
            reqwest::Client::builder()
                .default_headers(default_headers())
                .user_agent(config.user_agent.as_str())
                .timeout(config.timeout)
                .pool_max_idle_per_host(1)
                .build()
        })
        .map_err(|e| ClientError::transport(&e))?;

        debug!(
            "Transport ready for {} with {} connections",
            config.base_url(),
            pool.size()
        );

        Ok(Self {
            base_url: config.base_url(),
            pool,
        })
    }

    /// Issue a GET for `uri` (path and query)
    pub async fn get(&self, uri: &str) -> Result<String, ClientError> {
        self.execute(Method::GET, uri, None).await
    }

    /// Issue a POST for `uri` with a form-encoded body
    pub async fn post(&self, uri: &str, body: &Params) -> Result<String, ClientError> {
        self.execute(Method::POST, uri, Some(body.to_query())).await
    }

    /// Get connection pool statistics
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    async fn execute(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
    ) -> Result<String, ClientError> {
        let url = format!("{}{}", self.base_url, uri);

        let (status, bytes) = {
            let conn = self.pool.acquire().await;
            debug!("{} {} on connection {}", method, uri, conn.slot());

            let mut request = conn.request(method, &url);
            if let Some(body) = body {
                request = request.body(body);
            }

            let response = request
                .send()
                .await
                .map_err(|e| ClientError::transport(&e))?;
            let status = response.status();
            let bytes: Bytes = response
                .bytes()
                .await
                .map_err(|e| ClientError::transport(&e))?;
            (status, bytes)
        };

        let text = match String::from_utf8_lossy(&bytes) {
            Cow::Borrowed(text) => text.to_string(),
            Cow::Owned(text) => {
                warn!("{} answered with invalid UTF-8, replacing bad bytes", uri);
                text
            }
        };
        if status.is_success() {
            debug!("{} answered {} ({} bytes)", uri, status, bytes.len());
            Ok(text)
        } else {
            let err = ClientError::from_error_body(&text);
            warn!("{} answered {}: {}", uri, status, err);
            Err(err)
        }
    }
}
