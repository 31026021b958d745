//! HTTP client for the Stockroom API.
//!
//! ```text
//!   reqwest error (connect / timeout) ──► ClientError::Unreachable   "try again"
//!   404                               ──► ClientError::NotFound      "no such thing"
//!   other 4xx / 5xx                   ──► ClientError::Rejected      server message
//! ```
//!
//! The barcode endpoint is the one exception: its 404 means "no exact and
//! no similar match", which is an ordinary empty [`Resolution`].

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use stockroom_core::barcode::Resolution;
use stockroom_core::{
    ChangeSource, NewProduct, Product, ProductLogEntry, ProductPatch, ScanLogEntry,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Could not reach the server at {url}, try again ({source})")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl ClientError {
    /// True when retrying later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Unreachable { .. } => true,
            ClientError::Rejected { status, .. } => *status == 503,
            _ => false,
        }
    }
}

/// Error body the server sends; only the parts the CLI prints.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    fields: Option<std::collections::BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await.map_err(|err| {
            if err.is_connect() || err.is_timeout() {
                ClientError::Unreachable {
                    url: self.base_url.clone(),
                    source: err,
                }
            } else {
                ClientError::Request(err)
            }
        })?;

        let status = response.status();
        debug!(url = %response.url(), %status, "Response");
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = describe_error(&text);
        if status == StatusCode::NOT_FOUND {
            Err(ClientError::NotFound(message))
        } else {
            Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        Ok(self.send(builder).await?.json().await?)
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        self.json(self.request(Method::GET, "/api/products/")).await
    }

    pub async fn get_product(&self, id: i64) -> Result<Product, ClientError> {
        self.json(self.request(Method::GET, &format!("/api/products/{id}/")))
            .await
    }

    pub async fn create_product(
        &self,
        product: &NewProduct,
        source: ChangeSource,
    ) -> Result<Product, ClientError> {
        let builder = self
            .request(Method::POST, "/api/products/")
            .query(&[("source", source.as_str())])
            .json(product);
        self.json(builder).await
    }

    pub async fn update_product(
        &self,
        id: i64,
        patch: &ProductPatch,
        source: ChangeSource,
    ) -> Result<Product, ClientError> {
        let builder = self
            .request(Method::PUT, &format!("/api/products/{id}/"))
            .query(&[("source", source.as_str())])
            .json(patch);
        self.json(builder).await
    }

    pub async fn delete_product(&self, id: i64, source: ChangeSource) -> Result<(), ClientError> {
        let builder = self
            .request(Method::DELETE, &format!("/api/products/{id}/"))
            .query(&[("source", source.as_str())]);
        self.send(builder).await?;
        Ok(())
    }

    /// Looks up a scanned code. Nothing matching at all is an empty result.
    pub async fn resolve_barcode(
        &self,
        code: &str,
        source: &str,
    ) -> Result<Resolution, ClientError> {
        let builder = self
            .request(Method::GET, &format!("/api/products/barcode/{}/", encode_segment(code)))
            .query(&[("source", source)]);
        match self.json(builder).await {
            Err(ClientError::NotFound(_)) => Ok(Resolution::default()),
            other => other,
        }
    }

    // =========================================================================
    // Logs
    // =========================================================================

    pub async fn product_logs(&self) -> Result<Vec<ProductLogEntry>, ClientError> {
        self.json(self.request(Method::GET, "/api/logs/")).await
    }

    pub async fn scan_history(&self) -> Result<Vec<ScanLogEntry>, ClientError> {
        self.json(self.request(Method::GET, "/api/history/")).await
    }

    pub async fn scan_history_today(&self) -> Result<Vec<ScanLogEntry>, ClientError> {
        self.json(self.request(Method::GET, "/api/history/today/"))
            .await
    }
}

/// One-line message from an error body, falling back to the raw text.
fn describe_error(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message,
            fields: Some(fields),
        }) => {
            let details: Vec<String> = fields
                .iter()
                .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
                .collect();
            format!("{} [{}]", message, details.join("; "))
        }
        Ok(ErrorBody { message, .. }) => message,
        Err(_) if body.trim().is_empty() => "no details".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Percent-encodes a path segment. Scanned codes are usually digits, but
/// keyboard-wedge scanners can emit anything.
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_error_with_fields() {
        let body = r#"{"code":"CONFLICT","message":"Duplicate sku","fields":{"sku":["taken"]}}"#;
        assert_eq!(describe_error(body), "Duplicate sku [sku: taken]");
    }

    #[test]
    fn test_describe_error_plain() {
        assert_eq!(describe_error(r#"{"message":"gone"}"#), "gone");
        assert_eq!(describe_error("oops\n"), "oops");
        assert_eq!(describe_error(""), "no details");
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("5901234123457"), "5901234123457");
        assert_eq!(encode_segment("A B/1"), "A%20B%2F1");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.url("/api/logs/"), "http://localhost:8000/api/logs/");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_retryable() {
        // Nothing listens on the discard port.
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let err = client.list_products().await.unwrap_err();
        assert!(err.is_retryable(), "{err}");
    }
}
