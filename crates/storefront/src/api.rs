//! HTTP transport for the storefront REST backend.
//!
//! Joins path segments onto the configured base URL, decodes JSON bodies and
//! turns every failure into an [`ApiError`].

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Client for the storefront REST backend.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
            }),
        })
    }

    /// Backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build the URL for a sequence of path segments.
    ///
    /// Segments are percent-encoded, so IDs can be passed through verbatim.
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, error status, or a body that
    /// does not decode as `T`.
    #[instrument(skip_all, fields(path = %segments.join("/")))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, segments).query(query);
        Self::execute(request).await
    }

    /// `POST` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, error status, or a body that
    /// does not decode as `T`.
    #[instrument(skip_all, fields(path = %segments.join("/")))]
    pub async fn post<B, T>(&self, segments: &[&str], body: &B, headers: HeaderMap) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::POST, segments)
            .headers(headers)
            .json(body);
        Self::execute(request).await
    }

    /// `PUT` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, error status, or a body that
    /// does not decode as `T`.
    #[instrument(skip_all, fields(path = %segments.join("/")))]
    pub async fn put<B, T>(&self, segments: &[&str], body: &B, headers: HeaderMap) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::PUT, segments)
            .headers(headers)
            .json(body);
        Self::execute(request).await
    }

    /// `DELETE` a resource, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or error status.
    #[instrument(skip_all, fields(path = %segments.join("/")))]
    pub async fn delete(&self, segments: &[&str], headers: HeaderMap) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, segments).headers(headers);
        let response = request.send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.inner.client.request(method, self.endpoint(segments))
    }

    async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let response = Self::check_status(response).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to decode backend response"
            );
            ApiError::transport(format!("invalid response body: {e}"))
        })
    }

    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Backend returned non-success status"
        );
        Err(ApiError::from_response(status.as_u16(), &body))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ClientConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api = client("http://localhost:5000");
        assert_eq!(
            api.endpoint(&["api", "products", "categories"]).as_str(),
            "http://localhost:5000/api/products/categories"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = client("https://shop.example.com/backend/");
        assert_eq!(
            api.endpoint(&["api", "cart", "session_x"]).as_str(),
            "https://shop.example.com/backend/api/cart/session_x"
        );
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let api = client("http://localhost:5000");
        assert_eq!(
            api.endpoint(&["api", "products", "a/b c"]).as_str(),
            "http://localhost:5000/api/products/a%2Fb%20c"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_server_error() {
        // Port 9 (discard) on loopback is closed in test environments.
        let api = client("http://127.0.0.1:9");
        let err = api
            .get::<serde_json::Value>(&["api", "products"], &[])
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err.status, None);
    }
}
