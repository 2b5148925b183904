//! Abortable fetch abstraction and the catalog HTTP implementation.
//!
//! [`Fetcher`] is the seam between the request coordinator and the
//! transport: the coordinator hands it a cancellation token and expects
//! every outcome - including abortion - to come back as a typed result,
//! never a panic. [`CatalogFetcher`] is the production implementation
//! against the storefront REST backend.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use url::Url;

use bloomcart_core::{RawProduct, ResourceKey};

use crate::config::ClientConfig;
use crate::error::FetchError;

/// An abortable fetch against the product/category endpoints.
///
/// Implementations should honor the token where they can, but
/// correctness never depends on it: a fetch that ignores its signal
/// still gets discarded by the coordinator's staleness check once it
/// settles.
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    async fn fetch(&self, key: &ResourceKey, abort: CancellationToken) -> Result<T, FetchError>;
}

struct FetcherFn<F> {
    f: F,
}

#[async_trait]
impl<T, F> Fetcher<T> for FetcherFn<F>
where
    T: Send + 'static,
    F: Fn(ResourceKey, CancellationToken) -> BoxFuture<'static, Result<T, FetchError>>
        + Send
        + Sync,
{
    async fn fetch(&self, key: &ResourceKey, abort: CancellationToken) -> Result<T, FetchError> {
        (self.f)(key.clone(), abort).await
    }
}

/// Wrap a closure as a [`Fetcher`].
pub fn fetcher_fn<T, F>(f: F) -> Arc<dyn Fetcher<T>>
where
    T: Send + 'static,
    F: Fn(ResourceKey, CancellationToken) -> BoxFuture<'static, Result<T, FetchError>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FetcherFn { f })
}

/// Fetcher for the storefront catalog endpoints.
///
/// Issues `GET /api/products[?category=<slug>]` and deserializes the
/// raw product array. Non-2xx statuses classify as `Network`, shape
/// failures as `MalformedResponse`.
#[derive(Clone)]
pub struct CatalogFetcher {
    inner: Arc<CatalogFetcherInner>,
}

struct CatalogFetcherInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
    timeout: std::time::Duration,
}

impl CatalogFetcher {
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            inner: Arc::new(CatalogFetcherInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.clone(),
                api_token: config.api_token.clone(),
                timeout: config.request_timeout,
            }),
        }
    }

    /// Endpoint for a resource key.
    fn endpoint(&self, key: &ResourceKey) -> Result<Url, FetchError> {
        let mut url = self
            .inner
            .base_url
            .join("api/products")
            .map_err(|e| FetchError::Network(format!("invalid endpoint: {e}")))?;

        if let Some(slug) = key.category() {
            url.query_pairs_mut().append_pair("category", slug);
        }
        Ok(url)
    }

    async fn get_products(&self, key: &ResourceKey) -> Result<Vec<RawProduct>, FetchError> {
        let url = self.endpoint(key)?;

        let mut request = self.inner.client.get(url).timeout(self.inner.timeout);
        if let Some(token) = &self.inner.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();

        // Body as text first for better error diagnostics
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "catalog endpoint returned non-success status"
            );
            return Err(FetchError::Network(format!("HTTP {status}")));
        }

        parse_products(&body)
    }
}

/// Deserialize a catalog response body.
fn parse_products(body: &str) -> Result<Vec<RawProduct>, FetchError> {
    serde_json::from_str::<Vec<RawProduct>>(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(200).collect::<String>(),
            "failed to parse catalog response"
        );
        FetchError::MalformedResponse(e.to_string())
    })
}

#[async_trait]
impl Fetcher<Vec<RawProduct>> for CatalogFetcher {
    #[instrument(skip(self, abort), fields(key = %key))]
    async fn fetch(
        &self,
        key: &ResourceKey,
        abort: CancellationToken,
    ) -> Result<Vec<RawProduct>, FetchError> {
        tokio::select! {
            () = abort.cancelled() => Err(FetchError::Aborted),
            result = self.get_products(key) => result,
        }
    }
}
