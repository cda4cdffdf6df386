//! HTTP session against the archive host.
//!
//! An [`ArchiveClient`] owns one reqwest connection pool and cookie jar. Workers hold their
//! own client and replace it with [`ArchiveClient::renewed`] after a failure,
//! so a session stuck on a dead connection is never reused.

use std::panic::{AssertUnwindSafe, catch_unwind, set_hook, take_hook};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::{debug, instrument, trace, warn};
use url::Url;

use super::error::ArchiveError;
use crate::user_agent::BROWSER_USER_AGENT;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Network settings shared by every session a run creates.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Browser-like identification header sent with every request.
    pub user_agent: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: None,
        }
    }
}

/// HTTP session bound to the archive base URL.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    client: Client,
    base_url: Url,
    settings: ClientSettings,
}

impl ArchiveClient {
    /// Creates a session for `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidUrl`] if the base URL is not absolute,
    /// or [`ArchiveError::Session`] if the HTTP client cannot be built.
    pub fn new(base_url: Url) -> Result<Self, ArchiveError> {
        Self::with_settings(base_url, ClientSettings::default())
    }

    /// Creates a session for `base_url` with explicit settings.
    ///
    /// # Errors
    ///
    /// Same as [`ArchiveClient::new`].
    #[instrument(level = "debug", skip(settings), fields(base_url = %base_url))]
    pub fn with_settings(base_url: Url, settings: ClientSettings) -> Result<Self, ArchiveError> {
        if base_url.cannot_be_a_base() {
            return Err(ArchiveError::invalid_url(base_url.as_str()));
        }
        let client = build_client(&settings)?;
        Ok(Self {
            client,
            base_url,
            settings,
        })
    }

    /// Builds a fresh session with the same base URL and settings.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Session`] if the HTTP client cannot be built.
    pub fn renewed(&self) -> Result<Self, ArchiveError> {
        debug!("renewing HTTP session");
        Ok(Self {
            client: build_client(&self.settings)?,
            base_url: self.base_url.clone(),
            settings: self.settings.clone(),
        })
    }

    /// Returns the archive base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a listing href (or sub-collection identifier) against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidUrl`] if the href cannot be joined.
    pub fn resolve(&self, href: &str) -> Result<Url, ArchiveError> {
        self.base_url
            .join(href)
            .map_err(|_| ArchiveError::invalid_url(href))
    }

    /// Fetches a page and decodes it as text.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Fetch`] on network failure and
    /// [`ArchiveError::HttpStatus`] on a non-success status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text(&self, url: &Url) -> Result<String, ArchiveError> {
        let response = self.get(url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ArchiveError::fetch(url.as_str(), e))?;
        trace!(bytes = body.len(), "page fetched");
        Ok(body)
    }

    /// Fetches a file body verbatim.
    ///
    /// # Errors
    ///
    /// Same as [`ArchiveClient::fetch_text`].
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, ArchiveError> {
        let response = self.get(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ArchiveError::fetch(url.as_str(), e))?;
        trace!(bytes = body.len(), "file fetched");
        Ok(body.to_vec())
    }

    async fn get(&self, url: &Url) -> Result<reqwest::Response, ArchiveError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ArchiveError::fetch(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::http_status(url.as_str(), status.as_u16()));
        }
        Ok(response)
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

// Serializes the temporary panic-hook swap below.
static CLIENT_BUILD_PANIC_HOOK_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Builds the reqwest client, falling back to env-only proxy configuration
/// when the system proxy lookup panics (seen in sandboxed environments).
fn build_client(settings: &ClientSettings) -> Result<Client, ArchiveError> {
    match try_build_client(settings, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            warn!(
                "HTTP client builder panicked while loading system proxy settings; retrying with env-proxy fallback"
            );
            match try_build_client(settings, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(ArchiveError::session(
                    "HTTP client builder panicked with env-proxy fallback",
                )),
                Err(BuildClientFailure::Build(error)) => {
                    Err(ArchiveError::session(error.to_string()))
                }
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(ArchiveError::session(error.to_string())),
    }
}

fn try_build_client(
    settings: &ClientSettings,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    let _guard = CLIENT_BUILD_PANIC_HOOK_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let previous_hook = take_hook();
    set_hook(Box::new(|_| {}));
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut builder = base_client_builder(settings);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build()
    }));
    set_hook(previous_hook);
    match outcome {
        Ok(result) => result.map_err(BuildClientFailure::Build),
        Err(_) => Err(BuildClientFailure::Panic),
    }
}

fn base_client_builder(settings: &ClientSettings) -> ClientBuilder {
    let mut builder = Client::builder()
        .connect_timeout(settings.connect_timeout)
        .cookie_store(true)
        .gzip(true)
        .user_agent(settings.user_agent.as_str());
    if let Some(timeout) = settings.request_timeout {
        builder = builder.timeout(timeout);
    }
    builder
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    let proxy = ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]
        .iter()
        .find_map(|name| {
            std::env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        });
    if let Some(proxy) = proxy
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}
