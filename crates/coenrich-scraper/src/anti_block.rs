//! Proxy and user-agent rotation shared by the search and fetch stages.
//!
//! The proxy pool is owned by [`AntiBlockContext`] and only changes through
//! [`AntiBlockContext::refresh_proxies`]. An empty pool is a valid state:
//! requests then go out directly.

use std::fmt;
use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::Client;
use serde::Deserialize;

use crate::error::ScraperError;

/// Browser signatures rotated across outbound requests.
pub const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Firefox/89.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/91.0.864.64",
];

/// A `scheme://host:port` proxy address harvested from the proxy list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint(String);

impl ProxyEndpoint {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Deserialize)]
struct ProxyListResponse {
    #[serde(default)]
    data: Vec<ProxyListEntry>,
}

#[derive(Debug, Deserialize)]
struct ProxyListEntry {
    #[serde(default)]
    protocols: Vec<String>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    port: Option<PortValue>,
}

// Proxy indexes disagree on whether ports are strings or numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Text(String),
    Number(u64),
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortValue::Text(s) => f.write_str(s.trim()),
            PortValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Parses a proxy-list payload into endpoints, taking the first advertised
/// protocol of each entry. Entries without a protocol, IP or port are skipped.
///
/// # Errors
///
/// Returns [`ScraperError::Deserialize`] if the body is not the expected JSON
/// shape.
pub fn parse_proxy_list(body: &str) -> Result<Vec<ProxyEndpoint>, ScraperError> {
    let parsed: ProxyListResponse =
        serde_json::from_str(body).map_err(|e| ScraperError::Deserialize {
            context: "proxy list".to_string(),
            source: e,
        })?;

    Ok(parsed
        .data
        .into_iter()
        .filter_map(|entry| {
            let scheme = entry.protocols.first()?.trim().to_ascii_lowercase();
            let ip = entry.ip?;
            let ip = ip.trim();
            let port = entry.port?.to_string();
            if scheme.is_empty() || ip.is_empty() || port.is_empty() {
                return None;
            }
            Some(ProxyEndpoint(format!("{scheme}://{ip}:{port}")))
        })
        .collect())
}

/// Client, proxy and user agent chosen for one outbound request.
#[derive(Debug, Clone)]
pub struct Rotation {
    pub client: Client,
    pub proxy: Option<ProxyEndpoint>,
    pub user_agent: &'static str,
}

/// Owns the proxy pool and builds per-request HTTP clients.
pub struct AntiBlockContext {
    direct: Client,
    timeout: Duration,
    proxy_list_url: String,
    proxies: Vec<ProxyEndpoint>,
}

impl AntiBlockContext {
    /// Creates a context with an empty proxy pool.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, proxy_list_url: &str) -> Result<Self, ScraperError> {
        let timeout = Duration::from_secs(timeout_secs);
        let direct = base_builder(timeout).build()?;
        Ok(Self {
            direct,
            timeout,
            proxy_list_url: proxy_list_url.to_owned(),
            proxies: Vec::new(),
        })
    }

    /// Creates a context from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be constructed.
    pub fn from_app_config(config: &coenrich_core::AppConfig) -> Result<Self, ScraperError> {
        Self::new(config.request_timeout_secs, &config.proxy_list_url)
    }

    /// Replaces the pool with a fixed list of endpoints.
    #[must_use]
    pub fn with_proxies(mut self, proxies: Vec<ProxyEndpoint>) -> Self {
        self.proxies = proxies;
        self
    }

    #[must_use]
    pub fn proxies(&self) -> &[ProxyEndpoint] {
        &self.proxies
    }

    /// Reloads the proxy pool from the proxy-list source and returns the
    /// resulting pool size.
    ///
    /// Failures are logged and leave the current pool untouched.
    pub async fn refresh_proxies(&mut self) -> usize {
        match self.fetch_proxy_list().await {
            Ok(proxies) => {
                tracing::info!(count = proxies.len(), "refreshed proxy pool");
                self.proxies = proxies;
            }
            Err(e) => {
                tracing::warn!(
                    url = %self.proxy_list_url,
                    error = %e,
                    kept = self.proxies.len(),
                    "proxy list refresh failed; keeping existing pool"
                );
            }
        }
        self.proxies.len()
    }

    async fn fetch_proxy_list(&self) -> Result<Vec<ProxyEndpoint>, ScraperError> {
        let response = self.direct.get(&self.proxy_list_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.proxy_list_url.clone(),
            });
        }
        let body = response.text().await?;
        parse_proxy_list(&body)
    }

    /// Picks a random proxy, or `None` when the pool is empty.
    #[must_use]
    pub fn pick_proxy(&self) -> Option<&ProxyEndpoint> {
        self.proxies.choose(&mut rand::rng())
    }

    /// Picks a random user agent from [`USER_AGENTS`].
    #[must_use]
    pub fn pick_user_agent(&self) -> &'static str {
        USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }

    /// Returns a client that routes through `proxy`, or the shared direct
    /// client when `proxy` is `None` or cannot be used.
    #[must_use]
    pub fn client_for(&self, proxy: Option<&ProxyEndpoint>) -> Client {
        let Some(proxy) = proxy else {
            return self.direct.clone();
        };
        let built = reqwest::Proxy::all(proxy.as_str())
            .and_then(|p| base_builder(self.timeout).proxy(p).build());
        match built {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(proxy = %proxy, error = %e, "unusable proxy; sending directly");
                self.direct.clone()
            }
        }
    }

    /// Chooses a fresh proxy and user agent for the next request.
    #[must_use]
    pub fn rotate(&self) -> Rotation {
        let proxy = self.pick_proxy().cloned();
        let client = self.client_for(proxy.as_ref());
        Rotation {
            client,
            proxy,
            user_agent: self.pick_user_agent(),
        }
    }
}

fn base_builder(timeout: Duration) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
}
