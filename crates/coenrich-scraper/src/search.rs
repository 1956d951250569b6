//! Candidate profile URL discovery.
//!
//! The primary path scrapes a web search results page, retrying with fresh
//! proxy/user-agent rotation and randomized pacing. When every attempt comes
//! back without a profile link, a single structured search API request is
//! made instead.

use std::collections::HashSet;
use std::sync::LazyLock;

use coenrich_core::{AppConfig, CustomSearchCredentials};
use regex::Regex;
use reqwest::Url;
use serde::Deserialize;

use crate::anti_block::AntiBlockContext;
use crate::error::ScraperError;
use crate::rate_limit::DelayRange;

static ANCHOR_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>").expect("valid regex"));
static HREF_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\shref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid href regex")
});

const SEARCH_ENGINE_ORIGIN: &str = "https://www.google.com";

/// Knobs for [`SearchResolver`].
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub search_url: String,
    pub custom_search_url: String,
    pub custom_search: Option<CustomSearchCredentials>,
    /// Primary search attempts before falling back. Zero skips straight to
    /// the fallback.
    pub attempts: u32,
    /// Delay sampled before every primary attempt.
    pub delay: DelayRange,
    pub query_suffix: String,
    /// Substring a link must contain to count as a profile URL.
    pub profile_marker: String,
}

impl SearchSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            search_url: config.search_url.clone(),
            custom_search_url: config.custom_search_url.clone(),
            custom_search: config.custom_search.clone(),
            attempts: config.search_attempts,
            delay: DelayRange::new(config.search_delay_min_ms, config.search_delay_max_ms),
            query_suffix: config.search_query_suffix.clone(),
            profile_marker: config.profile_url_marker.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    #[serde(default)]
    items: Vec<CustomSearchItem>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchItem {
    link: Option<String>,
}

/// Resolves a company name to a ranked list of profile URLs.
pub struct SearchResolver {
    settings: SearchSettings,
}

impl SearchResolver {
    #[must_use]
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Free-text query sent to both search surfaces.
    #[must_use]
    pub fn query_for(&self, company_name: &str) -> String {
        let name = company_name.trim();
        let suffix = self.settings.query_suffix.trim();
        if suffix.is_empty() {
            name.to_string()
        } else {
            format!("{name} {suffix}")
        }
    }

    /// Returns candidate profile URLs for `company_name`, best first.
    ///
    /// Never fails: every error is logged and treated as "no matches" for
    /// the attempt that produced it. An empty result means both the primary
    /// search and the fallback came back empty.
    pub async fn resolve(&self, ctx: &AntiBlockContext, company_name: &str) -> Vec<String> {
        let query = self.query_for(company_name);

        let primary = self.primary_search(ctx, &query).await;
        if !primary.is_empty() {
            return primary;
        }

        tracing::info!(
            company = company_name,
            attempts = self.settings.attempts,
            "primary search found no profile links; using structured search fallback"
        );
        self.fallback_search(ctx, &query).await
    }

    async fn primary_search(&self, ctx: &AntiBlockContext, query: &str) -> Vec<String> {
        for attempt in 1..=self.settings.attempts {
            self.settings.delay.wait().await;
            match self.search_once(ctx, query).await {
                Ok(links) if !links.is_empty() => {
                    tracing::debug!(query, attempt, found = links.len(), "profile links found");
                    return links;
                }
                Ok(_) => {
                    tracing::debug!(query, attempt, "search page had no profile links");
                }
                Err(e) => {
                    tracing::warn!(query, attempt, error = %e, "search request failed");
                }
            }
        }
        Vec::new()
    }

    async fn search_once(
        &self,
        ctx: &AntiBlockContext,
        query: &str,
    ) -> Result<Vec<String>, ScraperError> {
        let url = Url::parse_with_params(&self.settings.search_url, &[("q", query)]).map_err(
            |e| ScraperError::InvalidUrl {
                url: self.settings.search_url.clone(),
                reason: e.to_string(),
            },
        )?;

        let rotation = ctx.rotate();
        tracing::debug!(
            proxy = rotation.proxy.as_ref().map_or("direct", |p| p.as_str()),
            "sending search request"
        );
        let response = rotation
            .client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, rotation.user_agent)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(extract_profile_links(&body, &self.settings.profile_marker))
    }

    async fn fallback_search(&self, ctx: &AntiBlockContext, query: &str) -> Vec<String> {
        let Some(credentials) = self.settings.custom_search.as_ref() else {
            tracing::warn!(query, "structured search fallback is not configured");
            return Vec::new();
        };

        match self.custom_search(ctx, query, credentials).await {
            Ok(links) => {
                tracing::info!(query, found = links.len(), "structured search fallback finished");
                links
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "structured search fallback failed");
                Vec::new()
            }
        }
    }

    async fn custom_search(
        &self,
        ctx: &AntiBlockContext,
        query: &str,
        credentials: &CustomSearchCredentials,
    ) -> Result<Vec<String>, ScraperError> {
        let url = Url::parse_with_params(
            &self.settings.custom_search_url,
            &[
                ("q", query),
                ("key", credentials.api_key.as_str()),
                ("cx", credentials.engine_id.as_str()),
            ],
        )
        .map_err(|e| ScraperError::InvalidUrl {
            url: self.settings.custom_search_url.clone(),
            reason: e.to_string(),
        })?;

        // Requests carrying the API key never go through harvested proxies.
        let response = ctx.client_for(None).get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.settings.custom_search_url.clone(),
            });
        }

        let body = response.text().await?;
        let parsed: CustomSearchResponse =
            serde_json::from_str(&body).map_err(|e| ScraperError::Deserialize {
                context: format!("structured search results for \"{query}\""),
                source: e,
            })?;

        let links = parsed.items.into_iter().filter_map(|item| item.link);
        Ok(filter_profile_links(links, &self.settings.profile_marker))
    }
}

/// Pulls every anchor `href` out of a results page and keeps the ones that
/// look like profile URLs, in page order and without duplicates.
#[must_use]
pub fn extract_profile_links(html: &str, marker: &str) -> Vec<String> {
    let hrefs = ANCHOR_TAG_RE.find_iter(html).filter_map(|m| {
        let caps = HREF_ATTR_RE.captures(m.as_str())?;
        let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
        Some(unwrap_redirect(&decode_entities(raw.trim())))
    });
    filter_profile_links(hrefs, marker)
}

fn filter_profile_links(links: impl Iterator<Item = String>, marker: &str) -> Vec<String> {
    let marker = marker.to_ascii_lowercase();
    let mut seen = HashSet::new();
    links
        .filter(|link| link.to_ascii_lowercase().contains(&marker))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Decodes the character references that appear inside result-page `href`
/// attributes. `&amp;` goes last so `&amp;quot;` stays a literal `&quot;`.
fn decode_entities(raw: &str) -> String {
    const ENTITIES: [(&str, &str); 10] = [
        ("&quot;", "\""),
        ("&#34;", "\""),
        ("&#39;", "'"),
        ("&#x27;", "'"),
        ("&#x3D;", "="),
        ("&#x3d;", "="),
        ("&#61;", "="),
        ("&#x2F;", "/"),
        ("&#x2f;", "/"),
        ("&#47;", "/"),
    ];
    let decoded = ENTITIES
        .iter()
        .fold(raw.to_string(), |acc, (entity, ch)| acc.replace(entity, ch));
    decoded.replace("&#38;", "&").replace("&amp;", "&")
}

/// Search engines wrap result links as `/url?q=<target>&...`; return the
/// target when `href` has that shape, otherwise `href` unchanged.
fn unwrap_redirect(href: &str) -> String {
    let is_redirect = href.starts_with("/url?") || href.contains("google.com/url?");
    if !is_redirect {
        return href.to_string();
    }
    let Ok(base) = Url::parse(SEARCH_ENGINE_ORIGIN) else {
        return href.to_string();
    };
    base.join(href)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "q" || k == "url")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_else(|| href.to_string())
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
