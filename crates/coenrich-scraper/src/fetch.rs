//! Profile page retrieval.

use crate::anti_block::AntiBlockContext;
use crate::error::ScraperError;
use crate::rate_limit::DelayRange;

/// Fetches raw profile HTML with bounded attempts.
///
/// Each attempt rotates proxy and user agent. Attempts after the first wait a
/// delay sampled from `retry_delay`.
pub struct ProfileFetcher {
    attempts: u32,
    retry_delay: DelayRange,
}

impl ProfileFetcher {
    /// `attempts` below one is treated as one.
    #[must_use]
    pub fn new(attempts: u32, retry_delay: DelayRange) -> Self {
        Self {
            attempts: attempts.max(1),
            retry_delay,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &coenrich_core::AppConfig) -> Self {
        Self::new(
            config.fetch_attempts,
            DelayRange::new(config.search_delay_min_ms, config.search_delay_max_ms),
        )
    }

    /// Returns the page body, or `None` once every attempt has failed.
    ///
    /// Failures are logged, never propagated.
    pub async fn fetch(&self, ctx: &AntiBlockContext, url: &str) -> Option<String> {
        for attempt in 1..=self.attempts {
            if attempt > 1 {
                self.retry_delay.wait().await;
            }
            match fetch_once(ctx, url).await {
                Ok(body) => return Some(body),
                Err(e) => {
                    tracing::warn!(
                        url,
                        attempt,
                        max_attempts = self.attempts,
                        error = %e,
                        "profile fetch failed"
                    );
                }
            }
        }
        None
    }
}

async fn fetch_once(ctx: &AntiBlockContext, url: &str) -> Result<String, ScraperError> {
    let rotation = ctx.rotate();
    let response = rotation
        .client
        .get(url)
        .header(reqwest::header::USER_AGENT, rotation.user_agent)
        .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    // Lossy decoding keeps non-UTF-8 bodies flowing into extraction.
    let bytes = response.bytes().await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
