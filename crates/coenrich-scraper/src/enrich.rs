//! Per-company enrichment: search, fetch, extract.

use coenrich_core::{AppConfig, EnrichmentResult};

use crate::anti_block::AntiBlockContext;
use crate::error::ScraperError;
use crate::extract::FieldExtractor;
use crate::fetch::ProfileFetcher;
use crate::search::{SearchResolver, SearchSettings};

/// Drives one company name through the full pipeline.
///
/// Owns the [`AntiBlockContext`] so the resolver and fetcher share one proxy
/// pool. `enrich` never fails; unresolved fields come back as empty strings.
pub struct Enricher {
    ctx: AntiBlockContext,
    resolver: SearchResolver,
    fetcher: ProfileFetcher,
    extractor: FieldExtractor,
}

impl Enricher {
    #[must_use]
    pub fn new(
        ctx: AntiBlockContext,
        resolver: SearchResolver,
        fetcher: ProfileFetcher,
        extractor: FieldExtractor,
    ) -> Self {
        Self {
            ctx,
            resolver,
            fetcher,
            extractor,
        }
    }

    /// Builds the pipeline from configuration. Does not touch the network;
    /// call [`Enricher::refresh_proxies`] to populate the proxy pool.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Ok(Self::new(
            AntiBlockContext::from_app_config(config)?,
            SearchResolver::new(SearchSettings::from_app_config(config)),
            ProfileFetcher::from_app_config(config),
            FieldExtractor::default(),
        ))
    }

    #[must_use]
    pub fn context(&self) -> &AntiBlockContext {
        &self.ctx
    }

    /// Reloads the shared proxy pool. See [`AntiBlockContext::refresh_proxies`].
    pub async fn refresh_proxies(&mut self) -> usize {
        self.ctx.refresh_proxies().await
    }

    /// Resolves, fetches and extracts for `company_name`.
    ///
    /// When no profile URL is found the result is all-empty and no page fetch
    /// is attempted.
    pub async fn enrich(&self, company_name: &str) -> EnrichmentResult {
        let candidates = self.resolver.resolve(&self.ctx, company_name).await;
        let Some(url) = candidates.into_iter().next() else {
            tracing::info!(company = company_name, "no profile URL found");
            return EnrichmentResult::default();
        };

        let fields = self
            .fetcher
            .fetch(&self.ctx, &url)
            .await
            .map(|html| self.extractor.extract(&html))
            .unwrap_or_default();

        tracing::info!(
            company = company_name,
            url = %url,
            identifier = %fields.identifier,
            location = %fields.location,
            "enriched company"
        );
        EnrichmentResult::from_fields(url, fields)
    }
}
