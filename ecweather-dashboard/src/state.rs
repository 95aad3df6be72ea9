//! Application state shared across handlers

use std::sync::Arc;

use async_trait::async_trait;
use ecweather_core::{
    DashboardConfig, History, Language, Site, StationId, WeatherError, WeatherProvider,
    WeatherReading,
};
use tokio::sync::OnceCell;
use tracing::info;

use crate::render::{RenderError, Renderer};

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Provider with the site list memoised for the process lifetime
    pub provider: Arc<dyn WeatherProvider>,
    pub renderer: Renderer,
    /// Initial selections for the dashboard page
    pub dashboard: DashboardConfig,
    /// Language used for site names
    pub language: Language,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        dashboard: DashboardConfig,
        language: Language,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            provider: Arc::new(SiteListCache::new(provider)),
            renderer: Renderer::new()?,
            dashboard,
            language,
        })
    }
}

/// Keeps the first successfully loaded site list. Observations are never cached.
#[derive(Debug)]
pub struct SiteListCache {
    inner: Arc<dyn WeatherProvider>,
    sites: OnceCell<Vec<Site>>,
}

impl SiteListCache {
    pub fn new(inner: Arc<dyn WeatherProvider>) -> Self {
        Self { inner, sites: OnceCell::new() }
    }
}

#[async_trait]
impl WeatherProvider for SiteListCache {
    async fn sites(&self) -> Result<Vec<Site>, WeatherError> {
        let sites = self
            .sites
            .get_or_try_init(|| async {
                let sites = self.inner.sites().await?;
                info!(count = sites.len(), "Site list loaded");
                Ok::<_, WeatherError>(sites)
            })
            .await?;
        Ok(sites.clone())
    }

    async fn current(&self, station: &StationId) -> Result<WeatherReading, WeatherError> {
        self.inner.current(station).await
    }

    async fn history(&self, site: &Site, year: i32) -> Result<History, WeatherError> {
        self.inner.history(site, year).await
    }
}
