use async_trait::async_trait;
use std::fmt::Debug;
use tracing::debug;

use crate::{
    error::WeatherError,
    model::{
        History, Mode, Site, StationId, StationSelector, WeatherData, WeatherReading,
        WeatherRequest,
    },
};

pub mod citypage;
pub mod climate;
pub mod eccc;
pub mod sites;

/// Source of station metadata and observations.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Every city-page site the provider knows about.
    async fn sites(&self) -> Result<Vec<Site>, WeatherError>;

    /// Latest observed conditions at a site.
    async fn current(&self, station: &StationId) -> Result<WeatherReading, WeatherError>;

    /// Daily climate records for `year` from the climate station nearest `site`.
    async fn history(&self, site: &Site, year: i32) -> Result<History, WeatherError>;
}

/// Resolve the requested station and fetch data for the requested mode.
///
/// The identifier is validated before the provider is contacted, so an empty
/// or malformed station never costs a network round trip.
pub async fn fetch(
    provider: &dyn WeatherProvider,
    request: &WeatherRequest,
) -> Result<WeatherData, WeatherError> {
    let selector = StationSelector::parse(&request.station)?;

    let sites = provider.sites().await?;
    let site = selector.resolve(&sites)?;
    debug!(station = %site.id(), mode = ?request.mode, "Fetching weather");

    match request.mode {
        Mode::Current => provider.current(&site.id()).await.map(WeatherData::Current),
        Mode::Historical { year } => provider.history(site, year).await.map(WeatherData::Historical),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Province;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    fn charlottetown() -> Site {
        Site {
            code: "s0000583".into(),
            english_name: "Charlottetown".into(),
            french_name: "Charlottetown".into(),
            province: Province::PrinceEdwardIsland,
            latitude: 46.24,
            longitude: -63.13,
        }
    }

    #[async_trait]
    impl WeatherProvider for CountingProvider {
        async fn sites(&self) -> Result<Vec<Site>, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![charlottetown()])
        }

        async fn current(&self, station: &StationId) -> Result<WeatherReading, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(WeatherReading {
                station: station.clone(),
                station_name: "Charlottetown".into(),
                observed_by: None,
                observed_at: Utc::now(),
                retrieved_at: Utc::now(),
                condition: Some("Clear".into()),
                temperature_c: Some(3.0),
                dewpoint_c: None,
                humidity_pct: None,
                pressure_kpa: None,
                pressure_tendency: None,
                visibility_km: None,
                wind_speed_kmh: None,
                wind_gust_kmh: None,
                wind_direction: None,
                wind_chill: None,
                humidex: None,
            })
        }

        async fn history(&self, site: &Site, _year: i32) -> Result<History, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(WeatherError::NoClimateStation(site.english_name.clone()))
        }
    }

    fn request(station: &str, mode: Mode) -> WeatherRequest {
        WeatherRequest { station: station.into(), mode }
    }

    #[tokio::test]
    async fn empty_station_fails_before_any_provider_call() {
        let provider = CountingProvider::default();
        let err = fetch(&provider, &request("", Mode::Current)).await.unwrap_err();

        assert!(matches!(err, WeatherError::InvalidStation { .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn current_mode_returns_one_reading() {
        let provider = CountingProvider::default();
        let data = fetch(&provider, &request("Charlottetown", Mode::Current)).await.unwrap();

        let WeatherData::Current(reading) = data else { panic!("expected current data") };
        assert_eq!(reading.station.to_string(), "PE/s0000583");
        assert!(reading.has_measurements());
    }

    #[tokio::test]
    async fn unknown_station_is_identified() {
        let provider = CountingProvider::default();
        let err = fetch(&provider, &request("YVR", Mode::Current)).await.unwrap_err();

        assert!(matches!(err, WeatherError::UnknownStation(_)));
        // Only the site list was consulted.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn historical_errors_propagate_unchanged() {
        let provider = CountingProvider::default();
        let err = fetch(&provider, &request("PE/s0000583", Mode::Historical { year: 2024 }))
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::NoClimateStation(ref n) if n == "Charlottetown"));
    }
}
