use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument};

use crate::{
    config::ProviderConfig,
    error::WeatherError,
    model::{History, Site, StationId, WeatherReading},
    provider::{
        citypage::parse_current_conditions,
        climate::{self, StationCollection},
        sites::parse_site_list,
    },
};

use super::WeatherProvider;

/// Client for the Environment and Climate Change Canada public endpoints.
#[derive(Debug, Clone)]
pub struct EcccProvider {
    config: ProviderConfig,
    http: Client,
}

impl EcccProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("ecweather/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WeatherError::Unavailable(format!("HTTP client setup failed: {e}")))?;

        Ok(Self { config, http })
    }

    fn site_list_url(&self) -> String {
        format!(
            "{}/citypage_weather/docs/site_list_provinces_en.csv",
            self.config.datamart_url.trim_end_matches('/')
        )
    }

    fn citypage_url(&self, station: &StationId) -> String {
        format!(
            "{}/citypage_weather/xml/{}/{}_{}.xml",
            self.config.datamart_url.trim_end_matches('/'),
            station.province,
            station.code,
            self.config.language.suffix()
        )
    }

    async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<(StatusCode, String), WeatherError> {
        let res: Response = self.http.get(url).query(query).send().await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        Ok((status, decode_body(&bytes)))
    }

    async fn nearby_climate_stations(
        &self,
        site: &Site,
    ) -> Result<Vec<crate::model::ClimateStation>, WeatherError> {
        let url = format!(
            "{}/collections/climate-stations/items",
            self.config.geomet_url.trim_end_matches('/')
        );
        let bbox = climate::bounding_box(site.latitude, site.longitude, self.config.search_radius_km)
            .map(|v| format!("{v:.4}"))
            .join(",");

        let (status, body) = self
            .get_text(&url, &[("f", "json".into()), ("bbox", bbox), ("limit", "500".into())])
            .await?;
        if !status.is_success() {
            return Err(WeatherError::Unavailable(format!(
                "climate station search failed with status {status}: {}",
                truncate_body(&body)
            )));
        }

        let collection: StationCollection = serde_json::from_str(&body)
            .map_err(|e| WeatherError::Malformed(format!("climate station JSON: {e}")))?;

        Ok(climate::nearby_stations(
            collection,
            site.latitude,
            site.longitude,
            self.config.search_radius_km,
            self.config.search_limit,
        ))
    }
}

#[async_trait]
impl WeatherProvider for EcccProvider {
    #[instrument(skip(self))]
    async fn sites(&self) -> Result<Vec<Site>, WeatherError> {
        let (status, body) = self.get_text(&self.site_list_url(), &[]).await?;
        if !status.is_success() {
            return Err(WeatherError::Unavailable(format!(
                "site list request failed with status {status}: {}",
                truncate_body(&body)
            )));
        }

        let sites = parse_site_list(&body)?;
        debug!(count = sites.len(), "Loaded site list");
        Ok(sites)
    }

    #[instrument(skip(self), fields(station = %station))]
    async fn current(&self, station: &StationId) -> Result<WeatherReading, WeatherError> {
        let (status, body) = self.get_text(&self.citypage_url(station), &[]).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::UnknownStation(station.to_string()));
        }
        if !status.is_success() {
            return Err(WeatherError::Unavailable(format!(
                "city-page request for {station} failed with status {status}: {}",
                truncate_body(&body)
            )));
        }

        parse_current_conditions(&body, station, Utc::now())
    }

    #[instrument(skip(self, site), fields(station = %site.id()))]
    async fn history(&self, site: &Site, year: i32) -> Result<History, WeatherError> {
        let stations = self.nearby_climate_stations(site).await?;
        let today = Utc::now().date_naive();
        let chosen = climate::choose_station(&stations, today, self.config.max_daily_lag_days)
            .cloned()
            .ok_or_else(|| WeatherError::NoClimateStation(site.english_name.clone()))?;
        debug!(
            climate_id = %chosen.climate_identifier,
            distance_km = chosen.distance_km,
            "Selected climate station"
        );

        let url = format!(
            "{}/climate_data/bulk_data_e.html",
            self.config.climate_url.trim_end_matches('/')
        );
        let (status, body) = self
            .get_text(
                &url,
                &[
                    ("format", "csv".into()),
                    ("stationID", chosen.station_id.to_string()),
                    ("Year", year.to_string()),
                    ("Month", "1".into()),
                    ("Day", "1".into()),
                    ("timeframe", "2".into()),
                    ("submit", "Download Data".into()),
                ],
            )
            .await?;
        if !status.is_success() {
            return Err(WeatherError::Unavailable(format!(
                "climate data request failed with status {status}: {}",
                truncate_body(&body)
            )));
        }

        let records = climate::parse_daily_csv(&body)?;

        Ok(History { site: site.id(), station: chosen, year, records, retrieved_at: Utc::now() })
    }
}

/// Feeds are UTF-8 or ISO-8859-1; Latin-1 bytes map 1:1 onto code points.
fn decode_body(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
