//! JSON endpoints backing the dashboard widgets

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Datelike, Utc};
use ecweather_core::{
    History, Mode, Province, Site, WeatherData, WeatherReading, WeatherRequest, fetch,
    provider::sites::sites_in_province,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SitesQuery {
    pub province: Option<String>,
}

/// List city-page sites, optionally for one province.
pub async fn list_sites(
    State(state): State<AppState>,
    Query(query): Query<SitesQuery>,
) -> Result<Json<Vec<Site>>, ApiError> {
    // Validate before touching the provider.
    let province = query.province.as_deref().map(Province::try_from).transpose()?;
    let sites = state.provider.sites().await?;

    Ok(Json(match province {
        Some(p) => sites_in_province(&sites, p),
        None => sites,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StationQuery {
    /// `PE/s0000583`, `s0000583` or a site name
    #[serde(default)]
    pub station: String,
    pub year: Option<i32>,
}

#[instrument(skip(state))]
pub async fn current_conditions(
    State(state): State<AppState>,
    Query(query): Query<StationQuery>,
) -> Result<Json<WeatherReading>, ApiError> {
    let request = WeatherRequest { station: query.station, mode: Mode::Current };

    match fetch(state.provider.as_ref(), &request).await? {
        WeatherData::Current(reading) => Ok(Json(reading)),
        WeatherData::Historical(_) => {
            Err(ApiError::Internal("historical data returned for a current request".into()))
        }
    }
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<StationQuery>,
) -> Result<Json<History>, ApiError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let request = WeatherRequest { station: query.station, mode: Mode::Historical { year } };

    match fetch(state.provider.as_ref(), &request).await? {
        WeatherData::Historical(history) => Ok(Json(history)),
        WeatherData::Current(_) => {
            Err(ApiError::Internal("current data returned for a historical request".into()))
        }
    }
}
