//! The dashboard page.
//!
//! Every request re-runs the whole pipeline: load sites, pick a station,
//! fetch conditions (and history when asked), render. Failures are rendered
//! in place of the widget they belong to.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use chrono::{Datelike, Utc};
use ecweather_core::{
    Mode, Province, StationSelector, WeatherData, WeatherError, WeatherRequest, fetch,
    provider::sites::sites_in_province,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::{ApiError, status_for},
    state::AppState,
    view::{
        DashboardView, ErrorView, HistoryView, MapView, Panel, ReadingView, province_options,
        station_options,
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub province: Option<String>,
    pub station: Option<String>,
    pub mode: Option<String>,
    pub year: Option<i32>,
}

fn parse_mode(raw: Option<&str>, year: i32) -> Result<Mode, String> {
    match raw.map(str::trim) {
        None | Some("") | Some("current") => Ok(Mode::Current),
        Some("historical") => Ok(Mode::Historical { year }),
        Some(other) => Err(format!("Unknown mode '{other}', expected current or historical")),
    }
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<(StatusCode, Html<String>), ApiError> {
    let mut status = StatusCode::OK;
    let mut notice = None;

    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let mode = parse_mode(query.mode.as_deref(), year).unwrap_or_else(|msg| {
        status = StatusCode::BAD_REQUEST;
        notice = Some(ErrorView { code: "invalid_mode", message: msg });
        Mode::Current
    });

    let province = match query.province.as_deref().map(Province::try_from).transpose() {
        Ok(p) => p.unwrap_or(state.dashboard.default_province),
        Err(e) => {
            status = status_for(&e);
            notice = Some(ErrorView::from(&e));
            state.dashboard.default_province
        }
    };

    let sites = match state.provider.sites().await {
        Ok(sites) => sites,
        Err(e) => {
            // Nothing else on the page can work without the site list.
            let view = DashboardView {
                provinces: province_options(province),
                stations: Vec::new(),
                province: province.to_string(),
                historical: matches!(mode, Mode::Historical { .. }),
                year,
                map: MapView::new(&[], None, state.language),
                notice: Some(ErrorView::from(&e)),
                conditions: None,
                history: None,
            };
            return Ok((status_for(&e), Html(state.renderer.dashboard(&view)?)));
        }
    };
    let province_sites = sites_in_province(&sites, province);

    // An explicit station wins; the configured default only applies to a bare visit.
    let station = query
        .station
        .clone()
        .or_else(|| {
            query.province.is_none().then(|| state.dashboard.default_station.clone()).flatten()
        })
        .or_else(|| province_sites.first().map(|s| s.id().to_string()))
        .unwrap_or_default();
    let resolved = StationSelector::parse(&station).and_then(|sel| sel.resolve(&sites)).ok();

    // The picker and map follow the station, even when it lies in another province.
    let (province, province_sites) = match resolved {
        Some(site) if site.province != province => {
            (site.province, sites_in_province(&sites, site.province))
        }
        _ => (province, province_sites),
    };
    let selected = resolved.map(|s| s.id().to_string());
    debug!(%province, %station, ?mode, "Rendering dashboard");

    let mut record = |e: &WeatherError| {
        if status == StatusCode::OK {
            status = status_for(e);
        }
    };

    let current = fetch(
        state.provider.as_ref(),
        &WeatherRequest { station: station.clone(), mode: Mode::Current },
    )
    .await;
    let conditions = match current {
        Ok(WeatherData::Current(reading)) => Panel::ready(ReadingView::from(&reading)),
        Ok(WeatherData::Historical(_)) => {
            return Err(ApiError::Internal("historical data returned for a current request".into()));
        }
        Err(e) => {
            record(&e);
            Panel::failed(&e)
        }
    };

    let history = match mode {
        Mode::Current => None,
        Mode::Historical { .. } => {
            let result =
                fetch(state.provider.as_ref(), &WeatherRequest { station: station.clone(), mode })
                    .await;
            Some(match result {
                Ok(WeatherData::Historical(h)) => Panel::ready(HistoryView::from(&h)),
                Ok(WeatherData::Current(_)) => {
                    return Err(ApiError::Internal(
                        "current data returned for a historical request".into(),
                    ));
                }
                Err(e) => {
                    record(&e);
                    Panel::failed(&e)
                }
            })
        }
    };

    let view = DashboardView {
        provinces: province_options(province),
        stations: station_options(&province_sites, selected.as_deref(), state.language),
        province: province.to_string(),
        historical: history.is_some(),
        year,
        map: MapView::new(&province_sites, selected.as_deref(), state.language),
        notice,
        conditions: Some(conditions),
        history,
    };

    Ok((status, Html(state.renderer.dashboard(&view)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_defaults_to_current() {
        assert_eq!(parse_mode(None, 2024), Ok(Mode::Current));
        assert_eq!(parse_mode(Some(""), 2024), Ok(Mode::Current));
        assert_eq!(parse_mode(Some("historical"), 2023), Ok(Mode::Historical { year: 2023 }));
        assert!(parse_mode(Some("forecast"), 2024).unwrap_err().contains("forecast"));
    }
}
