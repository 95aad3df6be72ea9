//! Climate archive: nearby-station search and daily bulk data.

use chrono::{NaiveDate, TimeDelta};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::WeatherError,
    model::{ClimateStation, DailyRecord},
};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Deserialize)]
pub(crate) struct StationCollection {
    #[serde(default)]
    features: Vec<StationFeature>,
}

#[derive(Debug, Deserialize)]
struct StationFeature {
    geometry: Option<PointGeometry>,
    properties: StationProperties,
}

#[derive(Debug, Deserialize)]
struct PointGeometry {
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct StationProperties {
    #[serde(rename = "STN_ID")]
    stn_id: Option<i64>,
    #[serde(rename = "STATION_NAME")]
    station_name: Option<String>,
    #[serde(rename = "CLIMATE_IDENTIFIER")]
    climate_identifier: Option<String>,
    #[serde(rename = "DLY_FIRST_DATE")]
    dly_first_date: Option<String>,
    #[serde(rename = "DLY_LAST_DATE")]
    dly_last_date: Option<String>,
}

/// Great-circle distance in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// `minlon,minlat,maxlon,maxlat` box enclosing a circle of `radius_km`.
pub fn bounding_box(lat: f64, lon: f64, radius_km: f64) -> [f64; 4] {
    let d_lat = radius_km / 111.0;
    let d_lon = radius_km / (111.0 * lat.to_radians().cos().abs().max(0.01));
    [lon - d_lon, lat - d_lat, lon + d_lon, lat + d_lat]
}

fn parse_day(raw: Option<&str>) -> Option<NaiveDate> {
    // Dates arrive as "2024-02-07" or "2024-02-07 00:00:00".
    let raw = raw?.trim();
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

/// Stations within `radius_km` of the point, nearest first, at most `limit`.
pub(crate) fn nearby_stations(
    collection: StationCollection,
    lat: f64,
    lon: f64,
    radius_km: f64,
    limit: usize,
) -> Vec<ClimateStation> {
    let mut stations: Vec<ClimateStation> = collection
        .features
        .into_iter()
        .filter_map(|f| {
            let coords = f.geometry?.coordinates;
            let (s_lon, s_lat) = (*coords.first()?, *coords.get(1)?);
            let p = f.properties;
            Some(ClimateStation {
                station_id: p.stn_id?,
                climate_identifier: p.climate_identifier.unwrap_or_default(),
                name: p.station_name.unwrap_or_default(),
                latitude: s_lat,
                longitude: s_lon,
                daily_first: parse_day(p.dly_first_date.as_deref()),
                daily_last: parse_day(p.dly_last_date.as_deref()),
                distance_km: haversine_km(lat, lon, s_lat, s_lon),
            })
        })
        .filter(|s| s.distance_km <= radius_km)
        .collect();

    stations.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    stations.truncate(limit);
    stations
}

/// Nearest station whose daily record reaches `today - max_lag_days`.
pub fn choose_station(
    stations: &[ClimateStation],
    today: NaiveDate,
    max_lag_days: i64,
) -> Option<&ClimateStation> {
    // A lag reaching past the calendar admits every station.
    let cutoff = TimeDelta::try_days(max_lag_days)
        .and_then(|lag| today.checked_sub_signed(lag))
        .unwrap_or(NaiveDate::MIN);
    stations
        .iter()
        .filter(|s| s.daily_last.is_some_and(|last| last >= cutoff))
        .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
}

struct DailyColumns {
    date: usize,
    max_temp: Option<usize>,
    min_temp: Option<usize>,
    mean_temp: Option<usize>,
    total_precip: Option<usize>,
    total_snow: Option<usize>,
}

/// Parse a daily bulk-data CSV. Days with no values (future dates) are dropped.
pub fn parse_daily_csv(body: &str) -> Result<Vec<DailyRecord>, WeatherError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.trim_start_matches('\u{feff}').as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| WeatherError::Malformed(format!("climate CSV header: {e}")))?
        .clone();
    let find = |prefix: &str| headers.iter().position(|h| h.trim().starts_with(prefix));

    let cols = DailyColumns {
        date: find("Date/Time")
            .ok_or_else(|| WeatherError::Malformed("climate CSV has no Date/Time column".into()))?,
        max_temp: find("Max Temp ("),
        min_temp: find("Min Temp ("),
        mean_temp: find("Mean Temp ("),
        total_precip: find("Total Precip ("),
        total_snow: find("Total Snow ("),
    };

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| WeatherError::Malformed(format!("climate CSV row: {e}")))?;
        let value = |i: Option<usize>| {
            i.and_then(|i| row.get(i)).and_then(|v| v.trim().parse::<f64>().ok())
        };

        let Some(date) = row
            .get(cols.date)
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
        else {
            debug!(row = ?row, "Skipping climate row without a date");
            continue;
        };

        let record = DailyRecord {
            date,
            max_temp_c: value(cols.max_temp),
            min_temp_c: value(cols.min_temp),
            mean_temp_c: value(cols.mean_temp),
            total_precip_mm: value(cols.total_precip),
            total_snow_cm: value(cols.total_snow),
        };
        if !record.is_empty() {
            records.push(record);
        }
    }

    records.sort_by_key(|r| r.date);
    Ok(records)
}
