//! View models handed to the templates.
//!
//! Everything here is plain, pre-formatted data so that rendering the same
//! view twice yields the same page.

use ecweather_core::{
    DailyRecord, History, Language, Measurement, Province, Site, WeatherError, WeatherReading,
};
use serde::Serialize;

pub const MAP_WIDTH: f64 = 640.0;
pub const MAP_HEIGHT: f64 = 360.0;
pub const CHART_WIDTH: f64 = 720.0;
pub const CHART_HEIGHT: f64 = 240.0;
const PAD: f64 = 16.0;

#[derive(Debug, Clone, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorView {
    pub code: &'static str,
    pub message: String,
}

impl From<&WeatherError> for ErrorView {
    fn from(err: &WeatherError) -> Self {
        Self { code: err.code(), message: err.to_string() }
    }
}

/// A widget that either has data or shows an error in its place.
#[derive(Debug, Clone, Serialize)]
pub struct Panel<T> {
    pub data: Option<T>,
    pub error: Option<ErrorView>,
}

impl<T> Panel<T> {
    pub fn ready(data: T) -> Self {
        Self { data: Some(data), error: None }
    }

    pub fn failed(err: &WeatherError) -> Self {
        Self { data: None, error: Some(err.into()) }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadingView {
    pub station_id: String,
    pub station_name: String,
    pub observed_by: Option<String>,
    pub observed_at: String,
    pub rows: Vec<Measurement>,
}

impl From<&WeatherReading> for ReadingView {
    fn from(r: &WeatherReading) -> Self {
        Self {
            station_id: r.station.to_string(),
            station_name: r.station_name.clone(),
            observed_by: r.observed_by.clone(),
            observed_at: r.observed_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            rows: r.measurements(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyRow {
    pub date: String,
    pub max_temp: String,
    pub min_temp: String,
    pub mean_temp: String,
    pub precip: String,
    pub snow: String,
}

fn cell(v: Option<f64>) -> String {
    v.map_or_else(|| "—".to_string(), |v| format!("{v:.1}"))
}

impl From<&DailyRecord> for DailyRow {
    fn from(r: &DailyRecord) -> Self {
        Self {
            date: r.date.format("%Y-%m-%d").to_string(),
            max_temp: cell(r.max_temp_c),
            min_temp: cell(r.min_temp_c),
            mean_temp: cell(r.mean_temp_c),
            precip: cell(r.total_precip_mm),
            snow: cell(r.total_snow_cm),
        }
    }
}

/// Daily max/min temperature lines as SVG polyline points.
#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub width: f64,
    pub height: f64,
    pub max_line: String,
    pub min_line: String,
    pub top_label: String,
    pub bottom_label: String,
}

impl ChartView {
    pub fn from_records(records: &[DailyRecord]) -> Option<Self> {
        let temps = records.iter().flat_map(|r| [r.max_temp_c, r.min_temp_c]).flatten();
        let (lo, hi) = temps.fold(None, |acc: Option<(f64, f64)>, t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        })?;
        let span = if hi > lo { hi - lo } else { 1.0 };
        let steps = records.len().saturating_sub(1).max(1) as f64;

        let line = |pick: fn(&DailyRecord) -> Option<f64>| {
            records
                .iter()
                .enumerate()
                .filter_map(|(i, r)| {
                    let t = pick(r)?;
                    let x = PAD + i as f64 / steps * (CHART_WIDTH - 2.0 * PAD);
                    let y = PAD + (hi - t) / span * (CHART_HEIGHT - 2.0 * PAD);
                    Some(format!("{x:.1},{y:.1}"))
                })
                .collect::<Vec<_>>()
                .join(" ")
        };

        Some(Self {
            width: CHART_WIDTH,
            height: CHART_HEIGHT,
            max_line: line(|r| r.max_temp_c),
            min_line: line(|r| r.min_temp_c),
            top_label: format!("{hi:.1} °C"),
            bottom_label: format!("{lo:.1} °C"),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub station_name: String,
    pub climate_identifier: String,
    pub location: String,
    pub distance: String,
    pub year: i32,
    pub chart: Option<ChartView>,
    pub rows: Vec<DailyRow>,
}

impl From<&History> for HistoryView {
    fn from(h: &History) -> Self {
        Self {
            station_name: h.station.name.clone(),
            climate_identifier: h.station.climate_identifier.clone(),
            location: format!("({:.4}, {:.4})", h.station.latitude, h.station.longitude),
            distance: format!("{:.1} km", h.station.distance_km),
            year: h.year,
            chart: ChartView::from_records(&h.records),
            rows: h.records.iter().map(DailyRow::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MapPoint {
    pub x: String,
    pub y: String,
    pub label: String,
    pub selected: bool,
}

/// Site locations projected onto a flat box; stands in for a tile map.
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub width: f64,
    pub height: f64,
    pub points: Vec<MapPoint>,
}

impl MapView {
    pub fn new(sites: &[Site], selected: Option<&str>, language: Language) -> Self {
        let bounds = sites.iter().fold(None, |acc: Option<[f64; 4]>, s| {
            Some(match acc {
                None => [s.longitude, s.latitude, s.longitude, s.latitude],
                Some([x0, y0, x1, y1]) => {
                    [x0.min(s.longitude), y0.min(s.latitude), x1.max(s.longitude), y1.max(s.latitude)]
                }
            })
        });

        let points = match bounds {
            None => Vec::new(),
            Some([min_lon, min_lat, max_lon, max_lat]) => {
                let project = |v: f64, lo: f64, hi: f64, extent: f64| {
                    if hi > lo { PAD + (v - lo) / (hi - lo) * (extent - 2.0 * PAD) } else { extent / 2.0 }
                };
                sites
                    .iter()
                    .map(|s| MapPoint {
                        x: format!("{:.1}", project(s.longitude, min_lon, max_lon, MAP_WIDTH)),
                        y: format!(
                            "{:.1}",
                            MAP_HEIGHT - project(s.latitude, min_lat, max_lat, MAP_HEIGHT)
                        ),
                        label: s.name(language).to_string(),
                        selected: Some(s.id().to_string().as_str()) == selected,
                    })
                    .collect()
            }
        };

        Self { width: MAP_WIDTH, height: MAP_HEIGHT, points }
    }
}

/// Everything the dashboard page shows for one request.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub provinces: Vec<SelectOption>,
    pub stations: Vec<SelectOption>,
    pub province: String,
    pub historical: bool,
    pub year: i32,
    pub map: MapView,
    /// Page-level problem, e.g. the site list could not be loaded.
    pub notice: Option<ErrorView>,
    pub conditions: Option<Panel<ReadingView>>,
    pub history: Option<Panel<HistoryView>>,
}

pub fn province_options(selected: Province) -> Vec<SelectOption> {
    Province::all()
        .iter()
        .map(|p| SelectOption {
            value: p.as_str().to_string(),
            label: p.as_str().to_string(),
            selected: *p == selected,
        })
        .collect()
}

pub fn station_options(
    sites: &[Site],
    selected: Option<&str>,
    language: Language,
) -> Vec<SelectOption> {
    sites
        .iter()
        .map(|s| {
            let value = s.id().to_string();
            SelectOption {
                selected: Some(value.as_str()) == selected,
                label: s.name(language).to_string(),
                value,
            }
        })
        .collect()
}
