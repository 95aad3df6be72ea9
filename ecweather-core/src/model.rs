use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::error::WeatherError;

/// Canadian province or territory, keyed by its two-letter postal code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Province {
    Alberta,
    BritishColumbia,
    Manitoba,
    NewBrunswick,
    NewfoundlandAndLabrador,
    NovaScotia,
    NorthwestTerritories,
    Nunavut,
    Ontario,
    PrinceEdwardIsland,
    Quebec,
    Saskatchewan,
    Yukon,
}

impl Province {
    pub fn as_str(&self) -> &'static str {
        match self {
            Province::Alberta => "AB",
            Province::BritishColumbia => "BC",
            Province::Manitoba => "MB",
            Province::NewBrunswick => "NB",
            Province::NewfoundlandAndLabrador => "NL",
            Province::NovaScotia => "NS",
            Province::NorthwestTerritories => "NT",
            Province::Nunavut => "NU",
            Province::Ontario => "ON",
            Province::PrinceEdwardIsland => "PE",
            Province::Quebec => "QC",
            Province::Saskatchewan => "SK",
            Province::Yukon => "YT",
        }
    }

    /// All provinces and territories in the order the dashboard lists them.
    pub const fn all() -> &'static [Province] {
        &[
            Province::Alberta,
            Province::BritishColumbia,
            Province::Manitoba,
            Province::NewBrunswick,
            Province::NewfoundlandAndLabrador,
            Province::NovaScotia,
            Province::NorthwestTerritories,
            Province::Nunavut,
            Province::Ontario,
            Province::PrinceEdwardIsland,
            Province::Quebec,
            Province::Saskatchewan,
            Province::Yukon,
        ]
    }
}

impl fmt::Display for Province {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Province {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let upper = value.trim().to_uppercase();
        Province::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == upper)
            .ok_or_else(|| WeatherError::invalid(value, format!("unknown province '{value}'")))
    }
}

impl TryFrom<String> for Province {
    type Error = WeatherError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Province::try_from(value.as_str())
    }
}

impl From<Province> for String {
    fn from(p: Province) -> Self {
        p.as_str().to_string()
    }
}

/// Language of the text fields returned by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    French,
}

impl Language {
    /// Suffix used in city-page file names (`s0000583_e.xml`).
    pub fn suffix(&self) -> &'static str {
        match self {
            Language::English => "e",
            Language::French => "f",
        }
    }
}

/// Fully qualified city-page station, e.g. `PE/s0000583`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationId {
    pub province: Province,
    pub code: String,
}

impl StationId {
    /// Parse the `PP/sNNNNNNN` form. Never touches the network.
    pub fn parse(input: &str) -> Result<Self, WeatherError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(WeatherError::invalid(input, "station identifier is empty"));
        }

        let (prov, code) = trimmed
            .split_once('/')
            .ok_or_else(|| WeatherError::invalid(input, "expected PROVINCE/CODE"))?;

        let province = Province::try_from(prov)
            .map_err(|_| WeatherError::invalid(input, format!("unknown province '{prov}'")))?;

        if !is_site_code(code) {
            return Err(WeatherError::invalid(
                input,
                "site code must be 's' followed by 7 digits",
            ));
        }

        Ok(Self { province, code: code.to_lowercase() })
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.province, self.code)
    }
}

pub(crate) fn is_site_code(code: &str) -> bool {
    let mut chars = code.chars();
    matches!(chars.next(), Some('s' | 'S'))
        && code.len() == 8
        && chars.all(|c| c.is_ascii_digit())
}

/// What the user typed or picked to choose a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationSelector {
    Id(StationId),
    Code(String),
    Name(String),
}

impl StationSelector {
    /// Classify raw input. Empty input fails here, before any request is made.
    pub fn parse(input: &str) -> Result<Self, WeatherError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(WeatherError::invalid(input, "station identifier is empty"));
        }

        if trimmed.contains('/') {
            StationId::parse(trimmed).map(StationSelector::Id)
        } else if is_site_code(trimmed) {
            Ok(StationSelector::Code(trimmed.to_lowercase()))
        } else {
            Ok(StationSelector::Name(trimmed.to_string()))
        }
    }

    /// Find the site this selector refers to.
    pub fn resolve<'a>(&self, sites: &'a [Site]) -> Result<&'a Site, WeatherError> {
        let found = match self {
            StationSelector::Id(id) => sites.iter().find(|s| s.id() == *id),
            StationSelector::Code(code) => sites.iter().find(|s| s.code == *code),
            StationSelector::Name(name) => sites.iter().find(|s| {
                s.english_name.eq_ignore_ascii_case(name)
                    || s.french_name.to_lowercase() == name.to_lowercase()
            }),
        };

        found.ok_or_else(|| WeatherError::UnknownStation(self.to_string()))
    }
}

impl fmt::Display for StationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationSelector::Id(id) => id.fmt(f),
            StationSelector::Code(code) => f.write_str(code),
            StationSelector::Name(name) => f.write_str(name),
        }
    }
}

/// Current conditions, or one calendar year of daily climate data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Current,
    Historical { year: i32 },
}

#[derive(Debug, Clone)]
pub struct WeatherRequest {
    pub station: String,
    pub mode: Mode,
}

/// One row of the conditions table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub label: &'static str,
    pub value: String,
    pub unit: &'static str,
}

/// Snapshot of observed conditions at one city-page site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub station: StationId,
    pub station_name: String,
    /// Observing station reported in the feed, e.g. "Charlottetown Airport".
    pub observed_by: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub retrieved_at: DateTime<Utc>,
    pub condition: Option<String>,
    pub temperature_c: Option<f64>,
    pub dewpoint_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub pressure_kpa: Option<f64>,
    pub pressure_tendency: Option<String>,
    pub visibility_km: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_gust_kmh: Option<f64>,
    pub wind_direction: Option<String>,
    pub wind_chill: Option<f64>,
    pub humidex: Option<f64>,
}

impl WeatherReading {
    /// Populated fields as label/value/unit rows, in display order.
    pub fn measurements(&self) -> Vec<Measurement> {
        let numbers = [
            ("Temperature", self.temperature_c, "°C"),
            ("Dew Point", self.dewpoint_c, "°C"),
            ("Wind Chill", self.wind_chill, ""),
            ("Humidex", self.humidex, ""),
            ("Humidity", self.humidity_pct, "%"),
            ("Pressure", self.pressure_kpa, "kPa"),
            ("Visibility", self.visibility_km, "km"),
            ("Wind Speed", self.wind_speed_kmh, "km/h"),
            ("Wind Gust", self.wind_gust_kmh, "km/h"),
        ];
        let texts = [
            ("Condition", self.condition.as_ref()),
            ("Tendency", self.pressure_tendency.as_ref()),
            ("Wind Direction", self.wind_direction.as_ref()),
        ];

        let mut rows: Vec<Measurement> = texts
            .into_iter()
            .filter_map(|(label, v)| {
                v.map(|v| Measurement { label, value: v.clone(), unit: "" })
            })
            .collect();
        rows.extend(numbers.into_iter().filter_map(|(label, v, unit)| {
            v.map(|v| Measurement { label, value: format_number(v), unit })
        }));
        rows
    }

    pub fn has_measurements(&self) -> bool {
        !self.measurements().is_empty()
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 { format!("{v:.0}") } else { format!("{v}") }
}

/// One entry of the city-page site list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub code: String,
    pub english_name: String,
    pub french_name: String,
    pub province: Province,
    pub latitude: f64,
    pub longitude: f64,
}

impl Site {
    pub fn id(&self) -> StationId {
        StationId { province: self.province, code: self.code.clone() }
    }

    pub fn name(&self, language: Language) -> &str {
        match language {
            Language::English => &self.english_name,
            Language::French if !self.french_name.is_empty() => &self.french_name,
            Language::French => &self.english_name,
        }
    }
}

/// A climate archive station that publishes daily records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateStation {
    pub station_id: i64,
    pub climate_identifier: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub daily_first: Option<NaiveDate>,
    pub daily_last: Option<NaiveDate>,
    /// Distance from the site the station was chosen for.
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub max_temp_c: Option<f64>,
    pub min_temp_c: Option<f64>,
    pub mean_temp_c: Option<f64>,
    pub total_precip_mm: Option<f64>,
    pub total_snow_cm: Option<f64>,
}

impl DailyRecord {
    pub fn is_empty(&self) -> bool {
        self.max_temp_c.is_none()
            && self.min_temp_c.is_none()
            && self.mean_temp_c.is_none()
            && self.total_precip_mm.is_none()
            && self.total_snow_cm.is_none()
    }
}

/// Daily records for one year, ordered by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub site: StationId,
    pub station: ClimateStation,
    pub year: i32,
    pub records: Vec<DailyRecord>,
    pub retrieved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum WeatherData {
    Current(WeatherReading),
    Historical(History),
}
