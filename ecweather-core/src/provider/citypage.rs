//! City-page XML parsing (current conditions only).

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use crate::{
    error::WeatherError,
    model::{StationId, WeatherReading},
};

/// Fields collected while walking the document.
#[derive(Debug, Default)]
struct Collected {
    location_name: Option<String>,
    observed_by: Option<String>,
    observed_at: Option<String>,
    condition: Option<String>,
    temperature: Option<String>,
    dewpoint: Option<String>,
    wind_chill: Option<String>,
    humidex: Option<String>,
    pressure: Option<String>,
    tendency: Option<String>,
    visibility: Option<String>,
    humidity: Option<String>,
    wind_speed: Option<String>,
    wind_gust: Option<String>,
    wind_direction: Option<String>,
}

fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parse a city-page document into a reading for `station`.
pub fn parse_current_conditions(
    xml: &str,
    station: &StationId,
    retrieved_at: DateTime<Utc>,
) -> Result<WeatherReading, WeatherError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut in_utc_observation = false;
    let mut out = Collected::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "dateTime" && path_is(&path, &["siteData", "currentConditions"]) {
                    in_utc_observation = attr(&e, "name").as_deref() == Some("observation")
                        && attr(&e, "zone").as_deref() == Some("UTC");
                }
                if name == "pressure" && path_is(&path, &["siteData", "currentConditions"]) {
                    out.tendency = attr(&e, "tendency").filter(|t| !t.is_empty());
                }
                path.push(name);
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| WeatherError::Malformed(format!("bad XML text: {e}")))?
                    .trim()
                    .to_string();
                if text.is_empty() {
                    continue;
                }
                collect(&path, in_utc_observation, text, &mut out);
            }
            Ok(Event::End(_)) => {
                if path.pop().as_deref() == Some("dateTime") {
                    in_utc_observation = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(WeatherError::Malformed(format!(
                    "city-page XML error at position {}: {e}",
                    reader.error_position()
                )));
            }
            _ => {}
        }
    }

    into_reading(out, station, retrieved_at)
}

fn path_is(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len() && path.iter().zip(expected).all(|(a, b)| a == b)
}

fn collect(path: &[String], in_utc_observation: bool, text: String, out: &mut Collected) {
    let rel: Vec<&str> = path.iter().map(String::as_str).collect();
    let slot = match rel.as_slice() {
        ["siteData", "location", "name"] => &mut out.location_name,
        ["siteData", "currentConditions", rest @ ..] => match rest {
            ["station"] => &mut out.observed_by,
            ["dateTime", "timeStamp"] if in_utc_observation => &mut out.observed_at,
            ["condition"] => &mut out.condition,
            ["temperature"] => &mut out.temperature,
            ["dewpoint"] => &mut out.dewpoint,
            ["windChill"] => &mut out.wind_chill,
            ["humidex"] => &mut out.humidex,
            ["pressure"] => &mut out.pressure,
            ["visibility"] => &mut out.visibility,
            ["relativeHumidity"] => &mut out.humidity,
            ["wind", "speed"] => &mut out.wind_speed,
            ["wind", "gust"] => &mut out.wind_gust,
            ["wind", "direction"] => &mut out.wind_direction,
            _ => return,
        },
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(text);
    }
}

fn number(v: Option<String>) -> Option<f64> {
    // "Calm" wind speeds and blank readings are reported as text.
    v.and_then(|s| s.parse::<f64>().ok())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M%S").ok().map(|n| n.and_utc())
}

fn into_reading(
    c: Collected,
    station: &StationId,
    retrieved_at: DateTime<Utc>,
) -> Result<WeatherReading, WeatherError> {
    let raw_time = c
        .observed_at
        .ok_or_else(|| WeatherError::Malformed(format!("{station}: no observation time")))?;
    let observed_at = parse_timestamp(&raw_time).ok_or_else(|| {
        WeatherError::Malformed(format!("{station}: bad observation time '{raw_time}'"))
    })?;

    let reading = WeatherReading {
        station: station.clone(),
        station_name: c.location_name.unwrap_or_else(|| station.to_string()),
        observed_by: c.observed_by,
        observed_at,
        retrieved_at,
        condition: c.condition,
        temperature_c: number(c.temperature),
        dewpoint_c: number(c.dewpoint),
        humidity_pct: number(c.humidity),
        pressure_kpa: number(c.pressure),
        pressure_tendency: c.tendency,
        visibility_km: number(c.visibility),
        wind_speed_kmh: number(c.wind_speed),
        wind_gust_kmh: number(c.wind_gust),
        wind_direction: c.wind_direction,
        wind_chill: number(c.wind_chill),
        humidex: number(c.humidex),
    };

    if !reading.has_measurements() {
        return Err(WeatherError::Malformed(format!("{station}: no current conditions reported")));
    }

    Ok(reading)
}
