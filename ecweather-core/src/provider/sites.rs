//! City-page site list parsing.
//!
//! The list is a CSV with a title line above the header. Coordinates carry a
//! hemisphere suffix instead of a sign (`46.29N`, `63.13W`).

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::{
    error::WeatherError,
    model::{Province, Site},
};

struct Columns {
    code: usize,
    english: usize,
    french: Option<usize>,
    province: usize,
    latitude: usize,
    longitude: usize,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Option<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
        };

        Some(Self {
            code: find("Codes")?,
            english: find("English Names")?,
            french: find("French Names"),
            province: find("Province Codes")?,
            latitude: find("Latitude")?,
            longitude: find("Longitude")?,
        })
    }
}

/// Parse the site list body into sites, skipping rows that cannot be used.
pub fn parse_site_list(body: &str) -> Result<Vec<Site>, WeatherError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut columns = None;
    let mut sites = Vec::new();

    for record in reader.records() {
        let record =
            record.map_err(|e| WeatherError::Malformed(format!("site list is not valid CSV: {e}")))?;

        let Some(cols) = &columns else {
            columns = Columns::from_header(&record);
            continue;
        };

        match site_from_record(cols, &record) {
            Some(site) => sites.push(site),
            None => debug!(row = ?record, "Skipping unusable site list row"),
        }
    }

    if columns.is_none() {
        return Err(WeatherError::Malformed("site list has no header row".into()));
    }
    if sites.is_empty() {
        return Err(WeatherError::Malformed("site list contains no sites".into()));
    }

    Ok(sites)
}

fn site_from_record(cols: &Columns, record: &StringRecord) -> Option<Site> {
    let field = |i: usize| record.get(i).map(str::trim).filter(|s| !s.is_empty());

    let code = field(cols.code)?.to_lowercase();
    let english_name = field(cols.english)?.to_string();
    let french_name = cols.french.and_then(field).unwrap_or_default().to_string();
    let province = Province::try_from(field(cols.province)?).ok()?;
    let latitude = parse_coordinate(field(cols.latitude)?)?;
    let longitude = parse_coordinate(field(cols.longitude)?)?;

    Some(Site { code, english_name, french_name, province, latitude, longitude })
}

/// `46.29N` → 46.29, `63.13W` → -63.13. A bare signed number is accepted too.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let (number, sign) = match raw.chars().last()? {
        'N' | 'n' | 'E' | 'e' => (&raw[..raw.len() - 1], 1.0),
        'S' | 's' | 'W' | 'w' => (&raw[..raw.len() - 1], -1.0),
        _ => (raw, 1.0),
    };
    number.trim().parse::<f64>().ok().map(|v| v * sign)
}

/// Sites in one province, in list order.
pub fn sites_in_province(sites: &[Site], province: Province) -> Vec<Site> {
    sites.iter().filter(|s| s.province == province).cloned().collect()
}
