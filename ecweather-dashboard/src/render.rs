//! Page rendering with embedded Tera templates.

use std::sync::Arc;

use tera::{Context, Tera};
use thiserror::Error;

use crate::view::DashboardView;

mod embedded {
    pub const DASHBOARD: &str = include_str!("../templates/dashboard.html");
}

const DASHBOARD_TEMPLATE: &str = "dashboard.html";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template compilation failed: {0}")]
    Compile(String),

    #[error("Template rendering failed: {0}")]
    Render(String),
}

impl From<tera::Error> for RenderError {
    fn from(e: tera::Error) -> Self {
        // Tera keeps the useful part of the message in the source chain.
        let mut msg = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            msg.push_str(": ");
            msg.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Render(msg)
    }
}

#[derive(Clone)]
pub struct Renderer {
    tera: Arc<Tera>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);
        tera.add_raw_template(DASHBOARD_TEMPLATE, embedded::DASHBOARD)
            .map_err(|e| RenderError::Compile(e.to_string()))?;

        Ok(Self { tera: Arc::new(tera) })
    }

    /// Render the dashboard page. Output depends only on `view`.
    pub fn dashboard(&self, view: &DashboardView) -> Result<String, RenderError> {
        let context = Context::from_serialize(view)?;
        Ok(self.tera.render(DASHBOARD_TEMPLATE, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{
        ErrorView, HistoryView, MapView, Panel, ReadingView, province_options, station_options,
    };
    use ecweather_core::{Language, Measurement, Province, Site, WeatherError};

    fn sites() -> Vec<Site> {
        vec![Site {
            code: "s0000583".into(),
            english_name: "Charlottetown".into(),
            french_name: String::new(),
            province: Province::PrinceEdwardIsland,
            latitude: 46.24,
            longitude: -63.13,
        }]
    }

    fn view(conditions: Panel<ReadingView>) -> DashboardView {
        let sites = sites();
        DashboardView {
            provinces: province_options(Province::PrinceEdwardIsland),
            stations: station_options(&sites, Some("PE/s0000583"), Language::English),
            province: "PE".into(),
            historical: false,
            year: 2024,
            map: MapView::new(&sites, Some("PE/s0000583"), Language::English),
            notice: None,
            conditions: Some(conditions),
            history: None,
        }
    }

    fn reading() -> ReadingView {
        ReadingView {
            station_id: "PE/s0000583".into(),
            station_name: "Charlottetown".into(),
            observed_by: Some("Charlottetown Airport".into()),
            observed_at: "2024-02-08 14:00 UTC".into(),
            rows: vec![Measurement { label: "Temperature", value: "-2.1".into(), unit: "°C" }],
        }
    }

    #[test]
    fn renders_conditions_table() {
        let html = Renderer::new().unwrap().dashboard(&view(Panel::ready(reading()))).unwrap();

        assert!(html.contains("<td>Temperature</td><td>-2.1</td><td>°C</td>"));
        assert!(html.contains("Charlottetown Airport"));
        assert!(html.contains("Use the Refresh Data button"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let renderer = Renderer::new().unwrap();
        let v = view(Panel::ready(reading()));

        assert_eq!(renderer.dashboard(&v).unwrap(), renderer.dashboard(&v).unwrap());
    }

    #[test]
    fn error_replaces_conditions_table() {
        let err = WeatherError::Timeout;
        let html = Renderer::new().unwrap().dashboard(&view(Panel::failed(&err))).unwrap();

        assert!(html.contains(r#"data-code="provider_timeout""#));
        assert!(html.contains("did not respond in time"));
        assert!(!html.contains("<th>label</th>"));
    }

    #[test]
    fn escapes_provider_text() {
        let mut r = reading();
        r.station_name = "<script>alert(1)</script>".into();
        let html = Renderer::new().unwrap().dashboard(&view(Panel::ready(r))).unwrap();

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn empty_year_is_explained() {
        let mut v = view(Panel::ready(reading()));
        v.historical = true;
        v.history = Some(Panel::ready(HistoryView {
            station_name: "CHARLOTTETOWN A".into(),
            climate_identifier: "8300301".into(),
            location: "(46.2900, -63.1300)".into(),
            distance: "5.6 km".into(),
            year: 2030,
            chart: None,
            rows: Vec::new(),
        }));
        let html = Renderer::new().unwrap().dashboard(&v).unwrap();

        assert!(html.contains("No daily records for 2030."));
        assert!(!html.contains("<th>Date</th>"));
    }

    #[test]
    fn notice_is_shown() {
        let mut v = view(Panel::ready(reading()));
        v.notice = Some(ErrorView { code: "provider_unavailable", message: "down".into() });
        let html = Renderer::new().unwrap().dashboard(&v).unwrap();

        assert!(html.contains(r#"data-code="provider_unavailable""#));
    }
}
