//! Provider tests against a mock HTTP server standing in for the
//! Environment Canada datamart, OGC API and climate archive.

use std::time::Duration;

use ecweather_core::{
    EcccProvider, Mode, Province, ProviderConfig, Site, StationId, WeatherData, WeatherError,
    WeatherProvider, WeatherRequest, fetch,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const SITE_LIST: &str = "\
Site Names,,,,
Codes,English Names,Province Codes,Latitude,Longitude
s0000583,Charlottetown,PE,46.24N,63.13W
s0000141,Vancouver,BC,49.25N,123.12W
";

const CITYPAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<siteData>
  <location><name code="s0000583" lat="46.24N" lon="63.13W">Charlottetown</name></location>
  <currentConditions>
    <station code="yyg">Charlottetown Airport</station>
    <dateTime name="observation" zone="UTC" UTCOffset="0"><timeStamp>20240208140000</timeStamp></dateTime>
    <condition>Light Snow</condition>
    <temperature unitType="metric" units="C">-4.0</temperature>
    <relativeHumidity units="%">88</relativeHumidity>
    <wind><speed unitType="metric" units="km/h">22</speed><direction>N</direction></wind>
  </currentConditions>
</siteData>"#;

const DAILY_CSV: &str = "\"Longitude (x)\",\"Latitude (y)\",\"Station Name\",\"Climate ID\",\"Date/Time\",\"Year\",\"Month\",\"Day\",\"Max Temp (°C)\",\"Min Temp (°C)\",\"Mean Temp (°C)\",\"Total Precip (mm)\"
\"-63.13\",\"46.29\",\"CHARLOTTETOWN A\",\"8300301\",\"2024-01-01\",\"2024\",\"01\",\"01\",\"0.2\",\"-6.1\",\"-3.0\",\"1.8\"
\"-63.13\",\"46.29\",\"CHARLOTTETOWN A\",\"8300301\",\"2024-01-02\",\"2024\",\"01\",\"02\",\"1.5\",\"-4.0\",\"-1.3\",\"0.4\"
";

fn climate_stations(last_daily: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [-63.13, 46.29] },
            "properties": {
                "STN_ID": 50621,
                "STATION_NAME": "CHARLOTTETOWN A",
                "CLIMATE_IDENTIFIER": "8300301",
                "DLY_FIRST_DATE": "2012-09-10 00:00:00",
                "DLY_LAST_DATE": last_daily
            }
        }]
    })
}

fn create_provider(mock_server: &MockServer, timeout_secs: u64) -> EcccProvider {
    let config = ProviderConfig {
        datamart_url: mock_server.uri(),
        geomet_url: mock_server.uri(),
        climate_url: mock_server.uri(),
        timeout_secs,
        ..Default::default()
    };
    EcccProvider::new(config).expect("Failed to create provider")
}

fn charlottetown() -> Site {
    Site {
        code: "s0000583".into(),
        english_name: "Charlottetown".into(),
        french_name: String::new(),
        province: Province::PrinceEdwardIsland,
        latitude: 46.24,
        longitude: -63.13,
    }
}

fn station() -> StationId {
    StationId::parse("PE/s0000583").expect("valid id")
}

async fn mount_site_list(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/citypage_weather/docs/site_list_provinces_en.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SITE_LIST))
        .mount(mock_server)
        .await;
}

async fn mount_citypage(mock_server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/citypage_weather/xml/PE/s0000583_e.xml"))
        .respond_with(response)
        .mount(mock_server)
        .await;
}

// ============================================================================
// Current conditions
// ============================================================================

#[tokio::test]
async fn test_sites_parses_list() {
    let mock_server = MockServer::start().await;
    mount_site_list(&mock_server).await;

    let sites = create_provider(&mock_server, 5).sites().await.expect("sites");

    assert_eq!(sites.len(), 2);
    assert_eq!(sites[1].province, Province::BritishColumbia);
    assert!(sites[1].longitude < 0.0);
}

#[tokio::test]
async fn test_current_success() {
    let mock_server = MockServer::start().await;
    mount_citypage(&mock_server, ResponseTemplate::new(200).set_body_string(CITYPAGE)).await;

    let reading = create_provider(&mock_server, 5).current(&station()).await.expect("reading");

    assert_eq!(reading.station, station());
    assert_eq!(reading.station_name, "Charlottetown");
    assert_eq!(reading.temperature_c, Some(-4.0));
    assert_eq!(reading.humidity_pct, Some(88.0));
    assert_eq!(reading.condition.as_deref(), Some("Light Snow"));
    assert!(reading.retrieved_at >= reading.observed_at);
}

#[tokio::test]
async fn test_current_not_found_is_unknown_station() {
    let mock_server = MockServer::start().await;
    mount_citypage(&mock_server, ResponseTemplate::new(404)).await;

    let err = create_provider(&mock_server, 5).current(&station()).await.unwrap_err();

    assert!(matches!(err, WeatherError::UnknownStation(ref s) if s == "PE/s0000583"));
}

#[tokio::test]
async fn test_current_server_error_is_unavailable() {
    let mock_server = MockServer::start().await;
    mount_citypage(&mock_server, ResponseTemplate::new(503).set_body_string("maintenance")).await;

    let err = create_provider(&mock_server, 5).current(&station()).await.unwrap_err();

    assert!(matches!(err, WeatherError::Unavailable(ref m) if m.contains("maintenance")));
}

#[tokio::test]
async fn test_current_garbage_is_malformed() {
    let mock_server = MockServer::start().await;
    mount_citypage(&mock_server, ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .await;

    let err = create_provider(&mock_server, 5).current(&station()).await.unwrap_err();

    assert!(matches!(err, WeatherError::Malformed(_)));
}

#[tokio::test]
async fn test_current_timeout() {
    let mock_server = MockServer::start().await;
    mount_citypage(
        &mock_server,
        ResponseTemplate::new(200).set_body_string(CITYPAGE).set_delay(Duration::from_secs(3)),
    )
    .await;

    let err = create_provider(&mock_server, 1).current(&station()).await.unwrap_err();

    assert!(matches!(err, WeatherError::Timeout), "got {err:?}");
}

// ============================================================================
// Historical data
// ============================================================================

#[tokio::test]
async fn test_history_picks_nearby_station_and_parses_days() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections/climate-stations/items"))
        .and(query_param("f", "json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(climate_stations("2099-12-31 00:00:00")),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/climate_data/bulk_data_e.html"))
        .and(query_param("stationID", "50621"))
        .and(query_param("Year", "2024"))
        .and(query_param("timeframe", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DAILY_CSV))
        .mount(&mock_server)
        .await;

    let history =
        create_provider(&mock_server, 5).history(&charlottetown(), 2024).await.expect("history");

    assert_eq!(history.station.climate_identifier, "8300301");
    assert_eq!(history.station.name, "CHARLOTTETOWN A");
    assert_eq!(history.year, 2024);
    assert_eq!(history.records.len(), 2);
    assert!(history.records[0].date < history.records[1].date);
    assert_eq!(history.site, station());
}

#[tokio::test]
async fn test_history_without_current_station() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections/climate-stations/items"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(climate_stations("1998-12-31 00:00:00")),
        )
        .mount(&mock_server)
        .await;

    let err = create_provider(&mock_server, 5).history(&charlottetown(), 2024).await.unwrap_err();

    assert!(matches!(err, WeatherError::NoClimateStation(ref n) if n == "Charlottetown"));
}

// ============================================================================
// End-to-end request dispatch
// ============================================================================

#[tokio::test]
async fn test_fetch_current_by_name() {
    let mock_server = MockServer::start().await;
    mount_site_list(&mock_server).await;
    mount_citypage(&mock_server, ResponseTemplate::new(200).set_body_string(CITYPAGE)).await;

    let provider = create_provider(&mock_server, 5);
    let request = WeatherRequest { station: "charlottetown".into(), mode: Mode::Current };

    match fetch(&provider, &request).await.expect("data") {
        WeatherData::Current(reading) => assert!(!reading.measurements().is_empty()),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_empty_station_makes_no_requests() {
    let mock_server = MockServer::start().await;
    mount_site_list(&mock_server).await;

    let provider = create_provider(&mock_server, 5);
    let request = WeatherRequest { station: "  ".into(), mode: Mode::Current };

    let err = fetch(&provider, &request).await.unwrap_err();

    assert!(matches!(err, WeatherError::InvalidStation { .. }));
    let received = mock_server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}
