//! Derived views: everything a renderer needs, computed from [`DashboardState`]
//! without side effects.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::{
    model::{CurrentConditions, ForecastSeries},
    state::{DashboardState, Notification},
};

/// Points shown in the short forecast summary.
pub const SUMMARY_POINTS: usize = 6;

pub const MAP_ZOOM: u8 = 13;
pub const MAP_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const MAP_ATTRIBUTION: &str = "© OpenStreetMap contributors";

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClockFormat {
    /// "06:05 AM"
    #[default]
    #[serde(rename = "12h")]
    TwelveHour,
    /// "06:05"
    #[serde(rename = "24h")]
    TwentyFourHour,
}

impl ClockFormat {
    fn pattern(self) -> &'static str {
        match self {
            Self::TwelveHour => "%I:%M %p",
            Self::TwentyFourHour => "%H:%M",
        }
    }
}

impl FromStr for ClockFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "12" | "12h" => Ok(Self::TwelveHour),
            "24" | "24h" => Ok(Self::TwentyFourHour),
            other => Err(format!("unknown clock format '{other}', expected 12h or 24h")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherIcon {
    Cloud,
    Rain,
    Snow,
    Sun,
    Wind,
}

/// Checked top to bottom; the first keyword found in the description wins.
const ICON_RULES: &[(&str, WeatherIcon)] = &[
    ("cloud", WeatherIcon::Cloud),
    ("rain", WeatherIcon::Rain),
    ("snow", WeatherIcon::Snow),
    ("clear", WeatherIcon::Sun),
    ("wind", WeatherIcon::Wind),
];

impl WeatherIcon {
    pub fn for_description(description: &str) -> Self {
        let description = description.to_lowercase();
        ICON_RULES
            .iter()
            .find(|(keyword, _)| description.contains(keyword))
            .map(|(_, icon)| *icon)
            .unwrap_or(WeatherIcon::Cloud)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Sun => "sun",
            Self::Wind => "wind",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Cloud => "☁",
            Self::Rain => "🌧",
            Self::Snow => "❄",
            Self::Sun => "☀",
            Self::Wind => "🌬",
        }
    }
}

/// Nearest integer, halves rounded up (14.5 → 15, -2.5 → -2).
pub fn round_temperature(celsius: f64) -> i64 {
    (celsius + 0.5).floor() as i64
}

/// "15°C"
pub fn display_temperature(celsius: f64) -> String {
    format!("{}°C", round_temperature(celsius))
}

pub fn visibility_km(meters: u32) -> f64 {
    f64::from(meters) / 1000.0
}

fn with_unit<T: Display>(value: Option<T>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v} {unit}"),
        None => format!("{NOT_AVAILABLE} {unit}"),
    }
}

/// Epoch seconds as a zero-padded hour:minute in `tz`.
pub fn format_time<Tz>(timestamp: i64, clock: ClockFormat, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match DateTime::from_timestamp(timestamp, 0) {
        Some(utc) => utc.with_timezone(tz).format(clock.pattern()).to_string(),
        None => "--:--".to_string(),
    }
}

/// "5/1/2024"
fn format_date<Tz>(timestamp: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match DateTime::from_timestamp(timestamp, 0) {
        Some(utc) => utc.with_timezone(tz).format("%-m/%-d/%Y").to_string(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: i64,
    /// Axis label, hour:minute.
    pub label: String,
    /// Date and time, for hover text.
    pub tooltip: String,
    pub temperature: f64,
}

/// One chart point per forecast step, in the order received.
pub fn chart_series<Tz>(series: &ForecastSeries, clock: ClockFormat, tz: &Tz) -> Vec<ChartPoint>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    series
        .list
        .iter()
        .map(|point| {
            let label = format_time(point.dt, clock, tz);
            ChartPoint {
                timestamp: point.dt,
                tooltip: format!("{} {}", format_date(point.dt, tz), label),
                label,
                temperature: point.main.temp,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPoint {
    pub date: String,
    pub temperature: f64,
}

/// The first [`SUMMARY_POINTS`] forecast steps labelled by date.
pub fn forecast_summary<Tz>(series: &ForecastSeries, tz: &Tz) -> Vec<SummaryPoint>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    series
        .list
        .iter()
        .take(SUMMARY_POINTS)
        .map(|point| SummaryPoint {
            date: format_date(point.dt, tz),
            temperature: point.main.temp,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub lat: f64,
    pub lon: f64,
    pub popup: String,
    pub zoom: u8,
    pub tile_url: &'static str,
    pub attribution: &'static str,
}

impl MapMarker {
    pub fn for_conditions(current: &CurrentConditions) -> Self {
        Self {
            lat: current.coord.lat,
            lon: current.coord.lon,
            popup: current.location_label(),
            zoom: MAP_ZOOM,
            tile_url: MAP_TILE_URL,
            attribution: MAP_ATTRIBUTION,
        }
    }
}

/// Display strings for the information cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionsView {
    pub location: String,
    pub description: String,
    pub icon: WeatherIcon,
    pub temperature: String,
    pub feels_like: String,
    pub min: String,
    pub max: String,
    pub wind_speed: String,
    pub wind_direction: String,
    pub wind_gust: String,
    pub humidity: String,
    pub pressure: String,
    pub sea_level: String,
    pub visibility: String,
    pub cloud_cover: String,
    pub sunrise: String,
    pub sunset: String,
}

impl ConditionsView {
    pub fn new<Tz>(current: &CurrentConditions, clock: ClockFormat, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let description = current.description().to_string();
        Self {
            location: current.location_label(),
            icon: WeatherIcon::for_description(&description),
            description,
            temperature: display_temperature(current.main.temp),
            feels_like: display_temperature(current.main.feels_like),
            min: display_temperature(current.main.temp_min),
            max: display_temperature(current.main.temp_max),
            wind_speed: format!("{} m/s", current.wind.speed),
            wind_direction: format!("{}°", current.wind.deg),
            wind_gust: with_unit(current.wind.gust, "m/s"),
            humidity: format!("{}%", current.main.humidity),
            pressure: format!("{} hPa", current.main.pressure),
            sea_level: with_unit(current.main.sea_level, "hPa"),
            visibility: with_unit(current.visibility.map(visibility_km), "km"),
            cloud_cover: format!("{}%", current.clouds.all),
            sunrise: format_time(current.sys.sunrise, clock, tz),
            sunset: format_time(current.sys.sunset, clock, tz),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadyView {
    pub conditions: ConditionsView,
    /// Absent until the forecast has loaded.
    pub chart: Option<Vec<ChartPoint>>,
    pub summary: Option<Vec<SummaryPoint>>,
    pub map: MapMarker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", rename_all = "lowercase")]
pub enum Panel {
    /// Skeleton placeholders while current conditions load.
    Loading,
    /// Nothing fetched yet.
    Empty,
    Ready(Box<ReadyView>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub query: String,
    /// Label of the submit button; also disabled while loading.
    pub submit_label: &'static str,
    pub submit_enabled: bool,
    pub panel: Panel,
    pub notifications: Vec<Notification>,
}

/// Build the view model for `state`.
pub fn render<Tz>(state: &DashboardState, clock: ClockFormat, tz: &Tz) -> DashboardView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let panel = if state.loading {
        Panel::Loading
    } else if let Some(current) = &state.current {
        Panel::Ready(Box::new(ReadyView {
            conditions: ConditionsView::new(current, clock, tz),
            chart: state.forecast.as_ref().map(|f| chart_series(f, clock, tz)),
            summary: state.forecast.as_ref().map(|f| forecast_summary(f, tz)),
            map: MapMarker::for_conditions(current),
        }))
    } else {
        Panel::Empty
    };

    DashboardView {
        query: state.query.clone(),
        submit_label: if state.loading { "Loading..." } else { "Search" },
        submit_enabled: !state.loading,
        panel,
        notifications: state.notifications.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Clouds, Condition, Coordinates, ForecastPoint, MainReadings, PointReadings, SunCycle, Wind,
    };
    use crate::state::DashboardEvent;
    use chrono::{FixedOffset, Utc};

    fn london() -> CurrentConditions {
        CurrentConditions {
            name: "London".into(),
            coord: Coordinates { lat: 51.5085, lon: -0.1257 },
            main: MainReadings {
                temp: 14.6,
                feels_like: 14.4,
                temp_min: 13.2,
                temp_max: 16.1,
                humidity: 72,
                pressure: 1015,
                sea_level: None,
            },
            wind: Wind { speed: 4.12, deg: 250, gust: Some(7.2) },
            visibility: Some(10_000),
            clouds: Clouds { all: 75 },
            weather: vec![Condition {
                main: "Clouds".into(),
                description: "broken clouds".into(),
                icon: Some("04d".into()),
            }],
            // 05:04 and 19:42 UTC
            sys: SunCycle { country: "GB".into(), sunrise: 1_714_539_840, sunset: 1_714_592_520 },
            dt: 1_714_560_000,
            timezone: 3600,
        }
    }

    fn forecast(points: usize) -> ForecastSeries {
        let start = 1_714_564_800; // 2024-05-01 12:00:00 UTC
        ForecastSeries {
            city: None,
            list: (0..points)
                .map(|i| ForecastPoint {
                    dt: start + i as i64 * 10_800,
                    dt_txt: String::new(),
                    main: PointReadings { temp: 10.0 + i as f64, feels_like: None, humidity: None },
                    weather: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn icon_priority() {
        assert_eq!(WeatherIcon::for_description("light rain and cloud"), WeatherIcon::Cloud);
        assert_eq!(WeatherIcon::for_description("overcast clouds"), WeatherIcon::Cloud);
        assert_eq!(WeatherIcon::for_description("moderate rain"), WeatherIcon::Rain);
        assert_eq!(WeatherIcon::for_description("rain and snow"), WeatherIcon::Rain);
        assert_eq!(WeatherIcon::for_description("light snow"), WeatherIcon::Snow);
        assert_eq!(WeatherIcon::for_description("clear sky"), WeatherIcon::Sun);
        assert_eq!(WeatherIcon::for_description("windy"), WeatherIcon::Wind);
        assert_eq!(WeatherIcon::for_description("mist"), WeatherIcon::Cloud);
        assert_eq!(WeatherIcon::for_description(""), WeatherIcon::Cloud);
    }

    #[test]
    fn icon_match_ignores_case() {
        assert_eq!(WeatherIcon::for_description("Clear Sky"), WeatherIcon::Sun);
    }

    #[test]
    fn temperature_rounding() {
        assert_eq!(display_temperature(14.6), "15°C");
        assert_eq!(display_temperature(14.4), "14°C");
        assert_eq!(display_temperature(15.3), "15°C");
        assert_eq!(display_temperature(14.5), "15°C");
        assert_eq!(display_temperature(-2.5), "-2°C");
        assert_eq!(display_temperature(-2.6), "-3°C");
    }

    #[test]
    fn visibility_in_km() {
        assert_eq!(visibility_km(10_000), 10.0);
        assert_eq!(format!("{} km", visibility_km(10_000)), "10 km");
        assert_eq!(visibility_km(9_500), 9.5);
    }

    #[test]
    fn time_formats() {
        assert_eq!(format_time(1_714_539_840, ClockFormat::TwentyFourHour, &Utc), "05:04");
        assert_eq!(format_time(1_714_539_840, ClockFormat::TwelveHour, &Utc), "05:04 AM");
        assert_eq!(format_time(1_714_592_520, ClockFormat::TwelveHour, &Utc), "07:42 PM");

        let cest = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(format_time(1_714_539_840, ClockFormat::TwentyFourHour, &cest), "07:04");
    }

    #[test]
    fn clock_format_parsing() {
        assert_eq!("24h".parse::<ClockFormat>(), Ok(ClockFormat::TwentyFourHour));
        assert_eq!("12".parse::<ClockFormat>(), Ok(ClockFormat::TwelveHour));
        assert!("sundial".parse::<ClockFormat>().is_err());
    }

    #[test]
    fn chart_keeps_every_point_in_order() {
        let chart = chart_series(&forecast(40), ClockFormat::TwentyFourHour, &Utc);

        assert_eq!(chart.len(), 40);
        assert!(chart.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(chart[0].label, "12:00");
        assert_eq!(chart[0].tooltip, "5/1/2024 12:00");
        assert_eq!(chart[1].label, "15:00");
        assert_eq!(chart[39].temperature, 49.0);
    }

    #[test]
    fn summary_takes_first_six() {
        let summary = forecast_summary(&forecast(40), &Utc);

        assert_eq!(summary.len(), SUMMARY_POINTS);
        assert_eq!(summary[0].date, "5/1/2024");
        assert_eq!(summary[5].temperature, 15.0);

        assert_eq!(forecast_summary(&forecast(3), &Utc).len(), 3);
    }

    #[test]
    fn conditions_view_strings() {
        let view = ConditionsView::new(&london(), ClockFormat::TwentyFourHour, &Utc);

        assert_eq!(view.location, "London, GB");
        assert_eq!(view.icon, WeatherIcon::Cloud);
        assert_eq!(view.temperature, "15°C");
        assert_eq!(view.feels_like, "14°C");
        assert_eq!(view.min, "13°C");
        assert_eq!(view.max, "16°C");
        assert_eq!(view.wind_speed, "4.12 m/s");
        assert_eq!(view.wind_direction, "250°");
        assert_eq!(view.wind_gust, "7.2 m/s");
        assert_eq!(view.sea_level, "N/A hPa");
        assert_eq!(view.visibility, "10 km");
        assert_eq!(view.cloud_cover, "75%");
        assert_eq!(view.sunrise, "05:04");
        assert_eq!(view.sunset, "19:42");
    }

    #[test]
    fn missing_visibility_is_not_available() {
        let current = CurrentConditions { visibility: None, ..london() };
        let view = ConditionsView::new(&current, ClockFormat::TwentyFourHour, &Utc);

        assert_eq!(view.visibility, "N/A km");
    }

    #[test]
    fn render_panels() {
        let empty = render(&DashboardState::default(), ClockFormat::TwelveHour, &Utc);
        assert_eq!(empty.panel, Panel::Empty);
        assert_eq!(empty.submit_label, "Search");
        assert!(empty.submit_enabled);

        let loading = DashboardState::default()
            .apply(DashboardEvent::CurrentRequested { generation: 1 });
        let view = render(&loading, ClockFormat::TwelveHour, &Utc);
        assert_eq!(view.panel, Panel::Loading);
        assert_eq!(view.submit_label, "Loading...");
        assert!(!view.submit_enabled);
    }

    #[test]
    fn render_tolerates_missing_forecast_or_current() {
        let forecast_only = DashboardState {
            forecast: Some(forecast(8)),
            ..DashboardState::default()
        };
        assert_eq!(render(&forecast_only, ClockFormat::TwelveHour, &Utc).panel, Panel::Empty);

        let current_only = DashboardState { current: Some(london()), ..DashboardState::default() };
        let Panel::Ready(ready) = render(&current_only, ClockFormat::TwelveHour, &Utc).panel else {
            panic!("expected ready panel");
        };
        assert!(ready.chart.is_none());
        assert!(ready.summary.is_none());
        assert_eq!(ready.map.popup, "London, GB");
        assert_eq!(ready.map.zoom, 13);
        assert_eq!((ready.map.lat, ready.map.lon), (51.5085, -0.1257));
    }
}
