use serde::{Deserialize, Deserializer, Serialize};

/// Geographic position as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A single weather condition descriptor (e.g. "light rain").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub main: String,
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Temperature block of a current-conditions body. All values in Celsius
/// (`units=metric`), pressures in hPa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub pressure: u32,
    #[serde(default)]
    pub sea_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Meters per second.
    pub speed: f64,
    /// Direction in degrees.
    #[serde(default)]
    pub deg: u16,
    #[serde(default)]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    /// Cloud cover, percent.
    pub all: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunCycle {
    #[serde(default)]
    pub country: String,
    pub sunrise: i64,
    pub sunset: i64,
}

/// Snapshot of the weather for one city at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub name: String,
    pub coord: Coordinates,
    pub main: MainReadings,
    pub wind: Wind,
    /// Meters. Some stations do not report it.
    #[serde(default)]
    pub visibility: Option<u32>,
    pub clouds: Clouds,
    pub weather: Vec<Condition>,
    pub sys: SunCycle,
    #[serde(default)]
    pub dt: i64,
    /// Shift from UTC in seconds.
    #[serde(default)]
    pub timezone: i32,
}

impl CurrentConditions {
    /// The first condition descriptor; the API always sends at least one.
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn description(&self) -> &str {
        self.primary_condition()
            .map(|c| c.description.as_str())
            .unwrap_or("unknown")
    }

    /// "London, GB"
    pub fn location_label(&self) -> String {
        if self.sys.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.sys.country)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointReadings {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub humidity: Option<u8>,
}

/// One 3-hour step of the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub dt: i64,
    /// "2024-05-01 12:00:00", UTC.
    pub dt_txt: String,
    pub main: PointReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    pub name: String,
    #[serde(default)]
    pub country: String,
}

/// Ordered forecast points for one city, kept in the order the API sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    #[serde(default)]
    pub city: Option<ForecastCity>,
    pub list: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// The status envelope every API body carries. Success bodies send `cod` as a
/// number and error bodies send it as a string; both end up as a string here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiStatus {
    #[serde(default, deserialize_with = "deserialize_cod")]
    pub cod: Option<String>,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

impl ApiStatus {
    pub fn is(&self, code: &str) -> bool {
        self.cod.as_deref() == Some(code)
    }

    /// `message` is a string on errors and a number (0) on forecast success.
    pub fn message_text(&self) -> Option<String> {
        match self.message.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

/// Numeric and string codes compare equal after this, so `{"cod": 404}` is
/// treated like `{"cod": "404"}`. That is looser than a string-only check; the
/// live API only sends the string form for errors.
fn deserialize_cod<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cod {
        Num(i64),
        Str(String),
    }

    Ok(Option::<Cod>::deserialize(deserializer)?.map(|cod| match cod {
        Cod::Num(n) => n.to_string(),
        Cod::Str(s) => s,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cod_accepts_number_and_string() {
        let num: ApiStatus = serde_json::from_str(r#"{"cod":200}"#).unwrap();
        let text: ApiStatus =
            serde_json::from_str(r#"{"cod":"404","message":"city not found"}"#).unwrap();

        assert!(num.is("200"));
        assert!(text.is("404"));
        assert_eq!(text.message_text().as_deref(), Some("city not found"));
    }

    #[test]
    fn numeric_and_string_not_found_match_alike() {
        let num: ApiStatus = serde_json::from_str(r#"{"cod":404}"#).unwrap();
        let text: ApiStatus = serde_json::from_str(r#"{"cod":"404"}"#).unwrap();

        assert!(num.is("404"));
        assert!(text.is("404"));
        assert_eq!(num.cod, text.cod);
    }

    #[test]
    fn numeric_message_is_ignored() {
        let status: ApiStatus = serde_json::from_str(r#"{"cod":"200","message":0}"#).unwrap();
        assert_eq!(status.message_text(), None);
    }

    #[test]
    fn missing_cod_is_none() {
        let status: ApiStatus = serde_json::from_str("{}").unwrap();
        assert_eq!(status.cod, None);
    }

    #[test]
    fn current_conditions_tolerate_missing_optionals() {
        let body = serde_json::json!({
            "name": "Oslo",
            "coord": {"lat": 59.91, "lon": 10.75},
            "main": {
                "temp": -3.2, "feels_like": -7.0, "temp_min": -4.0, "temp_max": -2.1,
                "humidity": 80, "pressure": 1002
            },
            "wind": {"speed": 4.1},
            "clouds": {"all": 75},
            "weather": [{"description": "light snow"}],
            "sys": {"sunrise": 1700000000, "sunset": 1700030000}
        });

        let current: CurrentConditions = serde_json::from_value(body).unwrap();
        assert_eq!(current.main.sea_level, None);
        assert_eq!(current.wind.gust, None);
        assert_eq!(current.visibility, None);
        assert_eq!(current.location_label(), "Oslo");
        assert_eq!(current.description(), "light snow");
    }
}
