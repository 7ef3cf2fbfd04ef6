//! Failures surfaced to the user as notifications.

use thiserror::Error;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a city name";
pub const WEATHER_FALLBACK_MESSAGE: &str = "Failed to fetch weather data";
pub const FORECAST_FALLBACK_MESSAGE: &str = "Failed to fetch forecast data";

#[derive(Error, Debug)]
pub enum WeatherError {
    /// Blank query, rejected before any request is made.
    #[error("Please enter a city name")]
    EmptyQuery,

    #[error("City not found")]
    CityNotFound,

    /// The API answered with a status code other than the expected one.
    #[error("{message}")]
    Api { code: Option<String>, message: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The three classes a user can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Fetch,
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyQuery => ErrorKind::Validation,
            Self::CityNotFound => ErrorKind::NotFound,
            Self::Api { .. } | Self::Transport(_) | Self::Parse(_) => ErrorKind::Fetch,
        }
    }

    /// Description shown in the notification. An API error with no message of
    /// its own falls back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api { message, .. } if message.trim().is_empty() => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages() {
        assert_eq!(
            WeatherError::EmptyQuery.user_message(WEATHER_FALLBACK_MESSAGE),
            "Please enter a city name"
        );
        assert_eq!(
            WeatherError::CityNotFound.user_message(WEATHER_FALLBACK_MESSAGE),
            "City not found"
        );

        let err = WeatherError::Api { code: Some("401".into()), message: "Invalid API key".into() };
        assert_eq!(err.user_message(WEATHER_FALLBACK_MESSAGE), "Invalid API key");

        let err = WeatherError::Api { code: None, message: String::new() };
        assert_eq!(err.user_message(FORECAST_FALLBACK_MESSAGE), "Failed to fetch forecast data");
    }

    #[test]
    fn kinds() {
        assert_eq!(WeatherError::EmptyQuery.kind(), ErrorKind::Validation);
        assert_eq!(WeatherError::CityNotFound.kind(), ErrorKind::NotFound);

        let parse = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        assert_eq!(WeatherError::from(parse).kind(), ErrorKind::Fetch);
    }
}
