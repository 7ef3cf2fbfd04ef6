//! Core library for the `weather` dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the [`WeatherApi`] trait
//! - Dashboard state, its pure transitions and the controller driving them
//! - View mapping from state to display-ready values
//!
//! It is used by `weather-cli`, but any other front end can drive the same
//! [`WeatherController`] and render [`view::DashboardView`] its own way.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod state;
pub mod view;

pub use client::{OpenWeatherClient, WeatherApi};
pub use config::Config;
pub use controller::WeatherController;
pub use error::WeatherError;
pub use model::{CurrentConditions, ForecastPoint, ForecastSeries};
pub use state::{DashboardEvent, DashboardState, Notification, Severity, StalePolicy};
pub use view::{ClockFormat, DashboardView, WeatherIcon};
