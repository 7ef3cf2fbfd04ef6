use anyhow::{Context, anyhow};
use chrono::Local;
use clap::{ArgAction, Args, Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text};
use weather_core::{
    ClockFormat, Config, OpenWeatherClient, StalePolicy, WeatherController, WeatherError,
    error::ErrorKind, view,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the stored configuration.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// OpenWeather API key (also read from OPENWEATHER_API_KEY).
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// API host, e.g. a local mock server.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Clock format for times: 12h or 24h.
    #[arg(long, global = true)]
    pub clock: Option<ClockFormat>,

    /// Ignore responses that arrive after a newer request was sent.
    #[arg(long, global = true)]
    pub discard_stale: bool,

    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and display preferences.
    Configure,

    /// Show current weather and forecast for a city.
    Show {
        /// City name; falls back to `default_city` from the config.
        city: Option<String>,

        /// Print the view model as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Prompt for cities repeatedly. Esc or Ctrl-C exits.
    Watch,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, json } => {
                let config = self.global.resolve()?;
                show(config, city, json).await
            }
            Command::Watch => {
                let config = self.global.resolve()?;
                watch(config).await
            }
        }
    }
}

impl GlobalArgs {
    /// Config file, then environment, then flags.
    fn resolve(&self) -> anyhow::Result<Config> {
        let mut config = Config::load()?.with_env();

        if let Some(key) = &self.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(url) = &self.base_url {
            config.base_url = Some(url.clone());
        }
        if let Some(clock) = self.clock {
            config.clock = clock;
        }
        if self.discard_stale {
            config.stale_policy = StalePolicy::DiscardStale;
        }

        Ok(config)
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("API key prompt aborted")?;
    if !api_key.trim().is_empty() {
        config.api_key = Some(api_key.trim().to_string());
    }

    let clock = Select::new("Time format:", vec!["12h", "24h"])
        .prompt()
        .context("Time format prompt aborted")?;
    config.clock = clock.parse().map_err(|e: String| anyhow!(e))?;

    let default_city = Text::new("Default city (optional):")
        .with_default(config.default_city.as_deref().unwrap_or_default())
        .prompt()
        .context("Default city prompt aborted")?;
    config.default_city = Some(default_city.trim().to_string()).filter(|c| !c.is_empty());

    config.save()?;
    let path = Config::config_file_path()?;
    tracing::info!(path = %path.display(), clock = ?config.clock, "configuration saved");
    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn controller(config: &Config) -> WeatherController<OpenWeatherClient> {
    WeatherController::new(OpenWeatherClient::from_config(config), config.stale_policy)
}

async fn show(config: Config, city: Option<String>, json: bool) -> anyhow::Result<()> {
    let city = city.or_else(|| config.default_city.clone()).unwrap_or_default();
    let controller = controller(&config);

    let outcome = search(&controller, city.clone()).await?;

    let view = view::render(&controller.snapshot(), config.clock, &Local);
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render::dashboard(&view));
        render::notifications(&controller.take_notifications());
    }

    outcome.map_err(|err| anyhow!(failure_summary(&err, &city)))
}

/// Exit message for a failed `show`, by error class.
fn failure_summary(err: &WeatherError, city: &str) -> String {
    match err.kind() {
        ErrorKind::Validation => {
            "No city given. Pass one or set `default_city` with `weather configure`.".to_string()
        }
        ErrorKind::NotFound => format!("No weather data: city '{}' not found", city.trim()),
        ErrorKind::Fetch => format!("No weather data: {err}"),
    }
}

async fn watch(config: Config) -> anyhow::Result<()> {
    let controller = controller(&config);

    loop {
        let input = match Text::new("City:").prompt() {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        search(&controller, input).await?;

        let view = view::render(&controller.snapshot(), config.clock, &Local);
        print!("{}", render::dashboard(&view));
        render::notifications(&controller.take_notifications());
    }

    Ok(())
}

/// Set the query, submit it, and wait for both fetches. The inner result is
/// the outcome of the current-conditions request.
async fn search(
    controller: &WeatherController<OpenWeatherClient>,
    city: String,
) -> anyhow::Result<Result<(), WeatherError>> {
    tracing::debug!(city = %city, "searching");
    let forecast = controller.set_query(city);
    let submitted = controller.submit_query().await;

    if let Some(handle) = forecast {
        handle.await.context("Forecast task failed")?;
    }

    match &submitted {
        Ok(()) => tracing::debug!("search complete"),
        Err(err) => {
            tracing::debug!(kind = ?err.kind(), "search finished without current conditions")
        }
    }

    Ok(submitted)
}
