use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::{
    client::WeatherApi,
    error::{FORECAST_FALLBACK_MESSAGE, WEATHER_FALLBACK_MESSAGE, WeatherError},
    state::{DashboardEvent, DashboardState, FetchKind, Notification, StalePolicy},
};

/// Owns the dashboard state and mediates every call to the weather API.
///
/// Cloning is cheap; clones share the same state. Current-conditions and
/// forecast requests run independently and may overlap; nothing is cancelled
/// when the query changes.
#[derive(Debug)]
pub struct WeatherController<A> {
    api: Arc<A>,
    state: Arc<Mutex<DashboardState>>,
}

impl<A> Clone for WeatherController<A> {
    fn clone(&self) -> Self {
        Self { api: Arc::clone(&self.api), state: Arc::clone(&self.state) }
    }
}

impl<A: WeatherApi + 'static> WeatherController<A> {
    pub fn new(api: A, stale_policy: StalePolicy) -> Self {
        Self {
            api: Arc::new(api),
            state: Arc::new(Mutex::new(DashboardState::new(stale_policy))),
        }
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> DashboardState {
        self.lock().clone()
    }

    pub fn take_notifications(&self) -> Vec<Notification> {
        self.lock().drain_notifications()
    }

    pub fn dismiss(&self, id: u64) {
        self.dispatch(DashboardEvent::NotificationDismissed { id });
    }

    /// Replace the query text. A changed value starts exactly one forecast
    /// refresh in the background and returns its handle; an identical value
    /// does nothing.
    pub fn set_query(&self, text: impl Into<String>) -> Option<JoinHandle<()>> {
        let text = text.into();
        {
            let mut state = self.lock();
            if state.query == text {
                return None;
            }
            apply(&mut state, DashboardEvent::QueryChanged { query: text });
        }

        let this = self.clone();
        Some(tokio::spawn(async move {
            if let Err(err) = this.refresh_forecast().await {
                tracing::debug!(error = %err, "background forecast refresh failed");
            }
        }))
    }

    /// Fetch current conditions for the trimmed query.
    ///
    /// Failures are pushed as notifications and also returned. The loading
    /// flag is cleared on every exit, including when this future is dropped
    /// before completion.
    pub async fn submit_query(&self) -> Result<(), WeatherError> {
        let query = self.lock().trimmed_query().to_string();

        if query.is_empty() {
            self.dispatch(DashboardEvent::SubmitRejected);
            return Err(WeatherError::EmptyQuery);
        }

        let generation = self.begin(FetchKind::Current);
        let guard = LoadingGuard { controller: self, generation, armed: true };
        tracing::info!(city = %query, generation, "fetching current conditions");

        let result = self.api.current(&query).await;
        guard.disarm();

        match result {
            Ok(conditions) => {
                self.dispatch(DashboardEvent::CurrentLoaded { generation, conditions });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(city = %query, error = %err, "current conditions request failed");
                self.dispatch(DashboardEvent::CurrentFailed {
                    generation,
                    message: err.user_message(WEATHER_FALLBACK_MESSAGE),
                });
                Err(err)
            }
        }
    }

    /// Fetch the forecast for the trimmed query. A blank query is a silent
    /// no-op. Never touches the loading flag.
    pub async fn refresh_forecast(&self) -> Result<(), WeatherError> {
        let query = self.lock().trimmed_query().to_string();

        if query.is_empty() {
            return Ok(());
        }

        let generation = self.begin(FetchKind::Forecast);
        tracing::info!(city = %query, generation, "fetching forecast");

        match self.api.forecast(&query).await {
            Ok(series) => {
                tracing::debug!(points = series.len(), "forecast received");
                self.dispatch(DashboardEvent::ForecastLoaded { generation, series });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(city = %query, error = %err, "forecast request failed");
                self.dispatch(DashboardEvent::ForecastFailed {
                    generation,
                    message: err.user_message(FORECAST_FALLBACK_MESSAGE),
                });
                Err(err)
            }
        }
    }

    /// Issue the next generation for `kind` and record the request.
    fn begin(&self, kind: FetchKind) -> u64 {
        let mut state = self.lock();
        let generation = state.issued.get(kind) + 1;
        let event = match kind {
            FetchKind::Current => DashboardEvent::CurrentRequested { generation },
            FetchKind::Forecast => DashboardEvent::ForecastRequested { generation },
        };
        apply(&mut state, event);
        generation
    }

    fn dispatch(&self, event: DashboardEvent) {
        apply(&mut self.lock(), event);
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        // `apply` only stores a fully built state, so after a panic the lock
        // still holds the last committed one.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn apply(state: &mut DashboardState, event: DashboardEvent) {
    tracing::trace!(?event, "applying dashboard event");
    *state = state.clone().apply(event);
}

/// Clears the loading flag if a current-conditions request is dropped mid-flight.
struct LoadingGuard<'a, A: WeatherApi + 'static> {
    controller: &'a WeatherController<A>,
    generation: u64,
    armed: bool,
}

impl<A: WeatherApi + 'static> LoadingGuard<'_, A> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<A: WeatherApi + 'static> Drop for LoadingGuard<'_, A> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(generation = self.generation, "current conditions request abandoned");
            self.controller
                .dispatch(DashboardEvent::CurrentAbandoned { generation: self.generation });
        }
    }
}
