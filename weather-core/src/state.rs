//! Dashboard state and the pure transitions over it.
//!
//! Every change to the dashboard goes through [`DashboardState::apply`], so the
//! ordering of overlapping fetches is visible in the event sequence rather than
//! hidden in callbacks. Requests are stamped with a per-kind generation number;
//! [`StalePolicy`] decides what happens when an older response lands after a
//! newer request was issued.

use serde::{Deserialize, Serialize};

use crate::model::{CurrentConditions, ForecastSeries};

/// What to do with a response that belongs to an outdated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Whatever response arrives last overwrites the state, even if it answers
    /// an earlier query.
    #[default]
    LastWriteWins,
    /// Responses older than the latest issued request of the same kind are
    /// dropped.
    DiscardStale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchKind {
    Current,
    Forecast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Info,
}

/// Transient message for the user. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

/// Latest generation issued per fetch kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Generations {
    pub current: u64,
    pub forecast: u64,
}

impl Generations {
    pub fn get(&self, kind: FetchKind) -> u64 {
        match kind {
            FetchKind::Current => self.current,
            FetchKind::Forecast => self.forecast,
        }
    }

    fn bump_to(&mut self, kind: FetchKind, generation: u64) {
        let slot = match kind {
            FetchKind::Current => &mut self.current,
            FetchKind::Forecast => &mut self.forecast,
        };
        *slot = (*slot).max(generation);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    QueryChanged { query: String },
    /// Submit with a blank query.
    SubmitRejected,
    CurrentRequested { generation: u64 },
    CurrentLoaded { generation: u64, conditions: CurrentConditions },
    CurrentFailed { generation: u64, message: String },
    /// The request future was dropped before it resolved.
    CurrentAbandoned { generation: u64 },
    ForecastRequested { generation: u64 },
    ForecastLoaded { generation: u64, series: ForecastSeries },
    ForecastFailed { generation: u64, message: String },
    NotificationDismissed { id: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardState {
    pub query: String,
    /// True while a current-conditions request is outstanding. The forecast
    /// never touches it.
    pub loading: bool,
    pub current: Option<CurrentConditions>,
    pub forecast: Option<ForecastSeries>,
    pub notifications: Vec<Notification>,
    pub stale_policy: StalePolicy,
    pub issued: Generations,
    pub(crate) next_notification_id: u64,
}

impl DashboardState {
    pub fn new(stale_policy: StalePolicy) -> Self {
        Self { stale_policy, ..Self::default() }
    }

    /// The query with surrounding whitespace removed; empty means "no query".
    pub fn trimmed_query(&self) -> &str {
        self.query.trim()
    }

    /// Whether a response with this generation should be ignored.
    pub fn is_stale(&self, kind: FetchKind, generation: u64) -> bool {
        self.stale_policy == StalePolicy::DiscardStale && generation < self.issued.get(kind)
    }

    pub fn apply(mut self, event: DashboardEvent) -> Self {
        match event {
            DashboardEvent::QueryChanged { query } => {
                self.query = query;
            }
            DashboardEvent::SubmitRejected => {
                self.push_error(crate::error::EMPTY_QUERY_MESSAGE.to_string());
            }
            DashboardEvent::CurrentRequested { generation } => {
                self.issued.bump_to(FetchKind::Current, generation);
                self.loading = true;
            }
            DashboardEvent::CurrentLoaded { generation, conditions } => {
                if self.settle_current(generation) {
                    self.current = Some(conditions);
                }
            }
            DashboardEvent::CurrentFailed { generation, message } => {
                if self.settle_current(generation) {
                    self.push_error(message);
                }
            }
            DashboardEvent::CurrentAbandoned { generation } => {
                self.settle_current(generation);
            }
            DashboardEvent::ForecastRequested { generation } => {
                self.issued.bump_to(FetchKind::Forecast, generation);
            }
            DashboardEvent::ForecastLoaded { generation, series } => {
                if !self.is_stale(FetchKind::Forecast, generation) {
                    self.forecast = Some(series);
                }
            }
            DashboardEvent::ForecastFailed { generation, message } => {
                if !self.is_stale(FetchKind::Forecast, generation) {
                    self.push_error(message);
                }
            }
            DashboardEvent::NotificationDismissed { id } => {
                self.notifications.retain(|n| n.id != id);
            }
        }
        self
    }

    /// Clears the loading flag for a finished current-conditions request and
    /// reports whether its outcome should be applied. A stale request under
    /// `DiscardStale` leaves the flag to the newer request still in flight.
    fn settle_current(&mut self, generation: u64) -> bool {
        if self.is_stale(FetchKind::Current, generation) {
            return false;
        }
        self.loading = false;
        true
    }

    fn push_error(&mut self, description: String) {
        self.next_notification_id += 1;
        self.notifications.push(Notification {
            id: self.next_notification_id,
            title: "Error".to_string(),
            description,
            severity: Severity::Error,
        });
    }

    /// Remove and return every pending notification.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}
