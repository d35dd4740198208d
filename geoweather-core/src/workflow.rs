//! Location → weather → presentation, as an explicit state machine.
//!
//! ```text
//! Idle ─► AwaitingPermission ─► AwaitingLocation ─► AwaitingWeather ─► Done
//!  │            │    │                 │    │               │    │
//!  ▼            ▼    ▼                 ▼    ▼               ▼    ▼
//! LocationDisabled  PermissionDenied  LocationUnavailable  NetworkFailure
//!                   PermissionRationale                    FetchFailed
//! ```
//!
//! Every state besides the four in the top row is terminal. The busy
//! indicator is held for the whole run and released on every exit.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{
    FetchError, FetchFailure, LocationError, Units, WeatherQuery, WeatherResult, WorkflowError,
    geo::{GeoProvider, Precision},
    host::{Failure, HostPlatform, Permission, Presenter},
    provider::WeatherProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    AwaitingPermission,
    AwaitingLocation,
    AwaitingWeather,
    Done,
    LocationDisabledTerminal,
    PermissionDeniedTerminal,
    PermissionRationaleTerminal,
    LocationUnavailableTerminal,
    NetworkFailureTerminal,
    FetchFailedTerminal,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            WorkflowState::Idle
                | WorkflowState::AwaitingPermission
                | WorkflowState::AwaitingLocation
                | WorkflowState::AwaitingWeather
        )
    }

    pub fn can_transition_to(&self, next: WorkflowState) -> bool {
        use WorkflowState::*;

        matches!(
            (*self, next),
            (Idle, AwaitingPermission | LocationDisabledTerminal)
                | (
                    AwaitingPermission,
                    AwaitingLocation | PermissionDeniedTerminal | PermissionRationaleTerminal
                )
                | (
                    AwaitingLocation,
                    AwaitingWeather | LocationUnavailableTerminal | PermissionDeniedTerminal
                )
                | (
                    AwaitingWeather,
                    Done | NetworkFailureTerminal | FetchFailedTerminal
                )
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    Done(WeatherResult),
    LocationDisabled,
    PermissionDenied,
    PermissionRationale,
    LocationUnavailable(LocationError),
    NetworkUnavailable,
    FetchFailed(FetchError),
}

impl Outcome {
    pub fn state(&self) -> WorkflowState {
        match self {
            Outcome::Done(_) => WorkflowState::Done,
            Outcome::LocationDisabled => WorkflowState::LocationDisabledTerminal,
            Outcome::PermissionDenied => WorkflowState::PermissionDeniedTerminal,
            Outcome::PermissionRationale => WorkflowState::PermissionRationaleTerminal,
            Outcome::LocationUnavailable(_) => WorkflowState::LocationUnavailableTerminal,
            Outcome::NetworkUnavailable => WorkflowState::NetworkFailureTerminal,
            Outcome::FetchFailed(_) => WorkflowState::FetchFailedTerminal,
        }
    }

    /// What the user is told; `None` on success.
    pub fn failure(&self) -> Option<Failure> {
        match self {
            Outcome::Done(_) => None,
            Outcome::LocationDisabled => Some(Failure::LocationDisabled),
            Outcome::PermissionDenied => Some(Failure::PermissionDenied),
            Outcome::PermissionRationale => Some(Failure::PermissionRationale),
            Outcome::LocationUnavailable(_) => Some(Failure::LocationUnavailable),
            Outcome::NetworkUnavailable => Some(Failure::NetworkUnavailable),
            Outcome::FetchFailed(err) => Some(err.classify().into()),
        }
    }

    pub fn weather(&self) -> Option<&WeatherResult> {
        match self {
            Outcome::Done(weather) => Some(weather),
            _ => None,
        }
    }
}

/// Result of one run: the outcome plus every state visited, starting at `Idle`.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: Outcome,
    pub path: Vec<WorkflowState>,
}

impl RunReport {
    pub fn state(&self) -> WorkflowState {
        self.path.last().copied().unwrap_or(WorkflowState::Idle)
    }
}

struct Transitions {
    path: Vec<WorkflowState>,
}

impl Transitions {
    fn new() -> Self {
        Self {
            path: vec![WorkflowState::Idle],
        }
    }

    fn current(&self) -> WorkflowState {
        self.path.last().copied().unwrap_or(WorkflowState::Idle)
    }

    fn advance(&mut self, next: WorkflowState) {
        let from = self.current();
        debug_assert!(
            from.can_transition_to(next),
            "illegal workflow transition {from} -> {next}"
        );
        tracing::debug!(%from, to = %next, "Workflow transition");
        self.path.push(next);
    }
}

/// Clears the in-flight flag when the run ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, WorkflowError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WorkflowError::AlreadyRunning)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Busy indicator scoped to one run: shown on creation, hidden on drop.
pub struct BusyIndicator<'a> {
    presenter: &'a dyn Presenter,
}

impl<'a> BusyIndicator<'a> {
    pub fn show(presenter: &'a dyn Presenter) -> Self {
        presenter.show_busy();
        Self { presenter }
    }
}

impl Drop for BusyIndicator<'_> {
    fn drop(&mut self) {
        self.presenter.hide_busy();
    }
}

/// One screen's worth of "weather where I am".
pub struct WeatherWorkflow {
    host: Arc<dyn HostPlatform>,
    geo: Arc<dyn GeoProvider>,
    weather: Arc<dyn WeatherProvider>,
    presenter: Arc<dyn Presenter>,
    units: Units,
    api_key: String,
    in_flight: AtomicBool,
}

impl WeatherWorkflow {
    pub fn new(
        host: Arc<dyn HostPlatform>,
        geo: Arc<dyn GeoProvider>,
        weather: Arc<dyn WeatherProvider>,
        presenter: Arc<dyn Presenter>,
        units: Units,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            host,
            geo,
            weather,
            presenter,
            units,
            api_key: api_key.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run the workflow once, from `Idle` to a terminal state.
    ///
    /// Fails only when another run is already in flight; every other failure
    /// is reported through the presenter and the returned [`RunReport`].
    pub async fn run(&self) -> Result<RunReport, WorkflowError> {
        let _in_flight = InFlight::acquire(&self.in_flight)?;
        let mut transitions = Transitions::new();

        let busy = BusyIndicator::show(self.presenter.as_ref());
        let outcome = self.drive(&mut transitions).await;
        drop(busy);

        self.present(&outcome);

        Ok(RunReport {
            outcome,
            path: transitions.path,
        })
    }

    async fn drive(&self, transitions: &mut Transitions) -> Outcome {
        if !self.host.is_location_enabled() {
            transitions.advance(WorkflowState::LocationDisabledTerminal);
            return Outcome::LocationDisabled;
        }

        transitions.advance(WorkflowState::AwaitingPermission);
        let report = self
            .host
            .request_permissions(Permission::location())
            .await;

        if report.any_permanently_denied() {
            transitions.advance(WorkflowState::PermissionDeniedTerminal);
            return Outcome::PermissionDenied;
        }
        if !report.all_granted() {
            transitions.advance(WorkflowState::PermissionRationaleTerminal);
            return Outcome::PermissionRationale;
        }

        transitions.advance(WorkflowState::AwaitingLocation);
        let coordinates = match self.geo.current_position(Precision::HighAccuracy).await {
            Ok(coordinates) => coordinates,
            Err(LocationError::PermissionDenied) => {
                transitions.advance(WorkflowState::PermissionDeniedTerminal);
                return Outcome::PermissionDenied;
            }
            Err(err) => {
                tracing::warn!(error = %err, "No position fix");
                transitions.advance(WorkflowState::LocationUnavailableTerminal);
                return Outcome::LocationUnavailable(err);
            }
        };

        transitions.advance(WorkflowState::AwaitingWeather);
        if !self.host.is_network_available().await {
            transitions.advance(WorkflowState::NetworkFailureTerminal);
            return Outcome::NetworkUnavailable;
        }

        let query = WeatherQuery {
            coordinates,
            units: self.units,
            api_key: self.api_key.clone(),
        };

        match self.weather.current_weather(&query).await {
            Ok(weather) => {
                transitions.advance(WorkflowState::Done);
                Outcome::Done(weather)
            }
            Err(err) => {
                match err.classify() {
                    FetchFailure::BadRequest => {
                        tracing::error!(error = %err, "Weather request was malformed")
                    }
                    FetchFailure::NotFound => {
                        tracing::error!(error = %err, "No weather data for location")
                    }
                    FetchFailure::Generic => {
                        tracing::error!(error = %err, "Weather request failed")
                    }
                }
                transitions.advance(WorkflowState::FetchFailedTerminal);
                Outcome::FetchFailed(err)
            }
        }
    }

    fn present(&self, outcome: &Outcome) {
        if let Some(weather) = outcome.weather() {
            tracing::info!(
                location = %weather.location_name,
                country = %weather.country_code,
                "Weather loaded"
            );
            self.presenter.render(weather);
            return;
        }

        if let Some(failure) = outcome.failure() {
            tracing::info!(state = %outcome.state(), ?failure, "Workflow ended without weather");
            self.presenter.render_error(failure);
            if let Some(screen) = failure.settings_screen() {
                self.presenter.open_settings(screen);
            }
        }
    }
}
