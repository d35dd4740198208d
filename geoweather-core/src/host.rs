//! Seams between the workflow and whatever hosts it (terminal, GUI, tests).

use async_trait::async_trait;

use crate::{FetchFailure, WeatherResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    FineLocation,
    CoarseLocation,
}

impl Permission {
    pub const fn location() -> &'static [Permission] {
        &[Permission::FineLocation, Permission::CoarseLocation]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Denied and the host will not ask again.
    PermanentlyDenied,
}

/// Outcome of one permission request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionReport {
    statuses: Vec<(Permission, PermissionStatus)>,
}

impl PermissionReport {
    pub fn new(statuses: Vec<(Permission, PermissionStatus)>) -> Self {
        Self { statuses }
    }

    /// Every permission in `permissions` gets the same answer.
    pub fn uniform(permissions: &[Permission], status: PermissionStatus) -> Self {
        Self::new(permissions.iter().map(|p| (*p, status)).collect())
    }

    pub fn status(&self, permission: Permission) -> Option<PermissionStatus> {
        self.statuses
            .iter()
            .find(|(p, _)| *p == permission)
            .map(|(_, s)| *s)
    }

    /// False for an empty report.
    pub fn all_granted(&self) -> bool {
        !self.statuses.is_empty()
            && self
                .statuses
                .iter()
                .all(|(_, s)| *s == PermissionStatus::Granted)
    }

    pub fn any_permanently_denied(&self) -> bool {
        self.statuses
            .iter()
            .any(|(_, s)| *s == PermissionStatus::PermanentlyDenied)
    }
}

/// Host location, permission and connectivity services.
#[async_trait]
pub trait HostPlatform: Send + Sync {
    /// Whether any location source (satellite or network based) is turned on.
    fn is_location_enabled(&self) -> bool;

    async fn request_permissions(&self, permissions: &[Permission]) -> PermissionReport;

    async fn is_network_available(&self) -> bool;
}

/// Whether the host part of `url` resolves right now.
///
/// Cheap stand-in for an OS connectivity check: no DNS usually means no
/// network.
pub async fn dns_reachable(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        tracing::warn!(%url, "Cannot probe connectivity for invalid URL");
        return false;
    };
    let (Some(host), Some(port)) = (parsed.host_str(), parsed.port_or_known_default()) else {
        return false;
    };

    match tokio::net::lookup_host((host, port)).await {
        Ok(mut addrs) => addrs.next().is_some(),
        Err(e) => {
            tracing::debug!(%host, error = %e, "Connectivity probe failed");
            false
        }
    }
}

/// System settings screens a failure can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsScreen {
    LocationSource,
    AppPermissions,
}

/// User-facing reason a run ended without weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    LocationDisabled,
    PermissionDenied,
    /// Denied this time; explain why location is needed.
    PermissionRationale,
    LocationUnavailable,
    NetworkUnavailable,
    BadRequest,
    NotFound,
    Generic,
}

impl Failure {
    pub fn settings_screen(&self) -> Option<SettingsScreen> {
        match self {
            Failure::LocationDisabled => Some(SettingsScreen::LocationSource),
            Failure::PermissionDenied | Failure::PermissionRationale => {
                Some(SettingsScreen::AppPermissions)
            }
            _ => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Failure::LocationDisabled => "Your location provider is turned off.",
            Failure::PermissionDenied => {
                "You have denied location permission. Please enable it, as it is required for this app to work."
            }
            Failure::PermissionRationale => {
                "Location permission is required to show the weather where you are. It can be enabled in the settings."
            }
            Failure::LocationUnavailable => "Could not determine your current location.",
            Failure::NetworkUnavailable => "No internet connection available.",
            Failure::BadRequest => "The weather service rejected the request.",
            Failure::NotFound => "No weather data found for your location.",
            Failure::Generic => "Could not load the weather. Please try again later.",
        }
    }
}

impl From<FetchFailure> for Failure {
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::BadRequest => Failure::BadRequest,
            FetchFailure::NotFound => Failure::NotFound,
            FetchFailure::Generic => Failure::Generic,
        }
    }
}

/// Presentation sink for a workflow run.
///
/// Methods are synchronous so the busy indicator can be released from `Drop`.
pub trait Presenter: Send + Sync {
    fn show_busy(&self);
    fn hide_busy(&self);
    fn render(&self, weather: &WeatherResult);
    fn render_error(&self, failure: Failure);
    fn open_settings(&self, screen: SettingsScreen);
}
