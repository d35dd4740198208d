use async_trait::async_trait;
use geoweather_core::{
    Config, HostPlatform, Permission, PermissionReport, PermissionSetting, PermissionStatus,
    host::dns_reachable,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PermissionChoice {
    Allow,
    NotNow,
    Never,
}

impl PermissionChoice {
    const ALL: [PermissionChoice; 3] = [
        PermissionChoice::Allow,
        PermissionChoice::NotNow,
        PermissionChoice::Never,
    ];

    fn status(self) -> PermissionStatus {
        match self {
            PermissionChoice::Allow => PermissionStatus::Granted,
            PermissionChoice::NotNow => PermissionStatus::Denied,
            PermissionChoice::Never => PermissionStatus::PermanentlyDenied,
        }
    }

    /// What to remember for next time, if anything.
    fn remembered(self) -> Option<PermissionSetting> {
        match self {
            PermissionChoice::Allow => Some(PermissionSetting::Granted),
            PermissionChoice::NotNow => None,
            PermissionChoice::Never => Some(PermissionSetting::Denied),
        }
    }
}

impl fmt::Display for PermissionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PermissionChoice::Allow => "Allow",
            PermissionChoice::NotNow => "Not now",
            PermissionChoice::Never => "Never (don't ask again)",
        })
    }
}

/// Terminal stand-in for the platform's location, permission and
/// connectivity services.
#[derive(Debug)]
pub struct ConsoleHost {
    config: Config,
}

impl ConsoleHost {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    async fn prompt(&self) -> PermissionStatus {
        let answer = tokio::task::spawn_blocking(|| {
            inquire::Select::new(
                "Allow geoweather to use your location?",
                PermissionChoice::ALL.to_vec(),
            )
            .prompt()
        })
        .await;

        let choice = match answer {
            Ok(Ok(choice)) => choice,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Permission prompt unavailable, treating as denied");
                return PermissionStatus::Denied;
            }
            Err(e) => {
                tracing::error!(error = %e, "Permission prompt task failed");
                return PermissionStatus::Denied;
            }
        };

        if let Some(setting) = choice.remembered() {
            if let Err(e) = remember_permission(setting) {
                tracing::warn!(error = %e, "Could not store permission decision");
            }
        }

        choice.status()
    }
}

fn remember_permission(setting: PermissionSetting) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    config.permission = setting;
    config.save()
}

#[async_trait]
impl HostPlatform for ConsoleHost {
    fn is_location_enabled(&self) -> bool {
        self.config.location.is_enabled()
    }

    async fn request_permissions(&self, permissions: &[Permission]) -> PermissionReport {
        let status = match self.config.permission {
            PermissionSetting::Granted => PermissionStatus::Granted,
            PermissionSetting::Denied => PermissionStatus::PermanentlyDenied,
            PermissionSetting::Ask => self.prompt().await,
        };

        tracing::debug!(?status, "Location permission");
        PermissionReport::uniform(permissions, status)
    }

    async fn is_network_available(&self) -> bool {
        dns_reachable(self.config.base_url()).await
    }
}
