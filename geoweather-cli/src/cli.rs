use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use geoweather_core::{
    Config, Coordinates, LocationSource, PermissionSetting, Units, WeatherWorkflow,
    geo::locator_from_config, provider::provider_from_config,
};
use inquire::{CustomType, Password, PasswordDisplayMode, Select};
use std::{fmt, process::ExitCode, sync::Arc};

use crate::{console::ConsoleHost, render::ConsolePresenter};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "geoweather", version, about = "Current weather at your location")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, units and location source.
    Configure,

    /// Show the current weather where you are.
    Show {
        /// Latitude to use instead of the configured location source.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude to use instead of the configured location source.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Unit system, "metric" or "imperial".
        #[arg(long)]
        units: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure => {
                tokio::task::spawn_blocking(configure)
                    .await
                    .context("Configuration prompt failed")??;
                Ok(ExitCode::SUCCESS)
            }
            Command::Show { lat, lon, units } => {
                let mut config = Config::load()?;
                apply_overrides(&mut config, lat.zip(lon), units.as_deref())?;
                show(config).await
            }
        }
    }
}

/// Per-invocation overrides; nothing here is saved.
fn apply_overrides(
    config: &mut Config,
    position: Option<(f64, f64)>,
    units: Option<&str>,
) -> anyhow::Result<()> {
    if let Some((lat, lon)) = position {
        config.location = LocationSource::fixed(Coordinates::new(lat, lon));
        // Coordinates given on the command line need no location access.
        config.permission = PermissionSetting::Granted;
    }
    if let Some(units) = units {
        config.units = Units::try_from(units)?;
    }
    Ok(())
}

async fn show(config: Config) -> anyhow::Result<ExitCode> {
    let api_key = config.api_key()?.to_string();
    let units = config.units;

    let workflow = WeatherWorkflow::new(
        Arc::new(ConsoleHost::new(config.clone())),
        Arc::from(locator_from_config(&config)),
        Arc::from(provider_from_config(&config)),
        Arc::new(ConsolePresenter::new(units)),
        units,
        api_key,
    );

    let report = workflow.run().await?;
    tracing::debug!(path = ?report.path, "Workflow finished");

    Ok(match report.outcome.failure() {
        None => ExitCode::SUCCESS,
        Some(_) => ExitCode::FAILURE,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceChoice {
    Ip,
    Fixed,
    Off,
}

impl fmt::Display for SourceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceChoice::Ip => "Network (IP address lookup)",
            SourceChoice::Fixed => "Fixed coordinates",
            SourceChoice::Off => "Off",
        })
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let prompt = if config.api_key().is_ok() {
        "OpenWeather API key (leave empty to keep the current one):"
    } else {
        "OpenWeather API key:"
    };
    let key = Password::new(prompt)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    if !key.trim().is_empty() {
        config.set_api_key(key);
    }
    config.api_key()?;

    config.units = Select::new("Units:", Units::all().to_vec()).prompt()?;

    let source = Select::new(
        "Location source:",
        vec![SourceChoice::Ip, SourceChoice::Fixed, SourceChoice::Off],
    )
    .prompt()?;

    config.location = match source {
        SourceChoice::Ip => LocationSource::Ip,
        SourceChoice::Off => LocationSource::Off,
        SourceChoice::Fixed => {
            let latitude = CustomType::<f64>::new("Latitude:")
                .with_error_message("Please enter a number, e.g. 37.7749")
                .prompt()?;
            let longitude = CustomType::<f64>::new("Longitude:")
                .with_error_message("Please enter a number, e.g. -122.4194")
                .prompt()?;
            fixed_source(latitude, longitude)?
        }
    };

    // Configuring counts as revisiting the permission decision.
    config.permission = PermissionSetting::Ask;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn fixed_source(latitude: f64, longitude: f64) -> anyhow::Result<LocationSource> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(anyhow!("Latitude must be between -90 and 90, got {latitude}"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(anyhow!("Longitude must be between -180 and 180, got {longitude}"));
    }
    Ok(LocationSource::fixed(Coordinates::new(latitude, longitude)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_negative_longitude() {
        let cli = Cli::try_parse_from([
            "geoweather",
            "show",
            "--lat",
            "37.7749",
            "--lon",
            "-122.4194",
        ])
        .unwrap();

        match cli.command {
            Command::Show { lat, lon, units } => {
                assert_eq!(lat, Some(37.7749));
                assert_eq!(lon, Some(-122.4194));
                assert_eq!(units, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["geoweather", "show", "--lat", "1.0"]).is_err());
    }

    #[test]
    fn overrides_pin_location_and_grant_access() {
        let mut cfg = Config {
            permission: PermissionSetting::Denied,
            ..Config::default()
        };

        apply_overrides(&mut cfg, Some((37.7749, -122.4194)), Some("imperial")).unwrap();

        assert_eq!(
            cfg.location,
            LocationSource::fixed(Coordinates::new(37.7749, -122.4194))
        );
        assert_eq!(cfg.permission, PermissionSetting::Granted);
        assert_eq!(cfg.units, Units::Imperial);
    }

    #[test]
    fn no_overrides_keep_config() {
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, None, None).unwrap();

        assert_eq!(cfg.location, LocationSource::Ip);
        assert_eq!(cfg.permission, PermissionSetting::Ask);
    }

    #[test]
    fn bad_units_override_errors() {
        let mut cfg = Config::default();
        assert!(apply_overrides(&mut cfg, None, Some("kelvin")).is_err());
    }

    #[test]
    fn fixed_source_checks_ranges() {
        assert!(fixed_source(91.0, 0.0).is_err());
        assert!(fixed_source(0.0, -181.0).is_err());
        assert_eq!(
            fixed_source(52.37, 4.89).unwrap(),
            LocationSource::fixed(Coordinates::new(52.37, 4.89))
        );
    }
}
