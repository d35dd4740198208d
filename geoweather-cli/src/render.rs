use chrono::{DateTime, Local, TimeZone, Utc};
use geoweather_core::{Failure, Presenter, SettingsScreen, Units, WeatherResult};
use std::io::{IsTerminal, Write};

/// Icon shown next to the headline condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Sunny,
    Cloud,
    Rain,
    Storm,
    Snowflake,
}

impl Icon {
    /// Map an OpenWeather icon code (e.g. `01d`) to an icon.
    ///
    /// Unknown or missing codes fall back to [`Icon::Cloud`].
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("01d") => Icon::Sunny,
            Some("02d" | "03d" | "04d" | "04n" | "01n" | "02n" | "03n" | "10n") => Icon::Cloud,
            Some("10d" | "11n") => Icon::Rain,
            Some("11d") => Icon::Storm,
            Some("13d" | "13n") => Icon::Snowflake,
            _ => Icon::Cloud,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Icon::Sunny => "☀",
            Icon::Cloud => "☁",
            Icon::Rain => "🌧",
            Icon::Storm => "⛈",
            Icon::Snowflake => "❄",
        }
    }
}

/// `HH:mm` in `tz`; a missing instant renders as `--:--`.
pub fn format_clock<Tz: TimeZone>(instant: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant
        .map(|utc| utc.with_timezone(tz).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

pub fn format_weather<Tz: TimeZone>(weather: &WeatherResult, units: Units, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let condition = weather.primary_condition();
    let icon = Icon::from_code(condition.map(|c| c.icon_code.as_str()));
    let (main, description) = condition
        .map(|c| (c.main.as_str(), c.description.as_str()))
        .unwrap_or(("Unknown", "no conditions reported"));

    let temp = units.temperature_symbol();

    let mut place = weather.location_name.clone();
    if !weather.country_code.is_empty() {
        place.push_str(", ");
        place.push_str(&weather.country_code);
    }

    format!(
        "{glyph}  {main} ({description})\n\
         {place}\n\
         Temperature: {t}{temp} (min {min}{temp}, max {max}{temp})\n\
         Humidity:    {humidity} %\n\
         Wind:        {wind} {speed}\n\
         Sunrise:     {sunrise}\n\
         Sunset:      {sunset}",
        glyph = icon.glyph(),
        t = weather.temperature,
        min = weather.temperature_min,
        max = weather.temperature_max,
        humidity = weather.humidity_percent,
        wind = weather.wind_speed,
        speed = units.speed_symbol(),
        sunrise = format_clock(weather.sunrise(), tz),
        sunset = format_clock(weather.sunset(), tz),
    )
}

/// Prints results to stdout, progress and problems to stderr.
#[derive(Debug)]
pub struct ConsolePresenter {
    units: Units,
}

impl ConsolePresenter {
    pub fn new(units: Units) -> Self {
        Self { units }
    }
}

impl Presenter for ConsolePresenter {
    fn show_busy(&self) {
        let mut err = std::io::stderr();
        if err.is_terminal() {
            let _ = write!(err, "Looking up the weather at your location...");
            let _ = err.flush();
        }
    }

    fn hide_busy(&self) {
        let mut err = std::io::stderr();
        if err.is_terminal() {
            // Clear the progress line.
            let _ = write!(err, "\r\x1b[2K");
            let _ = err.flush();
        }
    }

    fn render(&self, weather: &WeatherResult) {
        println!("{}", format_weather(weather, self.units, &Local));
    }

    fn render_error(&self, failure: Failure) {
        eprintln!("{}", failure.message());
    }

    fn open_settings(&self, screen: SettingsScreen) {
        match screen {
            SettingsScreen::LocationSource => eprintln!(
                "Hint: run `geoweather configure` to choose a location source, \
                 or pass --lat and --lon."
            ),
            SettingsScreen::AppPermissions => eprintln!(
                "Hint: run `geoweather configure` to allow access to your location."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use geoweather_core::Condition;

    fn san_francisco() -> WeatherResult {
        WeatherResult {
            conditions: vec![Condition {
                main: "Clear".into(),
                description: "clear sky".into(),
                icon_code: "01d".into(),
            }],
            temperature: 18.5,
            temperature_min: 16.0,
            temperature_max: 21.0,
            humidity_percent: 60,
            wind_speed: 3.1,
            location_name: "San Francisco".into(),
            country_code: "US".into(),
            sunrise_unix_seconds: 1_700_000_000,
            sunset_unix_seconds: 1_700_040_000,
        }
    }

    #[test]
    fn known_icon_codes() {
        assert_eq!(Icon::from_code(Some("01d")), Icon::Sunny);
        assert_eq!(Icon::from_code(Some("04n")), Icon::Cloud);
        assert_eq!(Icon::from_code(Some("10d")), Icon::Rain);
        assert_eq!(Icon::from_code(Some("11d")), Icon::Storm);
        assert_eq!(Icon::from_code(Some("11n")), Icon::Rain);
        assert_eq!(Icon::from_code(Some("13n")), Icon::Snowflake);
    }

    #[test]
    fn unknown_or_missing_icon_falls_back() {
        assert_eq!(Icon::from_code(Some("50d")), Icon::Cloud);
        assert_eq!(Icon::from_code(None), Icon::Cloud);
    }

    #[test]
    fn clock_in_utc() {
        let weather = san_francisco();
        // 2023-11-14 22:13:20 UTC
        assert_eq!(format_clock(weather.sunrise(), &Utc), "22:13");
        // 2023-11-15 09:20:00 UTC
        assert_eq!(format_clock(weather.sunset(), &Utc), "09:20");
    }

    #[test]
    fn clock_in_fixed_offset() {
        let weather = san_francisco();
        let pst = FixedOffset::west_opt(8 * 3600).unwrap();
        assert_eq!(format_clock(weather.sunrise(), &pst), "14:13");
        assert_eq!(format_clock(weather.sunset(), &pst), "01:20");
    }

    #[test]
    fn missing_clock() {
        assert_eq!(format_clock(None, &Utc), "--:--");
    }

    #[test]
    fn formats_full_result() {
        let text = format_weather(&san_francisco(), Units::Metric, &Utc);

        assert!(text.starts_with("☀  Clear (clear sky)"));
        assert!(text.contains("San Francisco, US"));
        assert!(text.contains("Temperature: 18.5°C (min 16°C, max 21°C)"));
        assert!(text.contains("Humidity:    60 %"));
        assert!(text.contains("Wind:        3.1 m/s"));
        assert!(text.contains("Sunrise:     22:13"));
        assert!(text.contains("Sunset:      09:20"));
    }

    #[test]
    fn formats_imperial_symbols() {
        let text = format_weather(&san_francisco(), Units::Imperial, &Utc);
        assert!(text.contains("18.5°F"));
        assert!(text.contains("3.1 mph"));
    }

    #[test]
    fn empty_conditions_use_defaults() {
        let mut weather = san_francisco();
        weather.conditions.clear();

        let text = format_weather(&weather, Units::Metric, &Utc);
        assert!(text.starts_with("☁  Unknown (no conditions reported)"));
    }
}
