//! Console rendering of a current-weather response.
//!
//! The layout is fixed: a `=` banner with the location, one emoji-prefixed
//! line per measurement, then an "Additional Details" block. Missing values
//! print as `N/A` in place, except the wind direction line which is dropped.

use chrono::{DateTime, Local, TimeZone};
use serde_json::Number;
use std::fmt::Write as _;

use crate::model::{RawResponse, Units, WeatherReport};

pub const NOT_AVAILABLE: &str = "N/A";

const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

const DEFAULT_ICON: &str = "🌈";

/// Banner of `width` copies of `ch`.
pub fn rule(ch: char, width: usize) -> String {
    std::iter::repeat_n(ch, width).collect()
}

/// Render with sunrise and sunset in the machine's local time zone.
pub fn render(response: &RawResponse, units: Units) -> String {
    render_in(response, units, &Local)
}

/// Render with sunrise and sunset converted to `tz`.
///
/// A response whose `cod` is not 200 renders as a single `Error: ...` line.
pub fn render_in<Tz: TimeZone>(response: &RawResponse, units: Units, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if let Err(err) = response.status() {
        return format!("Error: {err}");
    }

    render_report(&WeatherReport::from(response), units, tz)
}

pub fn render_report<Tz: TimeZone>(report: &WeatherReport, units: Units, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let symbol = units.temperature_symbol();
    let heavy = rule('=', 50);
    let light = rule('-', 30);

    let city = report.city.as_deref().unwrap_or("Unknown");
    let country = report.country.as_deref().unwrap_or_default();
    let description = title_case(report.description.as_deref().unwrap_or(NOT_AVAILABLE));

    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "\n{heavy}");
    let _ = writeln!(out, "WEATHER FORECAST - {city}, {country}");
    let _ = writeln!(out, "{heavy}");

    let _ = writeln!(out, "\n🌤️  Current Conditions: {description}");
    let _ = writeln!(
        out,
        "🌡️  Temperature: {}{symbol} (Feels like: {}{symbol})",
        or_na(&report.temperature),
        or_na(&report.feels_like),
    );
    let _ = writeln!(out, "💧 Humidity: {}%", or_na(&report.humidity));
    let _ = writeln!(out, "📊 Pressure: {} hPa", or_na(&report.pressure));
    // Always labelled m/s, whatever unit system the provider used.
    let _ = writeln!(out, "💨 Wind Speed: {} m/s", or_na(&report.wind_speed));

    let direction = report.wind_deg.as_ref().and_then(|deg| Some((compass(deg.as_f64()?), deg)));
    if let Some((point, deg)) = direction {
        let _ = writeln!(out, "🧭 Wind Direction: {point} ({deg}°)");
    }

    match &report.visibility {
        Some(meters) => {
            let _ = writeln!(out, "👁️  Visibility: {meters} meters");
        }
        None => {
            let _ = writeln!(out, "👁️  Visibility: {NOT_AVAILABLE}");
        }
    }

    let _ = writeln!(out, "🌅 Sunrise: {}", clock_or_na(report.sunrise, tz));
    let _ = writeln!(out, "🌇 Sunset: {}", clock_or_na(report.sunset, tz));

    let _ = writeln!(out, "\n{light}");
    let _ = writeln!(out, "Additional Details:");
    let _ = writeln!(out, "{light}");

    let icon = icon_for(report.condition.as_deref().unwrap_or_default());
    let _ = writeln!(out, "Weather Icon: {icon}");
    let _ = writeln!(out, "☁️  Cloud Coverage: {}%", or_na(&report.cloudiness));

    let _ = writeln!(out, "{heavy}");

    out
}

/// Map degrees to one of eight compass points.
///
/// Halfway cases round to the even sector, so 22.5° is `N` and 67.5° is `E`.
pub fn compass(deg: f64) -> &'static str {
    let sector = (deg / 45.0).round_ties_even() as i64;
    COMPASS_POINTS[sector.rem_euclid(8) as usize]
}

/// Icon for an OpenWeather condition group such as `Rain` or `clouds`.
pub fn icon_for(condition: &str) -> &'static str {
    match condition.to_lowercase().as_str() {
        "clear" => "☀️",
        "clouds" => "☁️",
        "rain" => "🌧️",
        "drizzle" => "🌦️",
        "thunderstorm" => "⛈️",
        "snow" => "❄️",
        "mist" => "🌫️",
        "smoke" => "💨",
        "haze" => "😶‍🌫️",
        "dust" => "🌪️",
        "fog" => "🌁",
        _ => DEFAULT_ICON,
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }

    out
}

/// `HH:MM:SS` wall-clock time of a unix timestamp in `tz`.
pub fn format_clock_in<Tz: TimeZone>(epoch: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    let utc = DateTime::from_timestamp(epoch, 0)?;
    Some(utc.with_timezone(tz).format("%H:%M:%S").to_string())
}

// Zero means "not reported" to the provider, same as a missing field.
fn clock_or_na<Tz: TimeZone>(epoch: Option<i64>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    epoch
        .filter(|ts| *ts != 0)
        .and_then(|ts| format_clock_in(ts, tz))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn or_na(value: &Option<Number>) -> String {
    value.as_ref().map_or_else(|| NOT_AVAILABLE.to_string(), Number::to_string)
}

/// Fixed sample report shown when the API key cannot be used.
pub fn demo_report() -> String {
    let heavy = rule('=', 50);
    let light = rule('-', 30);

    [
        String::new(),
        heavy.clone(),
        "DEMO WEATHER DATA - LONDON (Sample)".to_string(),
        heavy.clone(),
        String::new(),
        "🌤️  Current Conditions: Clear Sky".to_string(),
        "🌡️  Temperature: 22°C (Feels like: 21°C)".to_string(),
        "💧 Humidity: 65%".to_string(),
        "📊 Pressure: 1013 hPa".to_string(),
        "💨 Wind Speed: 5.5 m/s".to_string(),
        "🧭 Wind Direction: NW (315°)".to_string(),
        "👁️  Visibility: 10000 meters".to_string(),
        "🌅 Sunrise: 06:45:00".to_string(),
        "🌇 Sunset: 18:30:00".to_string(),
        String::new(),
        light.clone(),
        "Additional Details:".to_string(),
        light,
        "Weather Icon: ☀️".to_string(),
        "☁️  Cloud Coverage: 0%".to_string(),
        heavy,
    ]
    .join("\n")
}
