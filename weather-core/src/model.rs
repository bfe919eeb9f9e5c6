use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Country used for postal-code lookups when the user does not name one.
pub const DEFAULT_COUNTRY: &str = "US";

/// Unit system requested from the provider and shown next to temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Value of the `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Units::Metric => "Celsius",
            Units::Imperial => "Fahrenheit",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial]
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.temperature_symbol())
    }
}

impl FromStr for Units {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "c" | "celsius" | "metric" => Ok(Units::Metric),
            "f" | "fahrenheit" | "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit '{value}'. Use celsius (metric) or fahrenheit (imperial)."
            )),
        }
    }
}

/// Where to look the weather up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationQuery {
    City { name: String },
    PostalCode { code: String, country: String },
}

/// Returned when the JSON body carries a non-success `cod`, e.g. an unknown city.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

/// Current-weather payload as sent by OpenWeatherMap. Every field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResponse {
    /// Integer `200` on success, usually a string such as `"404"` otherwise.
    pub cod: Option<Value>,
    pub message: Option<Value>,
    pub name: Option<String>,
    pub main: Option<RawMain>,
    #[serde(default)]
    pub weather: Vec<RawCondition>,
    pub wind: Option<RawWind>,
    pub visibility: Option<Number>,
    pub clouds: Option<RawClouds>,
    pub sys: Option<RawSys>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMain {
    pub temp: Option<Number>,
    pub feels_like: Option<Number>,
    pub humidity: Option<Number>,
    pub pressure: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCondition {
    pub main: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWind {
    pub speed: Option<Number>,
    pub deg: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawClouds {
    pub all: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSys {
    pub country: Option<String>,
    /// Unix seconds; some stations report a fractional value.
    pub sunrise: Option<Number>,
    pub sunset: Option<Number>,
}

/// Whole unix seconds, rounding fractional timestamps down.
fn epoch_seconds(value: &Number) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|secs| secs.floor() as i64))
}

impl RawResponse {
    /// `Ok` only when `cod` is the number 200.
    pub fn status(&self) -> Result<(), ProviderError> {
        let ok = self
            .cod
            .as_ref()
            .and_then(Value::as_f64)
            .is_some_and(|code| code == 200.0);

        if ok {
            return Ok(());
        }

        let message = match &self.message {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "Unknown error".to_string(),
            Some(other) => other.to_string(),
        };

        Err(ProviderError { message })
    }
}

/// Flat view of a successful response, built fresh for every query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherReport {
    pub city: Option<String>,
    pub country: Option<String>,
    pub temperature: Option<Number>,
    pub feels_like: Option<Number>,
    pub humidity: Option<Number>,
    pub pressure: Option<Number>,
    pub description: Option<String>,
    pub condition: Option<String>,
    pub wind_speed: Option<Number>,
    pub wind_deg: Option<Number>,
    pub visibility: Option<Number>,
    pub cloudiness: Option<Number>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

impl From<&RawResponse> for WeatherReport {
    fn from(raw: &RawResponse) -> Self {
        let main = raw.main.clone().unwrap_or_default();
        let condition = raw.weather.first().cloned().unwrap_or_default();
        let wind = raw.wind.clone().unwrap_or_default();
        let sys = raw.sys.clone().unwrap_or_default();

        Self {
            city: raw.name.clone(),
            country: sys.country,
            temperature: main.temp,
            feels_like: main.feels_like,
            humidity: main.humidity,
            pressure: main.pressure,
            description: condition.description,
            condition: condition.main,
            wind_speed: wind.speed,
            wind_deg: wind.deg,
            visibility: raw.visibility.clone(),
            cloudiness: raw.clouds.as_ref().and_then(|c| c.all.clone()),
            sunrise: sys.sunrise.as_ref().and_then(epoch_seconds),
            sunset: sys.sunset.as_ref().and_then(epoch_seconds),
        }
    }
}
