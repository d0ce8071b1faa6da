//! `OpenWeather` current conditions

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{WeatherLookup, WeatherReport, WeatherService};
use crate::config::WeatherUnits;
use crate::{Error, Result};

const API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// `OpenWeather` API client
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: String,
    units: WeatherUnits,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    /// Status code; the API sends it as a number on success and a string on error
    cod: serde_json::Value,
    #[serde(default)]
    weather: Vec<Condition>,
    main: Option<MainReadings>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
}

impl OpenWeatherClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(api_key: String, units: WeatherUnits, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            units,
        })
    }
}

fn status_code(cod: &serde_json::Value) -> Option<u64> {
    match cod {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn interpret(response: WeatherResponse) -> Result<WeatherLookup> {
    match status_code(&response.cod) {
        Some(200) => {}
        Some(404) => return Ok(WeatherLookup::NotFound),
        other => {
            return Err(Error::Weather(format!("unexpected status code {other:?}")));
        }
    }

    let main = response
        .main
        .ok_or_else(|| Error::Weather("response missing readings".to_string()))?;
    let description = response
        .weather
        .into_iter()
        .next()
        .map(|c| c.description)
        .unwrap_or_default();

    Ok(WeatherLookup::Report(WeatherReport {
        description,
        temp: main.temp.round() as i64,
        feels_like: main.feels_like.round() as i64,
    }))
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    async fn current(&self, location: &str) -> Result<WeatherLookup> {
        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", self.units.api_value()),
            ])
            .send()
            .await?;

        // 404 bodies still carry `cod`, so decode before checking status
        let body: WeatherResponse = response.json().await?;
        interpret(body)
    }
}
