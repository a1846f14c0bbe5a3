use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

use crate::catalog::City;

pub const DEFAULT_API_URL: &str = "https://api.open-meteo.com/v1/forecast";

const USER_AGENT: &str = concat!("citywx/", env!("CARGO_PKG_VERSION"));
const DAILY_SERIES: &str = "temperature_2m_max,temperature_2m_min";
const FORECAST_DAYS: &str = "3";

/// One day of the forecast, temperatures in Celsius.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: String,
    pub temp_max_c: f64,
    pub temp_min_c: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Failed to load weather data")]
    Network(#[from] reqwest::Error),
    #[error("Weather data error")]
    Data { reason: String },
    #[error("Failed to load weather data")]
    NotStarted { reason: String },
}

impl ForecastError {
    fn data(reason: impl Into<String>) -> Self {
        Self::Data {
            reason: reason.into(),
        }
    }
}

/// Anything that can produce a daily forecast for a location.
pub trait ForecastSource: Send + Sync {
    fn fetch(&self, city: &City) -> Result<Vec<DailyForecast>, ForecastError>;
}

#[derive(Deserialize, Debug)]
struct Response {
    daily: Option<Daily>,

    reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Daily {
    time: Vec<String>,

    temperature_2m_max: Vec<Option<f64>>,

    temperature_2m_min: Vec<Option<f64>>,
}

/// Client for the Open-Meteo daily forecast endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteo {
    client: Client,
    base_url: Url,
}

impl OpenMeteo {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn request_url(&self, city: &City) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &city.lat.to_string())
            .append_pair("longitude", &city.lon.to_string())
            .append_pair("daily", DAILY_SERIES)
            .append_pair("forecast_days", FORECAST_DAYS)
            .append_pair("timezone", "auto");
        url
    }
}

impl ForecastSource for OpenMeteo {
    fn fetch(&self, city: &City) -> Result<Vec<DailyForecast>, ForecastError> {
        let url = self.request_url(city);
        tracing::debug!(city = %city.name, %url, "requesting forecast");

        let response = self.client.get(url).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            tracing::warn!(city = %city.name, %status, "forecast endpoint returned an error status");
        }
        parse_forecast(&body)
    }
}

/// Parses an Open-Meteo response body into one entry per day.
pub fn parse_forecast(body: &str) -> Result<Vec<DailyForecast>, ForecastError> {
    let response: Response =
        serde_json::from_str(body).map_err(|e| ForecastError::data(e.to_string()))?;

    let Some(daily) = response.daily else {
        let reason = response
            .reason
            .unwrap_or_else(|| "response has no daily series".to_string());
        return Err(ForecastError::data(reason));
    };

    let days = daily.time.len();
    if daily.temperature_2m_max.len() != days || daily.temperature_2m_min.len() != days {
        return Err(ForecastError::data(format!(
            "series lengths differ: {} dates, {} max, {} min",
            days,
            daily.temperature_2m_max.len(),
            daily.temperature_2m_min.len()
        )));
    }

    daily
        .time
        .into_iter()
        .zip(daily.temperature_2m_max)
        .zip(daily.temperature_2m_min)
        .map(|((date, max), min)| match (max, min) {
            (Some(temp_max_c), Some(temp_min_c)) => Ok(DailyForecast {
                date,
                temp_max_c,
                temp_min_c,
            }),
            _ => Err(ForecastError::data(format!("missing temperature for {date}"))),
        })
        .collect()
}
