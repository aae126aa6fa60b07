//! # WeatherAPI Feed
//!
//! Client for the `current.json` endpoint of weatherapi.com and the flattened
//! records derived from it.
//!
//! ## Core Types:
//! - **[`ApiWeatherInfo`]**: the fields of a current-conditions reading that
//!   the pipeline cares about, published on the `current_weather` topic.
//! - **[`WeatherRecord`]**: an `ApiWeatherInfo` stamped with the time it was
//!   accepted, i.e. one row of the `weather_info` table.
//! - **[`WeatherSource`]**: anything that can produce a current reading;
//!   implemented by [`WeatherApiClient`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::feeds::error::FeedError;
use crate::retrieve::ky_http::ApiClient;

/// Base URL of the WeatherAPI v1 REST interface.
pub const WEATHER_API_BASE: &str = "http://api.weatherapi.com/v1/";
/// Event type name of an [`ApiWeatherInfo`] payload.
pub const WEATHER_INFO_TYPE: &str = "WeatherInfo";
/// Event type name of a [`WeatherRecord`] payload.
pub const WEATHER_RECORD_TYPE: &str = "WeatherRecord";

/// The `current.json` response, reduced to the fields we read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentResponse {
    /// Current conditions.
    #[serde(default)]
    pub current: Current,
}

/// The `current` object of a WeatherAPI response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Current {
    /// Local time of the observation, e.g. `2023-04-01 10:45`.
    pub last_updated: String,
    /// Temperature in Fahrenheit.
    pub temp_f: f64,
    /// Textual condition.
    pub condition: Option<Condition>,
    /// Wind speed in miles per hour.
    pub wind_mph: f64,
    /// Compass wind direction.
    pub wind_dir: String,
    /// Precipitation in inches.
    pub precip_in: f64,
    /// Relative humidity in percent.
    pub humidity: i32,
    /// Feels-like temperature in Fahrenheit.
    pub feelslike_f: f64,
    /// Visibility in miles.
    pub vis_miles: f64,
}

/// Condition description nested in [`Current`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Condition {
    /// e.g. `Partly cloudy`.
    #[serde(default)]
    pub text: String,
}

/// One current-conditions reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiWeatherInfo {
    pub last_updated: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i32,
    pub condition: String,
    pub wind_mph: f64,
    pub wind_direction: String,
    pub visibility: f64,
    pub precipitation: f64,
}

impl From<Current> for ApiWeatherInfo {
    fn from(current: Current) -> Self {
        Self {
            last_updated: current.last_updated,
            temperature: current.temp_f,
            feels_like: current.feelslike_f,
            humidity: current.humidity,
            condition: current.condition.map(|c| c.text).unwrap_or_default(),
            wind_mph: current.wind_mph,
            wind_direction: current.wind_dir,
            visibility: current.vis_miles,
            precipitation: current.precip_in,
        }
    }
}

impl ApiWeatherInfo {
    /// Stamps the reading with its acceptance time.
    pub fn into_record(self, created_at: String) -> WeatherRecord {
        WeatherRecord {
            last_updated: self.last_updated,
            temperature: self.temperature,
            feels_like: self.feels_like,
            humidity: self.humidity,
            condition: self.condition,
            wind_mph: self.wind_mph,
            wind_direction: self.wind_direction,
            visibility: self.visibility,
            precipitation: self.precipitation,
            created_at,
        }
    }
}

/// A reading accepted for storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub last_updated: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i32,
    pub condition: String,
    pub wind_mph: f64,
    pub wind_direction: String,
    pub visibility: f64,
    pub precipitation: f64,
    pub created_at: String,
}

/// Produces current weather readings.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetches the latest reading.
    async fn current(&self) -> Result<ApiWeatherInfo, FeedError>;
}

/// # WeatherAPI Client
pub struct WeatherApiClient {
    client: ApiClient,
    api_key: String,
    location: String,
}

impl WeatherApiClient {
    /// Creates a client for `location` against the public endpoint.
    pub fn new(api_key: &str, location: &str) -> Result<Self, FeedError> {
        Self::with_base_url(WEATHER_API_BASE, api_key, location)
    }

    /// Creates a client against an alternative base URL.
    pub fn with_base_url(base_url: &str, api_key: &str, location: &str) -> Result<Self, FeedError> {
        if api_key.is_empty() {
            return Err(FeedError::MissingKey("WAPIKEY"));
        }
        Ok(Self {
            client: ApiClient::new(base_url, None).map_err(FeedError::Request)?,
            api_key: api_key.to_string(),
            location: location.to_string(),
        })
    }
}

#[async_trait]
impl WeatherSource for WeatherApiClient {
    async fn current(&self) -> Result<ApiWeatherInfo, FeedError> {
        let query = [("key", self.api_key.as_str()), ("q", self.location.as_str())];
        let response = self
            .client
            .get::<CurrentResponse>("current.json", &query)
            .await
            .map_err(FeedError::Request)?;

        log::debug!("WeatherAPI responded with status {}", response.status);
        if response.status != 200 {
            return Err(FeedError::Status {
                status: response.status,
                body: response.error_body.unwrap_or_default(),
            });
        }
        let body = response
            .data
            .ok_or_else(|| FeedError::Request(anyhow::anyhow!("empty response body")))?;
        Ok(body.current.into())
    }
}
