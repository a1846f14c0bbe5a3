//! Sources for the "use my location" position.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

pub const DEFAULT_LOCATE_URL: &str = "http://ip-api.com/json/";

const USER_AGENT: &str = concat!("citywx/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location access denied. Enter a city manually.")]
    PermissionDenied,
    #[error("Could not determine location.")]
    PositionUnavailable,
    #[error("Location request timed out.")]
    Timeout,
    #[error("An error occurred.")]
    Other,
    #[error("Geolocation is not supported.")]
    Unsupported,
}

pub trait Locator: Send + Sync {
    fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// A position given up front, e.g. on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator(pub Coordinates);

impl Locator for FixedLocator {
    fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// The user opted out of geolocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedLocator;

impl Locator for DeniedLocator {
    fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::PermissionDenied)
    }
}

#[derive(Deserialize, Debug)]
struct IpApiResponse {
    status: String,

    message: Option<String>,

    lat: Option<f64>,

    lon: Option<f64>,
}

/// Approximate position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpLocator {
    client: Client,
    url: Url,
}

impl IpLocator {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, url })
    }
}

impl Locator for IpLocator {
    fn locate(&self) -> Result<Coordinates, GeolocationError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .and_then(|r| r.json::<IpApiResponse>())
            .map_err(|e| {
                tracing::warn!(url = %self.url, "ip lookup failed: {e}");
                classify(&e)
            })?;
        coordinates_from(response)
    }
}

fn classify(err: &reqwest::Error) -> GeolocationError {
    if err.is_timeout() {
        GeolocationError::Timeout
    } else if err.is_connect() {
        GeolocationError::PositionUnavailable
    } else {
        GeolocationError::Other
    }
}

fn coordinates_from(response: IpApiResponse) -> Result<Coordinates, GeolocationError> {
    if response.status != "success" {
        tracing::warn!(
            status = %response.status,
            message = response.message.as_deref().unwrap_or("--"),
            "ip lookup rejected"
        );
        return Err(GeolocationError::PositionUnavailable);
    }
    match (response.lat, response.lon) {
        (Some(latitude), Some(longitude)) => Ok(Coordinates {
            latitude,
            longitude,
        }),
        _ => Err(GeolocationError::PositionUnavailable),
    }
}
