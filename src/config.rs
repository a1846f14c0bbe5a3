use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;

use crate::cli::Args;
use crate::locate::{Coordinates, DeniedLocator, FixedLocator, IpLocator, Locator};
use crate::units::Units;

const APP_DIR: &str = "citywx";

#[derive(Debug, Clone, PartialEq)]
pub enum LocatorKind {
    Fixed(Coordinates),
    Ip(Url),
    Denied,
}

/// Settings resolved from the command line, environment and platform defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_file: PathBuf,
    pub log_file: PathBuf,
    pub api_url: Url,
    pub locator: LocatorKind,
    pub timeout: Duration,
    pub units: Units,
    pub city: Option<String>,
}

fn data_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .context("could not determine a data directory; pass --state-file and --log-file")?;
    Ok(base.join(APP_DIR))
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self> {
        let (state_file, log_file) = match (args.state_file, args.log_file) {
            (Some(state), Some(log)) => (state, log),
            (state, log) => {
                let dir = data_dir()?;
                (
                    state.unwrap_or_else(|| dir.join("state.json")),
                    log.unwrap_or_else(|| dir.join("citywx.log")),
                )
            }
        };

        let locator = match (args.lat, args.lon) {
            (Some(latitude), Some(longitude)) => LocatorKind::Fixed(Coordinates {
                latitude,
                longitude,
            }),
            _ if args.no_geolocation => LocatorKind::Denied,
            _ => LocatorKind::Ip(args.locate_url),
        };

        Ok(Self {
            state_file,
            log_file,
            api_url: args.api_url,
            locator,
            timeout: Duration::from_secs(args.timeout),
            units: if args.fahrenheit {
                Units::Imperial
            } else {
                Units::Metric
            },
            city: args.city,
        })
    }

    /// Builds the configured locator; `None` when no locator can be used.
    pub fn build_locator(&self) -> Option<Arc<dyn Locator>> {
        match &self.locator {
            LocatorKind::Fixed(coords) => Some(Arc::new(FixedLocator(*coords))),
            LocatorKind::Denied => Some(Arc::new(DeniedLocator)),
            LocatorKind::Ip(url) => match IpLocator::new(url.clone(), self.timeout) {
                Ok(locator) => Some(Arc::new(locator)),
                Err(e) => {
                    tracing::error!("geolocation unavailable: {e}");
                    None
                }
            },
        }
    }
}
