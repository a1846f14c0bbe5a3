use std::path::PathBuf;

use clap::builder::{styling::AnsiColor, Styles};
use clap::Parser;
use reqwest::Url;

use crate::forecast::DEFAULT_API_URL;
use crate::locate::DEFAULT_LOCATE_URL;

const ABOUT: &str = "City weather TUI";

const LONG_ABOUT: &str = "
TUI for viewing a three-day forecast sourced from Open-Meteo.

On first run `citywx` tries to determine your location. You can also keep a short list of saved
cities and switch between them; the list and the selected city are saved, so subsequent runs start
where you left off.
";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[arg(long, env = "CITYWX_CITY", help = "Show this saved or catalog city on startup")]
    pub city: Option<String>,

    #[arg(long, env = "CITYWX_STATE_FILE", help = "Where saved cities are kept")]
    pub state_file: Option<PathBuf>,

    #[arg(long, env = "CITYWX_LOG_FILE", help = "Log file (filter with RUST_LOG)")]
    pub log_file: Option<PathBuf>,

    #[arg(long, env = "CITYWX_API_URL", default_value = DEFAULT_API_URL, help = "Forecast endpoint")]
    pub api_url: Url,

    #[arg(long, env = "CITYWX_LOCATE_URL", default_value = DEFAULT_LOCATE_URL, help = "IP geolocation endpoint")]
    pub locate_url: Url,

    #[arg(long, env = "CITYWX_LAT", requires = "lon", allow_negative_numbers = true, help = "Use this latitude as your location")]
    pub lat: Option<f64>,

    #[arg(long, env = "CITYWX_LON", requires = "lat", allow_negative_numbers = true, help = "Use this longitude as your location")]
    pub lon: Option<f64>,

    #[arg(long, env = "CITYWX_NO_GEOLOCATION", conflicts_with = "lat", help = "Never look up your location")]
    pub no_geolocation: bool,

    #[arg(long, env = "CITYWX_TIMEOUT", default_value_t = 10, help = "HTTP timeout in seconds")]
    pub timeout: u64,

    #[arg(long, env = "CITYWX_FAHRENHEIT", help = "Show temperatures in Fahrenheit")]
    pub fahrenheit: bool,
}
