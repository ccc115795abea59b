use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

pub const DEFAULT_RADIUS_M: u32 = 15_000;
pub const DEFAULT_FALLBACK_THRESHOLD: usize = 5;

fn default_radius() -> u32 {
    DEFAULT_RADIUS_M
}
fn default_fallback_threshold() -> usize {
    DEFAULT_FALLBACK_THRESHOLD
}
fn default_fallback() -> bool {
    true
}
fn default_verbose() -> bool {
    false
}

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default = "default_radius")]
    pub radius: u32,
    /// Scrape the map-search page when fewer results than this come back
    #[serde(default = "default_fallback_threshold")]
    pub fallback_threshold: usize,
    #[serde(default = "default_fallback")]
    pub fallback: bool,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            city: None,
            radius: default_radius(),
            fallback_threshold: default_fallback_threshold(),
            fallback: default_fallback(),
            verbose: default_verbose(),
            endpoints: EndpointConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}
fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}
fn default_maps_search_url() -> String {
    "https://www.google.com/maps/search/".to_string()
}
fn default_user_agent() -> String {
    concat!("hospital-finder/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_browser_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_overpass_timeout_secs() -> u64 {
    60
}

/// Upstream services and how to talk to them
#[derive(Debug, Deserialize, Clone)]
pub struct EndpointConfig {
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    #[serde(default = "default_maps_search_url")]
    pub maps_search_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Sent to the map-search page, which rejects non-browser clients
    #[serde(default = "default_browser_user_agent")]
    pub browser_user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Server-side Overpass timeout; the client waits a little longer
    #[serde(default = "default_overpass_timeout_secs")]
    pub overpass_timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            nominatim_url: default_nominatim_url(),
            overpass_url: default_overpass_url(),
            maps_search_url: default_maps_search_url(),
            user_agent: default_user_agent(),
            browser_user_agent: default_browser_user_agent(),
            timeout_secs: default_timeout_secs(),
            overpass_timeout_secs: default_overpass_timeout_secs(),
        }
    }
}

fn default_geocode_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Pause between consecutive fallback geocoding lookups
    #[serde(default = "default_geocode_delay_ms")]
    pub geocode_delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            geocode_delay_ms: default_geocode_delay_ms(),
        }
    }
}

impl FileConfig {
    /// Load the first config file found in the standard locations
    pub fn load() -> Option<Self> {
        let config_paths = get_config_paths();

        for path in config_paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }

    /// Load an explicitly named config file; a missing or invalid file is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Config file not found: {:?}", path);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }
}

const APP_NAME: &str = "hospital-finder";

/// Search order: working directory, platform config dir, then home
fn get_config_paths() -> Vec<PathBuf> {
    let file_name = format!("{}.toml", APP_NAME);
    let mut paths = vec![
        PathBuf::from(&file_name),
        PathBuf::from(format!(".{}", file_name)),
    ];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_NAME).join("config.toml"));
        paths.push(config_dir.join(&file_name));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{}", file_name)));
        paths.push(home.join(".config").join(APP_NAME).join("config.toml"));
    }

    paths
}
