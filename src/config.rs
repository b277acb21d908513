// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Settings live in a TOML file managed by `confy`. Every field has a
//! default, so a missing or partial file still yields a usable config. The
//! map view itself is never written back: each launch starts from the
//! configured initial center.

use serde::{Deserialize, Serialize};
use slippy_tiles::{
    HttpSourceConfig, ViewState, DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_USER_AGENT,
    DEFAULT_WORKERS, DEFAULT_ZOOM, OSM_TILE_URL,
};

const APP_NAME: &str = "osm-viewer";
const CONFIG_NAME: &str = "config";

/// How tiles are fetched while painting.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Worker threads fetch tiles; missing tiles stay blank until they arrive.
    #[default]
    Background,
    /// Every repaint fetches all visible tiles before returning.
    Blocking,
}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Tile URL with `{z}`, `{x}` and `{y}` placeholders
    #[serde(default = "default_tile_url_template")]
    pub tile_url_template: String,

    /// User-Agent header sent with tile requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Latitude the map is centered on at startup
    #[serde(default = "default_latitude")]
    pub initial_latitude: f64,

    /// Longitude the map is centered on at startup
    #[serde(default = "default_longitude")]
    pub initial_longitude: f64,

    /// Zoom level at startup (0 - 19)
    #[serde(default = "default_zoom")]
    pub initial_zoom: u8,

    /// Initial window width in points
    #[serde(default = "default_window_width")]
    pub window_width: f32,

    /// Initial window height in points
    #[serde(default = "default_window_height")]
    pub window_height: f32,

    /// Tile fetching strategy: "background" or "blocking"
    #[serde(default)]
    pub fetch_mode: FetchMode,

    /// Worker threads used by background fetching
    #[serde(default = "default_fetch_workers")]
    pub fetch_workers: usize,
}

// Default value functions for serde
fn default_tile_url_template() -> String {
    OSM_TILE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_latitude() -> f64 {
    DEFAULT_LATITUDE
}

fn default_longitude() -> f64 {
    DEFAULT_LONGITUDE
}

fn default_zoom() -> u8 {
    DEFAULT_ZOOM
}

fn default_window_width() -> f32 {
    800.0
}

fn default_window_height() -> f32 {
    600.0
}

fn default_fetch_workers() -> usize {
    DEFAULT_WORKERS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tile_url_template: default_tile_url_template(),
            user_agent: default_user_agent(),
            initial_latitude: default_latitude(),
            initial_longitude: default_longitude(),
            initial_zoom: default_zoom(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            fetch_mode: FetchMode::default(),
            fetch_workers: default_fetch_workers(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults if missing
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Load configuration, falling back to defaults when the file is unreadable
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load configuration, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Starting view, normalised into the Web Mercator bounds
    pub fn initial_view(&self) -> ViewState {
        ViewState::new(
            self.initial_latitude,
            self.initial_longitude,
            self.initial_zoom,
        )
    }

    pub fn http_source(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            url_template: self.tile_url_template.clone(),
            user_agent: self.user_agent.clone(),
            timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_viewer_constants() {
        let config = AppConfig::default();
        assert_eq!(
            config.tile_url_template,
            "https://tile.openstreetmap.org/{z}/{x}/{y}.png"
        );
        assert_eq!(config.initial_view(), ViewState::default());
        assert_eq!((config.window_width, config.window_height), (800.0, 600.0));
        assert_eq!(config.fetch_mode, FetchMode::Background);
        assert_eq!(config.fetch_workers, 2);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            initial_zoom = 12
            fetch_mode = "blocking"
            "#,
        )
        .unwrap();

        assert_eq!(config.initial_zoom, 12);
        assert_eq!(config.fetch_mode, FetchMode::Blocking);
        assert_eq!(config.initial_latitude, DEFAULT_LATITUDE);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_initial_view_is_clamped() {
        let config = AppConfig {
            initial_latitude: 90.0,
            initial_longitude: 190.0,
            initial_zoom: 25,
            ..AppConfig::default()
        };
        let view = config.initial_view();
        assert_eq!(view.latitude(), slippy_tiles::MAX_LATITUDE);
        assert!((view.longitude() - -170.0).abs() < 1e-9);
        assert_eq!(view.zoom(), slippy_tiles::MAX_ZOOM);
    }
}
