use std::path::PathBuf;

use dirs::home_dir;
use log::error;

/// The EPSG:3857 extent of the digitized cadastre sheets,
/// `[min_x, min_y, max_x, max_y]`.
pub const CADASTRE_EXTENT: [f64; 4] = [
  732_766.515_953_591_1,
  5_861_623.374_137_599,
  748_257.979_025_699_9,
  5_877_491.021_729_927,
];

const DEFAULT_BASE_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
const DEFAULT_HISTORICAL_TILE_URL: &str =
  "https://geo-timemachine.epfl.ch/geoserver/www/tilesets/lausanne-1832/{z}/{x}/{y}.png";
const DEFAULT_HISTORICAL_ATTRIBUTION: &str =
  "© Archives départementales des Deux-Sèvres et Vienne";
const DEFAULT_WMS_ENDPOINT: &str = "https://geo-timemachine.epfl.ch/geoserver/TimeMachine/ows";
const DEFAULT_WMS_LAYER: &str = "TimeMachine:lausanne_cadastre_berney_v7_7";
const DEFAULT_PARCEL_TILE_URL: &str = "https://geo-timemachine.epfl.ch/geoserver/TimeMachine/gwc/service/tms/1.0.0/TimeMachine:lausanne_cadastre_berney_v7_7@EPSG:900913@pbf/{z}/{x}/{-y}.pbf";
const DEFAULT_ALMANAC_TYPE_NAME: &str = "TimeMachine:1832_almanach";

/// Where the viewer finds its data and keeps its tile cache. Values come
/// from the environment, then an optional config file, then the defaults.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
  pub config_path: Option<PathBuf>,
  pub tile_cache_dir: Option<PathBuf>,
  pub base_tile_url: String,
  pub historical_tile_url: String,
  pub historical_attribution: String,
  pub wms_endpoint: String,
  pub wms_layer: String,
  pub parcel_tile_url: String,
  pub wfs_endpoint: String,
  pub almanac_type_name: String,
  pub extent: [f64; 4],
}

impl Config {
  #[must_use]
  pub fn new() -> Self {
    let from_file = Self::from_file();
    let mut config = from_file.clone().unwrap_or_default();
    config.apply_env();

    if config.config_path.is_some() && from_file.is_none() {
      config.init_cfg_file();
    }

    config
  }

  fn apply_env(&mut self) {
    if let Ok(path) = std::env::var("BERNEY_CONFIG") {
      self.config_path = Some(PathBuf::from(path));
    }
    if let Ok(dir) = std::env::var("BERNEY_TILE_CACHE_DIR") {
      self.tile_cache_dir = Some(PathBuf::from(dir));
    }
    if let Ok(url) = std::env::var("BERNEY_BASE_TILE_URL") {
      self.base_tile_url = url;
    }
  }

  fn from_file() -> Option<Self> {
    let config_path = std::env::var("BERNEY_CONFIG")
      .ok()
      .map(PathBuf::from)
      .or_else(|| home_dir().map(|p| p.join(".config").join("berney")))?;
    let config_path = config_path.join("config.json");

    serde_json::from_str(&std::fs::read_to_string(&config_path).ok()?)
      .inspect_err(|e| error!("Failed to read config file: {e}"))
      .ok()?
  }

  fn init_cfg_file(&self) {
    if let Some(path) = &self.config_path {
      if !path.exists() {
        let _ = std::fs::create_dir_all(path).inspect_err(|e| {
          error!("Failed to create config directory: {e}");
        });
      }

      if let Some(cache) = &self.tile_cache_dir
        && !cache.exists()
      {
        let _ = std::fs::create_dir_all(cache).inspect_err(|e| {
          error!("Failed to create tile cache directory: {e}");
        });
      }

      let path = path.join("config.json");
      if !path.exists() {
        let config = serde_json::to_string_pretty(self);
        if let Ok(config) = config {
          let _ = std::fs::write(path, config).inspect_err(|e| {
            error!("Failed to write config file: {e}");
          });
        } else {
          error!("Failed to serialize config");
        }
      }
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      config_path: home_dir().map(|p| p.join(".config").join("berney")),
      tile_cache_dir: home_dir().map(|p| p.join(".berney_tile_cache")),
      base_tile_url: DEFAULT_BASE_TILE_URL.to_string(),
      historical_tile_url: DEFAULT_HISTORICAL_TILE_URL.to_string(),
      historical_attribution: DEFAULT_HISTORICAL_ATTRIBUTION.to_string(),
      wms_endpoint: DEFAULT_WMS_ENDPOINT.to_string(),
      wms_layer: DEFAULT_WMS_LAYER.to_string(),
      parcel_tile_url: DEFAULT_PARCEL_TILE_URL.to_string(),
      wfs_endpoint: DEFAULT_WMS_ENDPOINT.to_string(),
      almanac_type_name: DEFAULT_ALMANAC_TYPE_NAME.to_string(),
      extent: CADASTRE_EXTENT,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_point_at_the_geo_server() {
    let config = Config::default();
    assert!(config.wms_endpoint.starts_with("https://"));
    assert_eq!(config.wfs_endpoint, config.wms_endpoint);
    assert!(config.parcel_tile_url.contains("{-y}"));
    assert_eq!(config.extent, CADASTRE_EXTENT);
  }
}
