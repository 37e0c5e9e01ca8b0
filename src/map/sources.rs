//! URL construction for the remote geo server endpoints. Everything here is
//! consumed read-only; the server does the actual rendering and querying.

use itertools::Itertools as _;

use super::coordinates::Tile;

/// Standard WMS pixel size (0.28 mm) used to turn a resolution into a scale
/// denominator for legend graphics.
const WMS_PIXEL_SIZE_M: f64 = 0.000_28;

/// Pixel size of requested WMS map tiles.
const WMS_TILE_SIZE: u32 = 256;

/// Anything that can produce one HTTP URL per map tile.
pub trait TileUrlSource {
  /// The request URL for a tile.
  fn url_for(&self, tile: &Tile) -> String;
  /// A stable string identifying this source, used to key the disk cache.
  fn cache_key(&self) -> &str;
  /// File extension for cached tiles.
  fn file_extension(&self) -> &'static str;
}

/// A `{z}/{x}/{y}` tile endpoint. `{-y}` addresses TMS services that count
/// rows from the bottom, as the GeoServer tile cache does.
#[derive(Debug, Clone)]
pub struct XyzSource {
  template: String,
  attribution: Option<String>,
}

impl XyzSource {
  #[must_use]
  pub fn new(template: String) -> Self {
    Self {
      template,
      attribution: None,
    }
  }

  #[must_use]
  pub fn with_attribution(mut self, attribution: String) -> Self {
    self.attribution = Some(attribution);
    self
  }

  #[must_use]
  pub fn attribution(&self) -> Option<&str> {
    self.attribution.as_deref()
  }
}

impl TileUrlSource for XyzSource {
  fn url_for(&self, tile: &Tile) -> String {
    self
      .template
      .replace("{x}", &tile.x.to_string())
      .replace("{-y}", &tile.flipped_y().to_string())
      .replace("{y}", &tile.y.to_string())
      .replace("{z}", &tile.zoom.to_string())
      .replace("{zoom}", &tile.zoom.to_string())
  }

  fn cache_key(&self) -> &str {
    &self.template
  }

  fn file_extension(&self) -> &'static str {
    if self.template.contains(".pbf") {
      "pbf"
    } else {
      "png"
    }
  }
}

/// A tiled WMS endpoint speaking version 1.1.1 in EPSG:900913.
#[derive(Debug, Clone)]
pub struct WmsSource {
  endpoint: String,
  layer: String,
}

impl WmsSource {
  #[must_use]
  pub fn new(endpoint: String, layer: String) -> Self {
    Self { endpoint, layer }
  }

  /// The legend graphic for the given display resolution in meters per
  /// pixel. The server picks rule visibility from the scale denominator.
  #[must_use]
  pub fn legend_url(&self, resolution: f64) -> String {
    let scale = resolution / WMS_PIXEL_SIZE_M;
    format!(
      "{}?SERVICE=WMS&VERSION=1.1.1&REQUEST=GetLegendGraphic&FORMAT=image%2Fpng&LAYER={}&SCALE={scale}",
      self.endpoint, self.layer
    )
  }
}

impl TileUrlSource for WmsSource {
  fn url_for(&self, tile: &Tile) -> String {
    let bbox = tile.mercator_bounds().iter().join(",");
    format!(
      "{}?SERVICE=WMS&VERSION=1.1.1&REQUEST=GetMap&FORMAT=image%2Fpng&TRANSPARENT=true&TILED=true\
       &LAYERS={}&SRS=EPSG%3A900913&WIDTH={WMS_TILE_SIZE}&HEIGHT={WMS_TILE_SIZE}&BBOX={bbox}",
      self.endpoint, self.layer
    )
  }

  fn cache_key(&self) -> &str {
    &self.endpoint
  }

  fn file_extension(&self) -> &'static str {
    "png"
  }
}

/// A WFS endpoint serving a feature collection as GeoJSON.
#[derive(Debug, Clone)]
pub struct WfsSource {
  endpoint: String,
  type_name: String,
}

impl WfsSource {
  #[must_use]
  pub fn new(endpoint: String, type_name: String) -> Self {
    Self {
      endpoint,
      type_name,
    }
  }

  #[must_use]
  pub fn get_feature_url(&self) -> String {
    format!(
      "{}?service=WFS&version=1.0.0&request=GetFeature&typeName={}&outputFormat={}",
      self.endpoint,
      urlencoding::encode(&self.type_name),
      urlencoding::encode("application/json")
    )
  }
}
