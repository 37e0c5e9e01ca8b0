use egui::{Pos2, Rect, Ui};

use crate::feature_info::FeatureProperties;
use crate::map::coordinates::Transform;

/// Draws the almanac resident points.
mod almanac_layer;
/// Drawing abstractions.
mod drawable;
/// The invisible parcel hit-test layer.
mod parcel_layer;
/// Raster tile layers (base map, historical image, WMS overlay).
mod raster_layer;

pub use almanac_layer::AlmanacLayer;
pub use parcel_layer::ParcelLayer;
pub use raster_layer::RasterLayer;

/// Identifies each layer of the fixed stack, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerId {
  /// The modern base map.
  Base,
  /// The scanned 1832 cadastre sheets.
  HistoricalImage,
  /// The vectorized cadastre rendered by the WMS server.
  CadastreWms,
  /// Parcel geometry for hit-testing, never visibly drawn.
  CadastreParcels,
  /// The almanac resident points.
  Almanac,
}

/// A layer represents everything that can be summarized as a logical unit on
/// the map, e.g. one overlay of the cadastre stack.
pub trait Layer {
  fn id(&self) -> LayerId;
  fn name(&self) -> &str;
  fn draw(&mut self, ui: &mut Ui, transform: &Transform, rect: Rect);
  fn visible(&self) -> bool;
  fn visible_mut(&mut self) -> &mut bool;
  fn set_visible(&mut self, visible: bool) {
    *self.visible_mut() = visible;
  }
  fn opacity(&self) -> f32 {
    1.0
  }
  fn set_opacity(&mut self, _opacity: f32) {}
  /// The raw properties of the topmost feature of this layer at the given
  /// screen position, if any.
  fn feature_at(&self, _pos: Pos2, _transform: &Transform) -> Option<FeatureProperties> {
    None
  }
}

/// Common properties for all layers.
pub struct LayerProperties {
  pub visible: bool,
  pub opacity: f32,
}

impl Default for LayerProperties {
  fn default() -> Self {
    Self {
      visible: true,
      opacity: 1.0,
    }
  }
}
