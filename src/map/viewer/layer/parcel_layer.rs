use std::{
  collections::{HashMap, HashSet},
  path::PathBuf,
  sync::{Arc, Mutex},
};

use egui::{Pos2, Rect, Ui};
use log::error;
use serde_json::Value;

use crate::{
  feature_info::FeatureProperties,
  map::{
    coordinates::{
      BoundingBox, Coordinate as _, PixelCoordinate, TILE_SIZE, Tile, TileCoordinate, Transform,
      tiles_in_box,
    },
    geometry_collection::{Geometry, INVISIBLE_STYLE, Metadata},
    sources::TileUrlSource,
    tile_loader::CachedTileLoader,
  },
};

use super::{Layer, LayerId, LayerProperties, drawable::Drawable as _};

/// Coordinate span of one MVT tile.
const MVT_EXTENT: f32 = 4096.;

/// One cadastre parcel: its outline and the raw register attributes.
pub struct ParcelFeature {
  geometry: Geometry<PixelCoordinate>,
  properties: FeatureProperties,
}

/// The parcel geometry layer. It is deliberately never visible: its fill and
/// stroke are a fixed fully-transparent style, and its only job is to answer
/// which parcel sits under a click.
pub struct ParcelLayer {
  receiver: std::sync::mpsc::Receiver<(Tile, Vec<ParcelFeature>)>,
  sender: std::sync::mpsc::Sender<(Tile, Vec<ParcelFeature>)>,
  loader: Arc<CachedTileLoader>,
  features: HashMap<Tile, Vec<ParcelFeature>>,
  in_flight_tiles: Arc<Mutex<HashSet<Tile>>>,
  ctx: egui::Context,
  layer_properties: LayerProperties,
  zoom_range: std::ops::RangeInclusive<u8>,
  extent: BoundingBox,
  request_zoom: u8,
}

const NAME: &str = "Cadastre parcels";

impl ParcelLayer {
  pub fn new(
    ctx: egui::Context,
    source: Arc<dyn TileUrlSource + Send + Sync>,
    cache_dir: Option<PathBuf>,
    zoom_range: std::ops::RangeInclusive<u8>,
    extent: BoundingBox,
  ) -> Self {
    let (sender, receiver) = std::sync::mpsc::channel();
    Self {
      receiver,
      sender,
      loader: Arc::new(CachedTileLoader::new(source, cache_dir)),
      features: HashMap::new(),
      in_flight_tiles: Arc::new(Mutex::new(HashSet::new())),
      ctx,
      layer_properties: LayerProperties::default(),
      zoom_range,
      extent,
      request_zoom: 0,
    }
  }

  fn get_tile(&self, tile: Tile) {
    if self.features.contains_key(&tile) {
      return;
    }

    {
      let mut in_flight = self.in_flight_tiles.lock().unwrap();
      if in_flight.contains(&tile) {
        return;
      }
      in_flight.insert(tile);
    }

    let sender = self.sender.clone();
    let loader = self.loader.clone();
    let ctx = self.ctx.clone();
    let in_flight_tiles = self.in_flight_tiles.clone();

    tokio::spawn(async move {
      match loader.tile_data(&tile).await {
        Ok(data) => {
          let features = decode_tile(tile, &data);
          if let Err(e) = sender.send((tile, features)) {
            error!("Failed to send parcel tile {tile:?}: {e}");
          }
          ctx.request_repaint();
        }
        Err(e) => {
          log::debug!("Failed to load parcel tile {tile:?}: {e}");
        }
      }
      in_flight_tiles.lock().unwrap().remove(&tile);
    });
  }

  fn collect_new_features(&mut self) {
    for (tile, features) in self.receiver.try_iter() {
      self.features.insert(tile, features);
    }
  }
}

/// Parses all layers of an MVT tile into parcel features in canvas
/// coordinates. Undecodable tiles yield nothing, matching how a missing
/// raster tile just stays blank.
fn decode_tile(tile: Tile, data: &[u8]) -> Vec<ParcelFeature> {
  let reader = match mvt_reader::Reader::new(data.to_vec()) {
    Ok(reader) => reader,
    Err(e) => {
      log::warn!("Failed to parse MVT tile {tile:?}: {e:?}");
      return Vec::new();
    }
  };

  let layer_count = reader.get_layer_names().map_or(0, |names| names.len());
  let (tile_nw, tile_se) = tile.position();
  let scale = (tile_se.x - tile_nw.x) / MVT_EXTENT;

  let mut parcels = Vec::new();
  for layer_index in 0..layer_count {
    let Ok(features) = reader.get_features(layer_index) else {
      log::warn!("Failed to read features of MVT tile {tile:?} layer {layer_index}");
      continue;
    };

    for feature in features {
      let Some(geometry) = convert_geometry(&feature.geometry, tile_nw, scale) else {
        continue;
      };
      let properties = feature
        .properties
        .map(convert_properties)
        .unwrap_or_default();
      parcels.push(ParcelFeature {
        geometry,
        properties,
      });
    }
  }
  parcels
}

fn convert_point(point: geo_types::Coord<f32>, origin: PixelCoordinate, scale: f32) -> PixelCoordinate {
  PixelCoordinate::new(origin.x + point.x * scale, origin.y + point.y * scale)
}

fn convert_geometry(
  geometry: &geo_types::Geometry<f32>,
  origin: PixelCoordinate,
  scale: f32,
) -> Option<Geometry<PixelCoordinate>> {
  let metadata = Metadata::default().with_style(INVISIBLE_STYLE);
  match geometry {
    geo_types::Geometry::Polygon(polygon) => Some(Geometry::Polygon(
      polygon
        .exterior()
        .coords()
        .map(|c| convert_point(*c, origin, scale))
        .collect(),
      metadata,
    )),
    geo_types::Geometry::MultiPolygon(multi) => Some(Geometry::GeometryCollection(
      multi
        .iter()
        .map(|polygon| {
          Geometry::Polygon(
            polygon
              .exterior()
              .coords()
              .map(|c| convert_point(*c, origin, scale))
              .collect(),
            Metadata::default(),
          )
        })
        .collect(),
      metadata,
    )),
    geo_types::Geometry::LineString(line) => Some(Geometry::LineString(
      line.coords().map(|c| convert_point(*c, origin, scale)).collect(),
      metadata,
    )),
    geo_types::Geometry::Point(point) => Some(Geometry::Point(
      convert_point(point.0, origin, scale),
      metadata,
    )),
    _ => None,
  }
}

fn convert_properties(
  properties: HashMap<String, mvt_reader::feature::Value>,
) -> FeatureProperties {
  properties
    .into_iter()
    .map(|(key, value)| (key, convert_value(value)))
    .collect()
}

fn convert_value(value: mvt_reader::feature::Value) -> Value {
  use mvt_reader::feature::Value as MvtValue;
  match value {
    MvtValue::String(s) => Value::String(s),
    MvtValue::Float(f) => serde_json::Number::from_f64(f64::from(f)).map_or(Value::Null, Value::Number),
    MvtValue::Double(d) => serde_json::Number::from_f64(d).map_or(Value::Null, Value::Number),
    MvtValue::Int(i) | MvtValue::SInt(i) => Value::Number(i.into()),
    MvtValue::UInt(u) => Value::Number(u.into()),
    MvtValue::Bool(b) => Value::Bool(b),
    _ => Value::Null,
  }
}

impl Layer for ParcelLayer {
  fn id(&self) -> LayerId {
    LayerId::CadastreParcels
  }

  fn name(&self) -> &str {
    NAME
  }

  #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
  fn draw(&mut self, ui: &mut Ui, transform: &Transform, rect: Rect) {
    self.collect_new_features();

    if !self.visible() {
      return;
    }

    let (width, height) = (rect.width(), rect.height());
    let calculated_zoom = (transform.zoom * (width.max(height) / TILE_SIZE)).log2() as u8 + 2;
    if calculated_zoom < *self.zoom_range.start() {
      return;
    }
    self.request_zoom = calculated_zoom.min(*self.zoom_range.end());

    let inv = transform.invert();
    let min_pos = TileCoordinate::from_pixel_position(inv.apply(rect.min.into()), self.request_zoom);
    let max_pos = TileCoordinate::from_pixel_position(inv.apply(rect.max.into()), self.request_zoom);

    for tile in tiles_in_box(min_pos, max_pos) {
      let (nw, se) = tile.position();
      if self.extent.intersects(&BoundingBox::from_iterator([nw, se]))
        && !self.features.contains_key(&tile)
      {
        self.get_tile(tile);
      }

      if let Some(features) = self.features.get(&tile) {
        for feature in features {
          feature.geometry.draw(&ui.painter_at(rect), transform);
        }
      }
    }
  }

  fn visible(&self) -> bool {
    self.layer_properties.visible
  }

  fn visible_mut(&mut self) -> &mut bool {
    &mut self.layer_properties.visible
  }

  fn feature_at(&self, pos: Pos2, transform: &Transform) -> Option<FeatureProperties> {
    if !self.visible() || self.request_zoom == 0 {
      return None;
    }

    let coord = transform.invert().apply(pos.into()).as_pixel_coordinate();
    let tile = Tile::from(TileCoordinate::from_pixel_position(coord, self.request_zoom));
    self
      .features
      .get(&tile)?
      .iter()
      .find(|feature| feature.geometry.contains(coord))
      .map(|feature| feature.properties.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mvt_values_become_json_scalars() {
    use mvt_reader::feature::Value as MvtValue;
    assert_eq!(
      convert_value(MvtValue::String("Dupont".to_string())),
      Value::String("Dupont".to_string())
    );
    assert_eq!(convert_value(MvtValue::UInt(250)), Value::Number(250.into()));
    assert_eq!(convert_value(MvtValue::Bool(true)), Value::Bool(true));
    assert_eq!(convert_value(MvtValue::Double(1.5)), serde_json::json!(1.5));
  }

  #[test]
  fn tile_local_coordinates_scale_to_canvas() {
    let origin = PixelCoordinate::new(100., 200.);
    let converted = convert_point(geo_types::Coord { x: 2048., y: 4096. }, origin, 2. / MVT_EXTENT);
    assert!((converted.x - 101.).abs() < 1e-6);
    assert!((converted.y - 202.).abs() < 1e-6);
  }

  #[test]
  fn polygons_keep_their_attributes() {
    let polygon = geo_types::Geometry::Polygon(geo_types::Polygon::new(
      geo_types::LineString::from(vec![(0., 0.), (10., 0.), (10., 10.), (0., 10.)]),
      vec![],
    ));
    let geometry = convert_geometry(&polygon, PixelCoordinate::new(0., 0.), 1.).unwrap();
    assert!(geometry.contains(PixelCoordinate::new(5., 5.)));
    assert!(!geometry.contains(PixelCoordinate::new(15., 5.)));
  }
}
