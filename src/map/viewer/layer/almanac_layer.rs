use std::sync::mpsc::{Receiver, Sender};

use egui::{Color32, Pos2, Rect, Ui};
use log::{error, warn};
use serde_json::Value;

use crate::{
  feature_info::FeatureProperties,
  map::{
    coordinates::{PixelCoordinate, Transform, WebMercatorCoordinate},
    geometry_collection::{Geometry, Metadata, Style},
    sources::WfsSource,
  },
};

use super::{Layer, LayerId, LayerProperties, drawable::Drawable as _};

/// Screen-space pick radius for almanac points.
const HIT_TOLERANCE_PX: f32 = 8.0;

/// One almanac resident: a point on the map plus the register attributes.
struct AlmanacEntry {
  geometry: Geometry<PixelCoordinate>,
  coord: PixelCoordinate,
  properties: FeatureProperties,
}

/// The almanac resident points, fetched once from the WFS endpoint at
/// startup. A failed fetch leaves the layer empty; there is no retry.
pub struct AlmanacLayer {
  receiver: Receiver<Vec<AlmanacEntry>>,
  entries: Vec<AlmanacEntry>,
  layer_properties: LayerProperties,
}

const NAME: &str = "Almanac 1832";

fn point_style() -> Style {
  Style::default()
    .with_color(Color32::from_gray(169))
    .with_fill_color(Color32::WHITE)
}

impl AlmanacLayer {
  #[must_use]
  pub fn new(ctx: egui::Context, source: &WfsSource) -> Self {
    let (sender, receiver) = std::sync::mpsc::channel();
    Self::fetch(ctx, source.get_feature_url(), sender);

    Self {
      receiver,
      entries: Vec::new(),
      layer_properties: LayerProperties::default(),
    }
  }

  fn fetch(ctx: egui::Context, url: String, sender: Sender<Vec<AlmanacEntry>>) {
    tokio::spawn(async move {
      let body = match surf::get(&url).recv_string().await {
        Ok(body) => body,
        Err(e) => {
          error!("Failed to fetch almanac features: {e}");
          return;
        }
      };

      match parse_feature_collection(&body) {
        Ok(entries) => {
          let _ = sender.send(entries);
          ctx.request_repaint();
        }
        Err(e) => error!("Failed to parse almanac features: {e}"),
      }
    });
  }

  fn collect_new_entries(&mut self) {
    for entries in self.receiver.try_iter() {
      self.entries = entries;
    }
  }
}

/// Parses the WFS GetFeature response, a GeoJSON `FeatureCollection` of
/// points in EPSG:900913. Features without a point geometry are skipped.
fn parse_feature_collection(body: &str) -> anyhow::Result<Vec<AlmanacEntry>> {
  let root: Value = serde_json::from_str(body)?;
  let features = root
    .get("features")
    .and_then(Value::as_array)
    .ok_or_else(|| anyhow::anyhow!("Missing 'features' array"))?;

  let mut entries = Vec::with_capacity(features.len());
  for feature in features {
    let Some(coord) = parse_point(feature.get("geometry")) else {
      warn!("Skipping almanac feature without point geometry");
      continue;
    };

    let properties = feature
      .get("properties")
      .and_then(Value::as_object)
      .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
      .unwrap_or_default();

    entries.push(AlmanacEntry {
      geometry: Geometry::Point(coord, Metadata::default().with_style(point_style())),
      coord,
      properties,
    });
  }
  Ok(entries)
}

fn parse_point(geometry: Option<&Value>) -> Option<PixelCoordinate> {
  let obj = geometry?.as_object()?;
  if obj.get("type")?.as_str()? != "Point" {
    return None;
  }
  let coordinates = obj.get("coordinates")?.as_array()?;
  let x = coordinates.first()?.as_f64()?;
  let y = coordinates.get(1)?.as_f64()?;
  Some(WebMercatorCoordinate::new(x, y).into())
}

impl Layer for AlmanacLayer {
  fn id(&self) -> LayerId {
    LayerId::Almanac
  }

  fn name(&self) -> &str {
    NAME
  }

  fn draw(&mut self, ui: &mut Ui, transform: &Transform, rect: Rect) {
    self.collect_new_entries();

    if !self.visible() {
      return;
    }

    let painter = ui.painter_at(rect);
    for entry in &self.entries {
      entry.geometry.draw(&painter, transform);
    }
  }

  fn visible(&self) -> bool {
    self.layer_properties.visible
  }

  fn visible_mut(&mut self) -> &mut bool {
    &mut self.layer_properties.visible
  }

  fn feature_at(&self, pos: Pos2, transform: &Transform) -> Option<FeatureProperties> {
    if !self.visible() {
      return None;
    }

    let mut closest: Option<(f32, &AlmanacEntry)> = None;
    for entry in &self.entries {
      let screen: Pos2 = transform.apply(entry.coord).into();
      let dist_sq = (screen - pos).length_sq();
      if dist_sq <= HIT_TOLERANCE_PX * HIT_TOLERANCE_PX
        && closest.is_none_or(|(best, _)| dist_sq < best)
      {
        closest = Some((dist_sq, entry));
      }
    }
    closest.map(|(_, entry)| entry.properties.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"{
    "type": "FeatureCollection",
    "features": [
      {
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [740000.0, 5870000.0] },
        "properties": { "field_1": "7", "nom": "Rossier", "metier": "horloger" }
      },
      {
        "type": "Feature",
        "geometry": null,
        "properties": { "field_1": "8" }
      }
    ]
  }"#;

  #[test]
  fn parses_points_and_properties() {
    let entries = parse_feature_collection(SAMPLE).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
      entries[0].properties.get("nom"),
      Some(&Value::String("Rossier".to_string()))
    );

    let expected: PixelCoordinate = WebMercatorCoordinate::new(740_000., 5_870_000.).into();
    assert!((entries[0].coord.x - expected.x).abs() < 1e-6);
    assert!((entries[0].coord.y - expected.y).abs() < 1e-6);
  }

  #[test]
  fn rejects_documents_without_features() {
    assert!(parse_feature_collection("{}").is_err());
    assert!(parse_feature_collection("not json").is_err());
  }
}
