use std::{
  collections::{HashMap, HashSet},
  ops::RangeInclusive,
  path::PathBuf,
  sync::{Arc, Mutex},
};

use anyhow::{Context as _, Result};
use egui::{Color32, ColorImage, Rect, Ui};
use log::error;

use crate::map::{
  coordinates::{BoundingBox, TILE_SIZE, Tile, TileCoordinate, Transform, tiles_in_box},
  sources::TileUrlSource,
  tile_loader::CachedTileLoader,
};

use super::{Layer, LayerId, LayerProperties};

/// A layer that loads and draws raster tiles from one remote source.
///
/// All three raster layers of the stack (base map, historical image, WMS
/// overlay) are instances of this with different sources, zoom ranges and
/// extents.
pub struct RasterLayer {
  id: LayerId,
  name: &'static str,
  receiver: std::sync::mpsc::Receiver<(Tile, ColorImage)>,
  sender: std::sync::mpsc::Sender<(Tile, ColorImage)>,
  loader: Arc<CachedTileLoader>,
  loaded_tiles: HashMap<Tile, egui::TextureHandle>,
  in_flight_tiles: Arc<Mutex<HashSet<Tile>>>,
  ctx: egui::Context,
  layer_properties: LayerProperties,
  zoom_range: RangeInclusive<u8>,
  extent: Option<BoundingBox>,
}

impl RasterLayer {
  pub fn new(
    ctx: egui::Context,
    id: LayerId,
    name: &'static str,
    source: Arc<dyn TileUrlSource + Send + Sync>,
    cache_dir: Option<PathBuf>,
    zoom_range: RangeInclusive<u8>,
  ) -> Self {
    let (sender, receiver) = std::sync::mpsc::channel();
    Self {
      id,
      name,
      receiver,
      sender,
      loader: Arc::new(CachedTileLoader::new(source, cache_dir)),
      loaded_tiles: HashMap::new(),
      in_flight_tiles: Arc::new(Mutex::new(HashSet::new())),
      ctx,
      layer_properties: LayerProperties::default(),
      zoom_range,
      extent: None,
    }
  }

  /// Restricts tile loading and drawing to the given extent.
  #[must_use]
  pub fn with_extent(mut self, extent: BoundingBox) -> Self {
    self.extent = Some(extent);
    self
  }

  #[must_use]
  pub fn with_opacity(mut self, opacity: f32) -> Self {
    self.layer_properties.opacity = opacity;
    self
  }

  fn get_tile(&self, tile: Tile) {
    if self.loaded_tiles.contains_key(&tile) {
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
      let image = match loader.tile_data(&tile).await.and_then(|data| decode_tile(&data)) {
        Ok(image) => image,
        Err(e) => {
          // A failed tile just stays absent; the server owns retries.
          log::debug!("Failed to load tile {tile:?}: {e}");
          in_flight_tiles.lock().unwrap().remove(&tile);
          return;
        }
      };

      if let Err(e) = sender.send((tile, image)) {
        error!("Failed to send tile {tile:?}: {e}");
      }
      in_flight_tiles.lock().unwrap().remove(&tile);
      ctx.request_repaint();
    });
  }

  fn collect_new_tile_data(&mut self, ui: &Ui) {
    for (tile, image) in self.receiver.try_iter() {
      let handle = ui.ctx().load_texture(
        format!("{}-{}-{}-{}", self.name, tile.zoom, tile.x, tile.y),
        image,
        egui::TextureOptions::default(),
      );
      self.loaded_tiles.insert(tile, handle);
    }
  }

  fn draw_tile(&self, ui: &Ui, rect: Rect, tile: &Tile, transform: &Transform) -> bool {
    if let Some(image_data) = self.loaded_tiles.get(tile) {
      let (nw, se) = tile.position();
      let (nw, se) = (transform.apply(nw), transform.apply(se));
      let tile_rect = Rect::from_min_max(nw.into(), se.into());

      ui.painter_at(rect).image(
        image_data.id(),
        tile_rect,
        Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        Color32::WHITE.gamma_multiply(self.layer_properties.opacity),
      );
      return true;
    }
    false
  }

  fn tile_in_extent(&self, tile: Tile) -> bool {
    self.extent.is_none_or(|extent| {
      let (nw, se) = tile.position();
      extent.intersects(&BoundingBox::from_iterator([nw, se]))
    })
  }
}

fn decode_tile(data: &[u8]) -> Result<ColorImage> {
  let img = image::ImageReader::new(std::io::Cursor::new(data))
    .with_guessed_format()
    .context("Failed to create image reader")?
    .decode()
    .context("Failed to decode image")?;

  let size = [img.width() as usize, img.height() as usize];
  let image_buffer = img.to_rgba8();
  let pixels = image_buffer.as_flat_samples();
  Ok(ColorImage::from_rgba_unmultiplied(size, pixels.as_slice()))
}

impl Layer for RasterLayer {
  fn id(&self) -> LayerId {
    self.id
  }

  fn name(&self) -> &str {
    self.name
  }

  #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
  fn draw(&mut self, ui: &mut Ui, transform: &Transform, rect: Rect) {
    self.collect_new_tile_data(ui);

    if !self.visible() {
      return;
    }

    let (width, height) = (rect.width(), rect.height());
    let calculated_zoom = (transform.zoom * (width.max(height) / TILE_SIZE)).log2() as u8 + 2;
    if calculated_zoom < *self.zoom_range.start() {
      // The source has nothing at this zoom; the overlay only appears once
      // the view is close enough.
      return;
    }
    let request_zoom = calculated_zoom.min(*self.zoom_range.end());

    let inv = transform.invert();
    let min_pos = TileCoordinate::from_pixel_position(inv.apply(rect.min.into()), request_zoom);
    let max_pos = TileCoordinate::from_pixel_position(inv.apply(rect.max.into()), request_zoom);

    for tile in tiles_in_box(min_pos, max_pos) {
      if self.tile_in_extent(tile) && !self.loaded_tiles.contains_key(&tile) {
        self.get_tile(tile);
      }
    }

    // Draw parent tiles if detailed tiles are not available yet. Coarser tiles are drawn first to
    // have detailed textures visible on top.
    let mut tiles_to_draw = tiles_in_box(min_pos, max_pos)
      .filter(|tile| self.tile_in_extent(*tile))
      .filter_map(|mut tile| {
        while !self.loaded_tiles.contains_key(&tile) {
          tile = tile.parent()?;
        }
        Some(tile)
      })
      .collect::<Vec<_>>();
    tiles_to_draw.sort_unstable_by_key(|tile| tile.zoom);
    tiles_to_draw.dedup();

    for tile in tiles_to_draw {
      self.draw_tile(ui, rect, &tile, transform);
    }
  }

  fn visible(&self) -> bool {
    self.layer_properties.visible
  }

  fn visible_mut(&mut self) -> &mut bool {
    &mut self.layer_properties.visible
  }

  fn opacity(&self) -> f32 {
    self.layer_properties.opacity
  }

  fn set_opacity(&mut self, opacity: f32) {
    self.layer_properties.opacity = opacity;
  }
}
