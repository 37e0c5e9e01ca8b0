use std::{ops::RangeInclusive, sync::Arc};

use egui::{InputState, PointerButton, Rect, Response, Sense, Ui, Widget};
use log::debug;

use crate::{
  config::Config,
  feature_info::{self, DisplayRow},
};

use helpers::{MAX_ZOOM, MIN_ZOOM, fit_box_with_padding, fit_to_screen, set_coordinate_to_pixel};
use layer::{AlmanacLayer, Layer, ParcelLayer, RasterLayer};

use super::{
  coordinates::{BoundingBox, PixelCoordinate, PixelPosition, Transform, mercator_resolution},
  sources::{WfsSource, WmsSource, XyzSource},
};

mod helpers;
mod layer;

pub use layer::LayerId;

/// Zoom levels the geo server has cadastre content for.
const OVERLAY_ZOOM_RANGE: RangeInclusive<u8> = 12..=20;
/// Pixel padding around the extent when fitting the view.
const FIT_PADDING_PX: f32 = 50.;
/// Default opacity of the WMS cadastre overlay.
pub const DEFAULT_WMS_OPACITY: f32 = 0.5;

/// The map widget: the transform, the five-layer stack and the feature
/// inspection state. One instance is constructed at startup and owned by
/// the application.
pub struct Map {
  transform: Transform,
  layers: Vec<Box<dyn Layer>>,
  /// The historical image layer is kept out of the stack until the first
  /// render pass has completed, so it cannot block the initial paint.
  deferred_layer: Option<Box<dyn Layer>>,
  extent: BoundingBox,
  ctx: egui::Context,
  first_render_done: bool,
  initial_resolution: Option<f64>,
  feature_info: Option<Vec<DisplayRow>>,
}

impl Map {
  #[must_use]
  pub fn new(ctx: egui::Context, config: &Config) -> Self {
    let extent = BoundingBox::from_mercator_extent(config.extent);
    let cache = config.tile_cache_dir.clone();

    let base_layer = RasterLayer::new(
      ctx.clone(),
      LayerId::Base,
      "Base map",
      Arc::new(XyzSource::new(config.base_tile_url.clone())),
      cache.clone(),
      0..=19,
    );

    let historical_layer = RasterLayer::new(
      ctx.clone(),
      LayerId::HistoricalImage,
      "Cadastre image",
      Arc::new(
        XyzSource::new(config.historical_tile_url.clone())
          .with_attribution(config.historical_attribution.clone()),
      ),
      cache.clone(),
      OVERLAY_ZOOM_RANGE,
    )
    .with_extent(extent);

    let wms_layer = RasterLayer::new(
      ctx.clone(),
      LayerId::CadastreWms,
      "Cadastre overlay",
      Arc::new(WmsSource::new(
        config.wms_endpoint.clone(),
        config.wms_layer.clone(),
      )),
      cache.clone(),
      OVERLAY_ZOOM_RANGE,
    )
    .with_extent(extent)
    .with_opacity(DEFAULT_WMS_OPACITY);

    let parcel_layer = ParcelLayer::new(
      ctx.clone(),
      Arc::new(XyzSource::new(config.parcel_tile_url.clone())),
      cache,
      OVERLAY_ZOOM_RANGE,
      extent,
    );

    let almanac_layer = AlmanacLayer::new(
      ctx.clone(),
      &WfsSource::new(
        config.wfs_endpoint.clone(),
        config.almanac_type_name.clone(),
      ),
    );

    Self {
      transform: Transform::invalid(),
      layers: vec![
        Box::new(base_layer),
        Box::new(wms_layer),
        Box::new(parcel_layer),
        Box::new(almanac_layer),
      ],
      deferred_layer: Some(Box::new(historical_layer)),
      extent,
      ctx,
      first_render_done: false,
      initial_resolution: None,
      feature_info: None,
    }
  }

  fn layer(&self, id: LayerId) -> Option<&dyn Layer> {
    self
      .layers
      .iter()
      .chain(self.deferred_layer.as_ref())
      .find(|l| l.id() == id)
      .map(AsRef::as_ref)
  }

  fn layer_mut(&mut self, id: LayerId) -> Option<&mut (dyn Layer + 'static)> {
    self
      .layers
      .iter_mut()
      .chain(self.deferred_layer.as_mut())
      .find(|l| l.id() == id)
      .map(AsMut::as_mut)
  }

  pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) {
    if let Some(layer) = self.layer_mut(id) {
      layer.set_visible(visible);
    }
  }

  #[must_use]
  pub fn layer_visible(&self, id: LayerId) -> bool {
    self.layer(id).is_some_and(|l| l.visible())
  }

  pub fn set_layer_opacity(&mut self, id: LayerId, opacity: f32) {
    if let Some(layer) = self.layer_mut(id) {
      layer.set_opacity(opacity);
    }
  }

  #[must_use]
  pub fn layer_opacity(&self, id: LayerId) -> f32 {
    self.layer(id).map_or(1.0, |l| l.opacity())
  }

  /// The display resolution after the initial fit, in meters per pixel.
  /// Yields a value exactly once, after the first stable render.
  pub fn take_initial_resolution(&mut self) -> Option<f64> {
    self.initial_resolution.take()
  }

  /// The attribute rows of the last inspected feature, if a feature is
  /// currently selected.
  #[must_use]
  pub fn feature_info(&self) -> Option<&[DisplayRow]> {
    self.feature_info.as_deref()
  }

  pub fn clear_feature_info(&mut self) {
    self.feature_info = None;
  }

  /// Queries the layer stack top-down at the clicked position and turns the
  /// first hit into display rows. A click that hits nothing describable
  /// clears the selection, which hides the panel.
  fn handle_click(&mut self, pos: egui::Pos2) {
    let properties = self
      .layers
      .iter()
      .rev()
      .find_map(|layer| layer.feature_at(pos, &self.transform));

    self.feature_info = match properties {
      Some(properties) => {
        let rows = feature_info::inspect(&properties);
        if rows.is_empty() { None } else { Some(rows) }
      }
      None => None,
    };
  }

  fn handle_keys(&mut self, events: impl Iterator<Item = egui::Event>, rect: Rect) {
    for event in events {
      if let egui::Event::Key {
        key,
        pressed: true,
        modifiers,
        ..
      } = event
      {
        match key {
          egui::Key::ArrowDown => {
            let _ = self.transform.translate(PixelPosition { x: 0., y: -10. });
          }
          egui::Key::ArrowLeft => {
            let _ = self.transform.translate(PixelPosition { x: 10., y: 0. });
          }
          egui::Key::ArrowRight => {
            let _ = self.transform.translate(PixelPosition { x: -10., y: 0. });
          }
          egui::Key::ArrowUp => {
            let _ = self.transform.translate(PixelPosition { x: 0., y: 10. });
          }

          egui::Key::Minus => {
            self.zoom_with_center(0.9, rect.center().into());
          }
          egui::Key::Plus | egui::Key::Equals => {
            self.zoom_with_center(1. / 0.9, rect.center().into());
          }

          egui::Key::F => {
            fit_box_with_padding(&mut self.transform, &self.extent, rect, FIT_PADDING_PX);
          }
          _ => {
            debug!("Unhandled key pressed: {key:?} {modifiers:?}");
          }
        }
      }
    }
  }

  fn handle_mouse_wheel(&mut self, ui: &Ui, response: &Response) {
    if response.hovered() {
      let delta = ui
        .input(|i| {
          i.events
            .iter()
            .find_map(move |e| match e {
              egui::Event::MouseWheel {
                unit: _,
                delta,
                modifiers: _,
                phase: _,
              } => Some(delta),
              _ => None,
            })
            .copied()
        })
        .map(|d| (d.y / 1. + 1.).clamp(0.8, 1.4).sqrt());
      if let Some(delta) = delta {
        let cursor = response.hover_pos().unwrap_or_default().into();
        self.zoom_with_center(delta, cursor);
      }
    }
  }

  fn zoom_with_center(&mut self, delta: f32, center: PixelPosition) {
    if self.transform.zoom * delta < MIN_ZOOM || self.transform.zoom * delta > MAX_ZOOM {
      return;
    }
    let hover_coord: PixelCoordinate = self.transform.invert().apply(center);
    self.transform.zoom(delta);
    set_coordinate_to_pixel(hover_coord, center, &mut self.transform);
  }

  /// Runs once after the first render pass: the historical image layer
  /// joins the stack, the view fits the cadastre extent, and the display
  /// resolution is recorded for the one-shot legend refresh.
  fn finish_first_render(&mut self, rect: Rect) {
    if let Some(layer) = self.deferred_layer.take() {
      let index = 1.min(self.layers.len());
      self.layers.insert(index, layer);
    }

    fit_box_with_padding(&mut self.transform, &self.extent, rect, FIT_PADDING_PX);
    self.initial_resolution = Some(mercator_resolution(self.transform.zoom));
    self.first_render_done = true;
    self.ctx.request_repaint();
  }
}

impl Widget for &mut Map {
  fn ui(self, ui: &mut Ui) -> Response {
    let size = ui.available_size();
    let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

    if self.transform.is_invalid() {
      fit_to_screen(&mut self.transform, &rect);
      set_coordinate_to_pixel(self.extent.center(), rect.center().into(), &mut self.transform);
    }

    self.handle_mouse_wheel(ui, &response);

    let events = ui.input(|i: &InputState| {
      i.events
        .iter()
        .filter(|e| matches!(e, egui::Event::Key { .. }))
        .cloned()
        .collect::<Vec<_>>()
    });
    self.handle_keys(events.into_iter(), rect);

    if response.clicked() {
      if let Some(pos) = response.interact_pointer_pos() {
        self.handle_click(pos);
      }
    }

    if response.dragged() && response.dragged_by(PointerButton::Primary) {
      self.transform.translate(PixelPosition {
        x: response.drag_delta().x,
        y: response.drag_delta().y,
      });
    }

    fit_to_screen(&mut self.transform, &rect);

    if ui.is_rect_visible(rect) {
      for layer in &mut self.layers {
        layer.draw(ui, &self.transform, rect);
      }
    }

    if !self.first_render_done {
      self.finish_first_render(rect);
    }

    response
  }
}
