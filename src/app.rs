use egui::Widget as _;

use crate::{
  config::Config,
  feature_info::DisplayRow,
  map::{
    sources::WmsSource,
    viewer::{DEFAULT_WMS_OPACITY, LayerId, Map},
  },
};

/// Fade-out time of the feature-info panel. The panel is only hidden once
/// the fade has completed.
const FEATURE_INFO_FADE_S: f32 = 0.1;
/// Fade time of the help popover.
const HELP_FADE_S: f32 = 0.3;

/// The state of the sidebar controls. Each checkbox drives exactly one
/// layer set; the cadastre checkbox drives the WMS overlay, the parcel
/// hit-test layer and the legend together.
struct LayerControls {
  base: bool,
  historical: bool,
  cadastre: bool,
  almanac: bool,
  wms_opacity: f32,
  legend_visible: bool,
}

impl Default for LayerControls {
  fn default() -> Self {
    Self {
      base: true,
      historical: true,
      cadastre: true,
      almanac: true,
      wms_opacity: DEFAULT_WMS_OPACITY,
      legend_visible: true,
    }
  }
}

/// Holds the UI state of the viewer: the map, the sidebar controls, the
/// legend and the two fading panels.
pub struct App {
  map: Map,
  controls: LayerControls,
  wms_source: WmsSource,
  legend_url: Option<String>,
  info_rows: Vec<DisplayRow>,
  help_open: bool,
}

impl App {
  #[must_use]
  pub fn new(map: Map, config: &Config) -> Self {
    Self {
      map,
      controls: LayerControls::default(),
      wms_source: WmsSource::new(config.wms_endpoint.clone(), config.wms_layer.clone()),
      legend_url: None,
      info_rows: Vec::new(),
      help_open: false,
    }
  }

  #[must_use]
  pub fn map(&self) -> &Map {
    &self.map
  }

  pub fn set_base_visible(&mut self, visible: bool) {
    self.controls.base = visible;
    self.map.set_layer_visible(LayerId::Base, visible);
  }

  pub fn set_historical_visible(&mut self, visible: bool) {
    self.controls.historical = visible;
    self.map.set_layer_visible(LayerId::HistoricalImage, visible);
  }

  /// One action flips the whole cadastre set: the WMS overlay, the parcel
  /// hit-test layer and the legend never end up in a partial state.
  pub fn set_cadastre_visible(&mut self, visible: bool) {
    self.controls.cadastre = visible;
    self.map.set_layer_visible(LayerId::CadastreWms, visible);
    self.map.set_layer_visible(LayerId::CadastreParcels, visible);
    self.controls.legend_visible = visible;
  }

  pub fn set_almanac_visible(&mut self, visible: bool) {
    self.controls.almanac = visible;
    self.map.set_layer_visible(LayerId::Almanac, visible);
  }

  /// Applies the slider value as-is, without rounding.
  pub fn set_wms_opacity(&mut self, opacity: f32) {
    self.controls.wms_opacity = opacity;
    self.map.set_layer_opacity(LayerId::CadastreWms, opacity);
  }

  #[must_use]
  pub fn legend_visible(&self) -> bool {
    self.controls.legend_visible
  }

  /// The legend graphic URL, available after the first stable render.
  #[must_use]
  pub fn legend_url(&self) -> Option<&str> {
    self.legend_url.as_deref()
  }

  fn show_sidebar(&mut self, ctx: &egui::Context) {
    egui::SidePanel::left("controls")
      .default_width(260.0)
      .show(ctx, |ui| {
        ui.horizontal(|ui| {
          ui.heading("Layers");
          if ui.button("?").on_hover_text("About this map").clicked() {
            self.help_open = !self.help_open;
          }
        });
        ui.separator();

        let mut base = self.controls.base;
        if ui.checkbox(&mut base, "Base map").changed() {
          self.set_base_visible(base);
        }

        let mut historical = self.controls.historical;
        if ui.checkbox(&mut historical, "Cadastre image").changed() {
          self.set_historical_visible(historical);
        }

        let mut cadastre = self.controls.cadastre;
        if ui.checkbox(&mut cadastre, "Cadastre overlay").changed() {
          self.set_cadastre_visible(cadastre);
        }

        let mut almanac = self.controls.almanac;
        if ui.checkbox(&mut almanac, "Almanac 1832").changed() {
          self.set_almanac_visible(almanac);
        }

        ui.separator();
        let mut opacity = self.controls.wms_opacity;
        if ui
          .add(egui::Slider::new(&mut opacity, 0.0..=1.0).text("Overlay opacity"))
          .changed()
        {
          self.set_wms_opacity(opacity);
        }

        if self.controls.legend_visible
          && let Some(url) = &self.legend_url
        {
          ui.separator();
          ui.label("Legend");
          ui.add(egui::Image::from_uri(url.clone()).max_width(ui.available_width()));
        }
      });
  }

  fn show_feature_info(&mut self, ctx: &egui::Context) {
    if let Some(rows) = self.map.feature_info() {
      self.info_rows = rows.to_vec();
    }

    let shown = self.map.feature_info().is_some();
    let opacity =
      ctx.animate_bool_with_time(egui::Id::new("feature-info-fade"), shown, FEATURE_INFO_FADE_S);
    if opacity <= 0.0 {
      return;
    }

    let mut close_requested = false;
    egui::Window::new("Feature")
      .collapsible(false)
      .resizable(false)
      .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
      .show(ctx, |ui| {
        ui.multiply_opacity(opacity);
        ui.set_min_width(250.0);

        egui::Grid::new("feature-rows").num_columns(2).show(ui, |ui| {
          for row in &self.info_rows {
            ui.label(format!("{}:", row.label));
            ui.label(&row.value);
            ui.end_row();
          }
        });

        ui.separator();
        if ui.button("Close").clicked() {
          close_requested = true;
        }
      });

    if close_requested {
      self.map.clear_feature_info();
    }
  }

  fn show_help(&mut self, ctx: &egui::Context) {
    let opacity = ctx.animate_bool_with_time(egui::Id::new("help-fade"), self.help_open, HELP_FADE_S);
    if opacity <= 0.0 {
      return;
    }

    let mut close_requested = false;
    egui::Window::new("About")
      .collapsible(false)
      .resizable(false)
      .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
      .show(ctx, |ui| {
        ui.multiply_opacity(opacity);
        ui.label(
          "The 1832 Berney cadastre of Lausanne and the residents almanac of \
           the same year, overlaid on a modern base map.",
        );
        ui.label("Click a parcel or a point to inspect its register entry.");
        ui.separator();
        if ui.button("Close").clicked() {
          close_requested = true;
        }
      });

    if close_requested {
      self.help_open = false;
    }
  }
}

impl eframe::App for App {
  fn ui(&mut self, ui: &mut egui::Ui, frame: &mut eframe::Frame) {
    let ctx = ui.ctx().clone();
    self.update(&ctx, frame);
  }

  fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
    self.show_sidebar(ctx);

    egui::CentralPanel::default()
      .frame(egui::Frame::NONE)
      .show(ctx, |ui| {
        (&mut self.map).ui(ui);
      });

    // The legend is computed exactly once, from the display resolution
    // right after the first stable render, not on later resolution changes.
    if let Some(resolution) = self.map.take_initial_resolution() {
      self.legend_url = Some(self.wms_source.legend_url(resolution));
    }

    self.show_feature_info(ctx);
    self.show_help(ctx);
  }
}
