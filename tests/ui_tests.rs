use berney::{
  app::App,
  config::Config,
  map::viewer::{LayerId, Map},
};
use eframe::App as _;
use egui_kittest::Harness;
use egui_kittest::kittest::Queryable;

fn create_test_app() -> App {
  let config = Config::new();
  let ctx = egui::Context::default();
  let map = Map::new(ctx, &config);
  App::new(map, &config)
}

fn create_harness(app: App) -> Harness<'static, App> {
  Harness::new_state(
    |ctx, app: &mut App| {
      let mut frame = eframe::Frame::_new_kittest();
      app.update(ctx, &mut frame);
    },
    app,
  )
}

#[tokio::test]
async fn sidebar_exposes_all_layer_controls() {
  let mut harness = create_harness(create_test_app());
  harness.run();

  harness.get_by_label("Layers");
  harness.get_by_label("Base map");
  harness.get_by_label("Cadastre image");
  harness.get_by_label("Cadastre overlay");
  harness.get_by_label("Almanac 1832");
}

#[tokio::test]
async fn all_layers_start_visible() {
  let app = create_test_app();

  for id in [
    LayerId::Base,
    LayerId::HistoricalImage,
    LayerId::CadastreWms,
    LayerId::CadastreParcels,
    LayerId::Almanac,
  ] {
    assert!(app.map().layer_visible(id), "{id:?} should start visible");
  }
  assert!(app.map().feature_info().is_none());
}

#[tokio::test]
async fn cadastre_toggle_flips_both_layers_and_the_legend() {
  let mut app = create_test_app();

  app.set_cadastre_visible(false);
  assert!(!app.map().layer_visible(LayerId::CadastreWms));
  assert!(!app.map().layer_visible(LayerId::CadastreParcels));
  assert!(!app.legend_visible());
  // The other layers are untouched.
  assert!(app.map().layer_visible(LayerId::Base));
  assert!(app.map().layer_visible(LayerId::Almanac));

  app.set_cadastre_visible(true);
  assert!(app.map().layer_visible(LayerId::CadastreWms));
  assert!(app.map().layer_visible(LayerId::CadastreParcels));
  assert!(app.legend_visible());
}

#[tokio::test]
async fn opacity_reaches_the_wms_layer_without_rounding() {
  let mut app = create_test_app();
  assert_eq!(app.map().layer_opacity(LayerId::CadastreWms), 0.5);

  app.set_wms_opacity(0.3);
  assert_eq!(app.map().layer_opacity(LayerId::CadastreWms), 0.3);
}

#[tokio::test]
async fn single_checkbox_toggles_stay_independent() {
  let mut app = create_test_app();

  app.set_base_visible(false);
  assert!(!app.map().layer_visible(LayerId::Base));
  assert!(app.map().layer_visible(LayerId::HistoricalImage));

  app.set_historical_visible(false);
  assert!(!app.map().layer_visible(LayerId::HistoricalImage));

  app.set_almanac_visible(false);
  assert!(!app.map().layer_visible(LayerId::Almanac));
  assert!(app.map().layer_visible(LayerId::CadastreWms));
}

#[tokio::test]
async fn legend_url_appears_after_the_first_render() {
  let app = create_test_app();
  assert!(app.legend_url().is_none());

  let mut harness = create_harness(app);
  harness.run();

  let url = harness
    .state()
    .legend_url()
    .expect("legend after first render")
    .to_string();
  assert!(url.contains("GetLegendGraphic"));
  assert!(url.contains("SCALE="));

  // The URL is computed once; further frames keep it unchanged.
  harness.run();
  assert_eq!(harness.state().legend_url(), Some(url.as_str()));
}
