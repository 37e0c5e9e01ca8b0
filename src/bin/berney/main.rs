use berney::{app::App, config::Config, map::viewer::Map};

fn main() -> eframe::Result {
  // init logger.
  env_logger::init();

  // Tokio runtime.
  let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
  let _enter = rt.enter();

  let options = eframe::NativeOptions {
    viewport: egui::ViewportBuilder {
      inner_size: Some(egui::vec2(1280.0, 900.0)),
      clamp_size_to_monitor_size: Some(true),
      ..Default::default()
    },
    ..Default::default()
  };

  eframe::run_native(
    "berney",
    options,
    Box::new(|cc| {
      // Image support, used for the legend graphic.
      egui_extras::install_image_loaders(&cc.egui_ctx);

      let config = Config::new();
      let map = Map::new(cc.egui_ctx.clone(), &config);
      Ok(Box::new(App::new(map, &config)))
    }),
  )
}
