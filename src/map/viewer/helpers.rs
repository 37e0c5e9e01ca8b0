use egui::Rect;

use crate::map::coordinates::{BoundingBox, PixelCoordinate, PixelPosition, Transform};

pub const MAX_ZOOM: f32 = 524_288.;
pub const MIN_ZOOM: f32 = 1.;

/// Sets a coordinate to the position in the map.
pub(crate) fn set_coordinate_to_pixel(
  coord: PixelCoordinate,
  cursor: PixelPosition,
  transform: &mut Transform,
) {
  let current_pos_in_gui = coordinate_to_point(coord, transform);
  transform.translate(current_pos_in_gui * (-1.) + cursor);
}

/// Converts a coordinate to a point.
pub(crate) fn coordinate_to_point(point: PixelCoordinate, transform: &Transform) -> PixelPosition {
  transform.apply(point)
}

/// Sets reasonable zoom defaults.
pub(crate) fn fit_to_screen(transform: &mut Transform, rect: &Rect) {
  transform.zoom = transform.zoom.clamp(MIN_ZOOM, MAX_ZOOM);

  let inv = transform.invert();
  let PixelCoordinate { x, y } = inv.apply(PixelPosition { x: 0., y: 0. });
  if x < 0. || y < 0. {
    transform.translate(
      PixelPosition {
        x: (x.min(0.)),
        y: (y.min(0.)),
      } * transform.zoom,
    );
  }

  let PixelCoordinate { x, y } = inv.apply(PixelPosition {
    x: rect.max.x,
    y: rect.max.y,
  });
  if x > 2000. || y > 2000. {
    transform.translate(
      PixelPosition {
        x: (x - 2000.).max(0.),
        y: (y - 2000.).max(0.),
      } * transform.zoom,
    );
  }
}

/// Fits a bounding box into the view, leaving `padding` pixels around the
/// edges. The change is applied instantly, without animation.
pub(crate) fn fit_box_with_padding(
  transform: &mut Transform,
  bb: &BoundingBox,
  rect: Rect,
  padding: f32,
) {
  if !bb.is_valid() {
    return;
  }

  let usable_width = (rect.width() - 2. * padding).max(1.);
  let usable_height = (rect.height() - 2. * padding).max(1.);
  let width_zoom = usable_width / (bb.width() * transform.zoom);
  let height_zoom = usable_height / (bb.height() * transform.zoom);
  transform.zoom(width_zoom.min(height_zoom));
  set_coordinate_to_pixel(bb.center(), rect.center().into(), transform);
}
