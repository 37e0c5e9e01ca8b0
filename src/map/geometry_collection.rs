use std::iter::once;

use egui::Color32;
use itertools::Either;
use serde::{Deserialize, Serialize};

use super::coordinates::{BoundingBox, Coordinate, PixelCoordinate};

type Color = Color32;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Style {
  visible: bool,
  color: Option<Color>,
  fill_color: Option<Color>,
}

pub const DEFAULT_STYLE: Style = Style {
  color: Some(Color32::BLUE),
  fill_color: None,
  visible: true,
};

/// A style that draws nothing: no stroke, fully transparent fill. Used by
/// geometry that exists only to answer hit queries.
pub const INVISIBLE_STYLE: Style = Style {
  color: Some(Color32::TRANSPARENT),
  fill_color: Some(Color32::TRANSPARENT),
  visible: true,
};

impl Default for Style {
  fn default() -> Self {
    DEFAULT_STYLE.clone()
  }
}

impl Style {
  #[must_use]
  pub fn with_color(mut self, color: Color) -> Self {
    self.color = Some(color);
    self
  }

  #[must_use]
  pub fn with_fill_color(mut self, fill_color: Color) -> Self {
    self.fill_color = Some(fill_color);
    self
  }

  #[must_use]
  pub fn with_visible(mut self, visible: bool) -> Self {
    self.visible = visible;
    self
  }

  fn overwrite_with(&self, style: &Style) -> Style {
    Style {
      color: style.color.or(self.color),
      fill_color: style.fill_color.or(self.fill_color),
      visible: style.visible && self.visible,
    }
  }

  fn optional_overwrite_with(&self, style: Option<&Style>) -> Style {
    style.map_or_else(|| self.clone(), |s| self.overwrite_with(s))
  }

  #[must_use]
  pub fn color(&self) -> Color {
    self.color.unwrap_or(Color32::BLUE)
  }

  #[must_use]
  pub fn fill_color(&self) -> Color {
    self.fill_color.unwrap_or(Color32::TRANSPARENT)
  }
}

#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct Metadata {
  pub label: Option<String>,
  pub style: Option<Style>,
}

impl Metadata {
  #[must_use]
  pub fn with_label(mut self, label: String) -> Self {
    self.label = Some(label);
    self
  }

  #[must_use]
  pub fn with_style(mut self, style: Style) -> Self {
    self.style = Some(style);
    self
  }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Geometry<C: Coordinate> {
  GeometryCollection(Vec<Geometry<C>>, Metadata),
  Point(C, Metadata),
  LineString(Vec<C>, Metadata),
  Polygon(Vec<C>, Metadata),
}

impl<C: Coordinate> Geometry<C> {
  pub fn bounding_box(&self) -> BoundingBox {
    match self {
      Geometry::GeometryCollection(geometries, _) => geometries
        .iter()
        .map(Geometry::bounding_box)
        .fold(BoundingBox::default(), |acc, b| acc.extend(&b)),
      Geometry::Point(coord, _) => BoundingBox::from_iterator(once(*coord)),
      Geometry::LineString(coords, _) | Geometry::Polygon(coords, _) => {
        BoundingBox::from_iterator(coords.iter().copied())
      }
    }
  }

  pub fn is_visible(&self) -> bool {
    match self {
      Geometry::GeometryCollection(_, metadata)
      | Geometry::Point(_, metadata)
      | Geometry::Polygon(_, metadata)
      | Geometry::LineString(_, metadata) => metadata.style.as_ref().is_none_or(|s| s.visible),
    }
  }

  /// Whether the geometry covers the given canvas coordinate. Points and
  /// lines have no area and never contain anything.
  pub fn contains(&self, coord: PixelCoordinate) -> bool {
    match self {
      Geometry::GeometryCollection(geometries, _) => {
        geometries.iter().any(|g| g.contains(coord))
      }
      Geometry::Polygon(coords, _) => polygon_contains(coords, coord),
      Geometry::Point(_, _) | Geometry::LineString(_, _) => false,
    }
  }

  pub fn flat_iterate_with_merged_style(
    &self,
    base_style: &Style,
  ) -> impl Iterator<Item = Geometry<C>> + use<'_, C> {
    if let Geometry::GeometryCollection(geometries, metadata) = self {
      let style = base_style.optional_overwrite_with(metadata.style.as_ref());

      Either::Left(geometries.iter().cloned().flat_map(move |geometry| {
        geometry
          .flat_iterate_with_merged_style(&style)
          .collect::<Vec<_>>()
      }))
    } else {
      let style = base_style.optional_overwrite_with(self.get_style().as_ref());
      Either::Right(std::iter::once(self.clone().with_style(&style)))
    }
  }

  #[must_use]
  pub fn with_style(mut self, style: &Style) -> Self {
    match &mut self {
      Geometry::GeometryCollection(_, metadata)
      | Geometry::Point(_, metadata)
      | Geometry::Polygon(_, metadata)
      | Geometry::LineString(_, metadata) => {
        metadata.style = Some(style.clone());
      }
    }
    self
  }

  #[must_use]
  pub fn get_style(&self) -> &Option<Style> {
    match self {
      Geometry::GeometryCollection(_, metadata)
      | Geometry::Point(_, metadata)
      | Geometry::Polygon(_, metadata)
      | Geometry::LineString(_, metadata) => &metadata.style,
    }
  }
}

/// Even-odd ray casting on the polygon's outer ring.
fn polygon_contains<C: Coordinate>(ring: &[C], coord: PixelCoordinate) -> bool {
  if ring.len() < 3 {
    return false;
  }

  let mut inside = false;
  let mut j = ring.len() - 1;
  for i in 0..ring.len() {
    let pi = ring[i].as_pixel_coordinate();
    let pj = ring[j].as_pixel_coordinate();
    if (pi.y > coord.y) != (pj.y > coord.y) {
      let x_at_y = pi.x + (coord.y - pi.y) / (pj.y - pi.y) * (pj.x - pi.x);
      if coord.x < x_at_y {
        inside = !inside;
      }
    }
    j = i;
  }
  inside
}

#[cfg(test)]
mod tests {
  use crate::map::coordinates::PixelCoordinate;

  use super::*;

  fn unit_square() -> Geometry<PixelCoordinate> {
    Geometry::Polygon(
      vec![
        PixelCoordinate::new(0., 0.),
        PixelCoordinate::new(10., 0.),
        PixelCoordinate::new(10., 10.),
        PixelCoordinate::new(0., 10.),
      ],
      Metadata::default(),
    )
  }

  #[test]
  fn polygon_containment() {
    let square = unit_square();
    assert!(square.contains(PixelCoordinate::new(5., 5.)));
    assert!(square.contains(PixelCoordinate::new(0.5, 9.5)));
    assert!(!square.contains(PixelCoordinate::new(15., 5.)));
    assert!(!square.contains(PixelCoordinate::new(5., -1.)));
  }

  #[test]
  fn concave_polygon_containment() {
    let l_shape = Geometry::Polygon(
      vec![
        PixelCoordinate::new(0., 0.),
        PixelCoordinate::new(10., 0.),
        PixelCoordinate::new(10., 4.),
        PixelCoordinate::new(4., 4.),
        PixelCoordinate::new(4., 10.),
        PixelCoordinate::new(0., 10.),
      ],
      Metadata::default(),
    );
    assert!(l_shape.contains(PixelCoordinate::new(2., 8.)));
    assert!(l_shape.contains(PixelCoordinate::new(8., 2.)));
    assert!(!l_shape.contains(PixelCoordinate::new(8., 8.)));
  }

  #[test]
  fn points_and_lines_contain_nothing() {
    let point = Geometry::Point(PixelCoordinate::new(1., 1.), Metadata::default());
    let line = Geometry::LineString(
      vec![PixelCoordinate::new(0., 0.), PixelCoordinate::new(2., 2.)],
      Metadata::default(),
    );
    assert!(!point.contains(PixelCoordinate::new(1., 1.)));
    assert!(!line.contains(PixelCoordinate::new(1., 1.)));
  }

  #[test]
  fn style_merging() {
    let red = Metadata::default().with_style(
      Style::default()
        .with_color(Color32::RED)
        .with_visible(false),
    );
    let green = Metadata::default().with_style(
      Style::default()
        .with_color(Color32::GREEN)
        .with_fill_color(Color32::GREEN),
    );

    let geom_coll = Geometry::GeometryCollection(
      vec![Geometry::Point(PixelCoordinate::new(1., 2.), red)],
      green,
    );

    let elements = geom_coll
      .flat_iterate_with_merged_style(&Style::default())
      .collect::<Vec<_>>();

    assert_eq!(elements.len(), 1);
    let style = elements[0].get_style().clone().unwrap();
    assert_eq!(style.color(), Color32::RED);
    assert_eq!(style.fill_color(), Color32::GREEN);
    assert!(!elements[0].is_visible());
  }
}
