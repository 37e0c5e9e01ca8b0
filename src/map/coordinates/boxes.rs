use serde::{Deserialize, Serialize};

use super::{
  Coordinate, MERCATOR_HALF_WORLD, PixelCoordinate, TileCoordinate, WebMercatorCoordinate,
};

/// A tile in the Web Mercator projection.
#[derive(Debug, PartialEq, Copy, Clone, Hash, Eq, Serialize, Deserialize)]
pub struct Tile {
  pub x: u32,
  pub y: u32,
  pub zoom: u8,
}

impl Tile {
  /// Checks existence of the tile.
  #[must_use]
  pub fn exists(&self) -> bool {
    let max_tile = 2u32.pow(self.zoom.into()) - 1;
    self.x <= max_tile && self.y <= max_tile
  }

  /// The parent one zoom level lower.
  #[must_use]
  pub fn parent(&self) -> Option<Self> {
    match self.zoom {
      0 => None,
      _ => Some(Self {
        x: self.x >> 1,
        y: self.y >> 1,
        zoom: self.zoom - 1,
      }),
    }
  }

  /// The same tile addressed with a TMS (bottom-up) row index.
  #[must_use]
  pub fn flipped_y(&self) -> u32 {
    2u32.pow(self.zoom.into()) - 1 - self.y
  }

  #[must_use]
  #[allow(clippy::cast_precision_loss)]
  pub fn position(&self) -> (PixelCoordinate, PixelCoordinate) {
    (
      PixelCoordinate::from(TileCoordinate {
        x: self.x as f32,
        y: self.y as f32,
        zoom: self.zoom,
      }),
      PixelCoordinate::from(TileCoordinate {
        x: (self.x + 1) as f32,
        y: (self.y + 1) as f32,
        zoom: self.zoom,
      }),
    )
  }

  /// The tile's bounds in EPSG:3857 meters as `[min_x, min_y, max_x, max_y]`.
  #[must_use]
  pub fn mercator_bounds(&self) -> [f64; 4] {
    let world = 2. * MERCATOR_HALF_WORLD;
    let span = world / f64::from(2u32.pow(self.zoom.into()));
    let min_x = f64::from(self.x) * span - MERCATOR_HALF_WORLD;
    let max_y = MERCATOR_HALF_WORLD - f64::from(self.y) * span;
    [min_x, max_y - span, min_x + span, max_y]
  }
}

impl From<TileCoordinate> for Tile {
  #[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
  )]
  fn from(tile_coord: TileCoordinate) -> Self {
    Self {
      x: tile_coord.x.floor() as u32,
      y: tile_coord.y.floor() as u32,
      zoom: tile_coord.zoom,
    }
  }
}

/// A function to create a tile iterator for a given bounding box.
pub fn tiles_in_box(nw: TileCoordinate, se: TileCoordinate) -> impl Iterator<Item = Tile> {
  let nw_tile = Tile::from(nw);
  let se_tile = Tile::from(se);
  (nw_tile.x..=se_tile.x)
    .flat_map(move |x| {
      (nw_tile.y..=se_tile.y).map(move |y| Tile {
        x,
        y,
        zoom: nw_tile.zoom,
      })
    })
    .filter(Tile::exists)
}

#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
  max_x: f32,
  min_x: f32,
  max_y: f32,
  min_y: f32,
}

impl Default for BoundingBox {
  fn default() -> Self {
    Self::new()
  }
}

impl BoundingBox {
  #[must_use]
  pub fn new() -> Self {
    Self::get_invalid()
  }

  #[must_use]
  pub fn get_invalid() -> Self {
    Self {
      max_x: f32::MIN,
      min_x: f32::MAX,
      max_y: f32::MIN,
      min_y: f32::MAX,
    }
  }

  /// The canvas box of an EPSG:3857 extent given as `[min_x, min_y, max_x, max_y]`.
  #[must_use]
  pub fn from_mercator_extent(extent: [f64; 4]) -> Self {
    Self::from_iterator([
      WebMercatorCoordinate::new(extent[0], extent[1]),
      WebMercatorCoordinate::new(extent[2], extent[3]),
    ])
  }

  #[must_use]
  pub fn center(&self) -> PixelCoordinate {
    PixelCoordinate {
      x: f32::midpoint(self.max_x, self.min_x),
      y: f32::midpoint(self.max_y, self.min_y),
    }
  }

  pub fn from_iterator<C: Coordinate, I: IntoIterator<Item = C>>(positions: I) -> Self {
    let mut bb = Self::get_invalid();
    positions
      .into_iter()
      .for_each(|pos| bb.add_coordinate(pos.as_pixel_coordinate()));
    bb
  }

  #[must_use]
  pub fn is_valid(&self) -> bool {
    self.min_y <= self.max_y
      && self.min_x <= self.max_x
      && self.min_x.abs() < 2048.
      && self.min_y.abs() < 2048.
      && self.max_x.abs() < 2048.
      && self.max_y.abs() < 2048.
  }

  pub fn add_coordinate(&mut self, pp: PixelCoordinate) {
    self.min_y = self.min_y.min(pp.y);
    self.min_x = self.min_x.min(pp.x);
    self.max_y = self.max_y.max(pp.y);
    self.max_x = self.max_x.max(pp.x);
  }

  #[must_use]
  pub fn extend(self, bb: &Self) -> Self {
    if !self.is_valid() {
      return *bb;
    }

    if !bb.is_valid() {
      return self;
    }

    Self {
      min_x: self.min_x.min(bb.min_x),
      min_y: self.min_y.min(bb.min_y),
      max_x: self.max_x.max(bb.max_x),
      max_y: self.max_y.max(bb.max_y),
    }
  }

  #[must_use]
  pub fn intersects(&self, other: &Self) -> bool {
    self.min_x <= other.max_x
      && other.min_x <= self.max_x
      && self.min_y <= other.max_y
      && other.min_y <= self.max_y
  }

  #[must_use]
  pub fn contains(&self, pp: PixelCoordinate) -> bool {
    pp.x >= self.min_x && pp.x <= self.max_x && pp.y >= self.min_y && pp.y <= self.max_y
  }

  #[must_use]
  pub fn width(&self) -> f32 {
    self.max_x - self.min_x
  }

  #[must_use]
  pub fn height(&self) -> f32 {
    self.max_y - self.min_y
  }
}

#[cfg(test)]
mod tests {
  use crate::map::coordinates::WGS84Coordinate;

  use super::*;

  #[test]
  fn coordinate_tile_conversions() {
    let coord = WGS84Coordinate {
      lat: 52.521_977,
      lon: 13.413_305,
    };

    let tc13 = TileCoordinate::from_coordinate(coord, 13);
    assert!(WGS84Coordinate::from(tc13).lat - coord.lat < 0.000_000_1);
    assert!(WGS84Coordinate::from(tc13).lon - coord.lon < 0.000_000_1);

    let t13: Tile = tc13.into();
    assert_eq!(
      t13,
      Tile {
        x: 4401,
        y: 2686,
        zoom: 13
      }
    );
  }

  #[test]
  fn tile_box_test() {
    let nw = TileCoordinate {
      x: 2.1,
      y: 1.1,
      zoom: 5,
    };

    let se = TileCoordinate {
      x: 11.1,
      y: 20.1,
      zoom: 5,
    };

    let tiles: Vec<_> = tiles_in_box(nw, se).collect();
    assert_eq!(tiles.len(), 200);
  }

  #[test]
  fn tile_parent() {
    let tile = Tile {
      x: 4,
      y: 6,
      zoom: 10,
    };
    assert_eq!(
      tile.parent().unwrap(),
      Tile {
        x: 2,
        y: 3,
        zoom: 9
      }
    );
  }

  #[test]
  fn tms_row_inversion() {
    let tile = Tile {
      x: 0,
      y: 1,
      zoom: 2,
    };
    assert_eq!(tile.flipped_y(), 2);
    assert_eq!(
      Tile {
        x: 0,
        y: 0,
        zoom: 0
      }
      .flipped_y(),
      0
    );
  }

  #[test]
  fn mercator_bounds_world() {
    let bounds = Tile {
      x: 0,
      y: 0,
      zoom: 0,
    }
    .mercator_bounds();
    assert!((bounds[0] + MERCATOR_HALF_WORLD).abs() < 1e-6);
    assert!((bounds[1] + MERCATOR_HALF_WORLD).abs() < 1e-6);
    assert!((bounds[2] - MERCATOR_HALF_WORLD).abs() < 1e-6);
    assert!((bounds[3] - MERCATOR_HALF_WORLD).abs() < 1e-6);
  }

  #[test]
  fn mercator_bounds_quartered() {
    let bounds = Tile {
      x: 1,
      y: 0,
      zoom: 1,
    }
    .mercator_bounds();
    assert!((bounds[0] - 0.).abs() < 1e-6);
    assert!((bounds[1] - 0.).abs() < 1e-6);
    assert!((bounds[2] - MERCATOR_HALF_WORLD).abs() < 1e-6);
    assert!((bounds[3] - MERCATOR_HALF_WORLD).abs() < 1e-6);
  }

  #[test]
  fn extent_box() {
    let bb = BoundingBox::from_mercator_extent([
      732_766.515_953_591_1,
      5_861_623.374_137_599,
      748_257.979_025_699_9,
      5_877_491.021_729_927,
    ]);
    assert!(bb.is_valid());
    assert!(bb.width() > 0.);
    assert!(bb.height() > 0.);
    // Lausanne sits in the north-eastern Mercator quadrant.
    assert!(bb.center().x > 1024.);
    assert!(bb.center().y < 1024.);
  }
}
