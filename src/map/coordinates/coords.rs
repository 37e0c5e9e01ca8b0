use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// The fixed canvas size for ``PixelPosition``s.
const CANVAS_SIZE: f32 = 1024. * 2.;
pub const TILE_SIZE: f32 = 512.;

/// Half the circumference of the Web Mercator world, in meters.
pub const MERCATOR_HALF_WORLD: f64 = 20_037_508.342_789_244;

/// The display resolution in meters per screen pixel at a given map zoom.
#[must_use]
pub fn mercator_resolution(zoom: f32) -> f64 {
  2. * MERCATOR_HALF_WORLD / f64::from(CANVAS_SIZE) / f64::from(zoom)
}

pub trait XY:
  Default + Copy + Clone + AddAssign<Self> + Mul<f32, Output = Self> + Add<Self, Output = Self>
{
  fn x(&self) -> f32;
  fn y(&self) -> f32;
  #[must_use]
  fn with_x(self, x: f32) -> Self;
  #[must_use]
  fn with_y(self, y: f32) -> Self;
}

impl Coordinate for TileCoordinate {
  fn as_wgs84(&self) -> WGS84Coordinate {
    WGS84Coordinate::from(*self)
  }

  fn as_pixel_coordinate(&self) -> PixelCoordinate {
    PixelCoordinate::from(*self)
  }
}

impl Coordinate for PixelCoordinate {
  fn as_wgs84(&self) -> WGS84Coordinate {
    WGS84Coordinate::from(*self)
  }

  fn as_pixel_coordinate(&self) -> PixelCoordinate {
    *self
  }
}

impl From<TileCoordinate> for PixelCoordinate {
  fn from(tile_coord: TileCoordinate) -> Self {
    PixelCoordinate {
      x: tile_coord.x * TILE_SIZE / 2f32.powi(i32::from(tile_coord.zoom) - 2),
      y: tile_coord.y * TILE_SIZE / 2f32.powi(i32::from(tile_coord.zoom) - 2),
    }
  }
}

impl From<WGS84Coordinate> for PixelCoordinate {
  fn from(coord: WGS84Coordinate) -> Self {
    TileCoordinate::from_coordinate(coord, 2).into()
  }
}

#[expect(clippy::cast_possible_truncation)]
impl From<WebMercatorCoordinate> for PixelCoordinate {
  fn from(coord: WebMercatorCoordinate) -> Self {
    let world = 2. * MERCATOR_HALF_WORLD;
    PixelCoordinate {
      x: ((coord.x + MERCATOR_HALF_WORLD) / world * f64::from(CANVAS_SIZE)) as f32,
      y: ((MERCATOR_HALF_WORLD - coord.y) / world * f64::from(CANVAS_SIZE)) as f32,
    }
  }
}

impl From<PixelCoordinate> for WebMercatorCoordinate {
  fn from(pp: PixelCoordinate) -> Self {
    let world = 2. * MERCATOR_HALF_WORLD;
    WebMercatorCoordinate {
      x: f64::from(pp.x) / f64::from(CANVAS_SIZE) * world - MERCATOR_HALF_WORLD,
      y: MERCATOR_HALF_WORLD - f64::from(pp.y) / f64::from(CANVAS_SIZE) * world,
    }
  }
}

impl From<egui::Pos2> for PixelPosition {
  fn from(pos: egui::Pos2) -> Self {
    PixelPosition { x: pos.x, y: pos.y }
  }
}

impl From<PixelPosition> for egui::Pos2 {
  fn from(pp: PixelPosition) -> Self {
    egui::Pos2::new(pp.x, pp.y)
  }
}

impl PixelCoordinate {
  #[must_use]
  pub fn sq_dist(&self, p: &Self) -> f32 {
    let dx = p.x - self.x;
    let dy = p.y - self.y;
    dx * dx + dy * dy
  }
}

impl From<PixelCoordinate> for WGS84Coordinate {
  fn from(pp: PixelCoordinate) -> Self {
    WGS84Coordinate::from(TileCoordinate::from_pixel_position(pp, 2))
  }
}

impl TileCoordinate {
  #[must_use]
  pub fn from_coordinate(coord: WGS84Coordinate, zoom: u8) -> Self {
    let x = (coord.lon + 180.) / 360. * 2f32.powi(zoom.into());
    let y = (1. - ((coord.lat * PI / 180.).tan() + 1. / (coord.lat * PI / 180.).cos()).ln() / PI)
      * 2f32.powi((zoom - 1).into());
    Self { x, y, zoom }
  }

  #[must_use]
  pub fn from_pixel_position(pixel_pos: PixelCoordinate, zoom: u8) -> Self {
    TileCoordinate {
      x: pixel_pos.x / TILE_SIZE * 2f32.powi(i32::from(zoom) - 2),
      y: pixel_pos.y / TILE_SIZE * 2f32.powi(i32::from(zoom) - 2),
      zoom,
    }
  }
}

const PI: f32 = std::f32::consts::PI;
impl From<TileCoordinate> for WGS84Coordinate {
  fn from(tile_coord: TileCoordinate) -> Self {
    WGS84Coordinate {
      lat: f32::atan(f32::sinh(
        PI - tile_coord.y / 2f32.powi(tile_coord.zoom.into()) * 2. * PI,
      )) * 180.
        / PI,
      lon: tile_coord.x / 2f32.powi(tile_coord.zoom.into()) * 360. - 180.,
    }
  }
}

impl XY for PixelCoordinate {
  fn x(&self) -> f32 {
    self.x
  }

  fn y(&self) -> f32 {
    self.y
  }

  fn with_x(mut self, x: f32) -> Self {
    self.x = x;
    self
  }

  fn with_y(mut self, y: f32) -> Self {
    self.y = y;
    self
  }
}

impl XY for PixelPosition {
  fn x(&self) -> f32 {
    self.x
  }

  fn y(&self) -> f32 {
    self.y
  }

  fn with_x(mut self, x: f32) -> Self {
    self.x = x;
    self
  }

  fn with_y(mut self, y: f32) -> Self {
    self.y = y;
    self
  }
}

/// A helper coordinate format to position tiles.
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct TileCoordinate {
  pub x: f32,
  pub y: f32,
  pub zoom: u8,
}

/// A coordinate system used in this application to draw on an imaginary canvas.
/// Is equivalent to Web Mercator projection on a fixed zoom level.
#[derive(Debug, Default, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct PixelCoordinate {
  pub x: f32,
  pub y: f32,
}

impl PixelCoordinate {
  #[must_use]
  pub fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }
}

impl std::ops::AddAssign for PixelCoordinate {
  fn add_assign(&mut self, other: Self) {
    self.x += other.x;
    self.y += other.y;
  }
}

impl std::ops::Add for PixelCoordinate {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Self {
      x: self.x + rhs.x,
      y: self.y + rhs.y,
    }
  }
}

impl std::ops::Mul<f32> for PixelCoordinate {
  type Output = Self;

  fn mul(self, rhs: f32) -> Self {
    Self {
      x: self.x * rhs,
      y: self.y * rhs,
    }
  }
}

/// The standard WGS84 coordinate system.
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct WGS84Coordinate {
  #[serde(alias = "latitude")]
  pub lat: f32,
  #[serde(alias = "longitude")]
  pub lon: f32,
}

impl WGS84Coordinate {
  #[must_use]
  pub fn new(lat: f32, lon: f32) -> Self {
    Self { lat, lon }
  }
}

/// A projected EPSG:3857 coordinate in meters, the system the cadastre
/// extent and the geo server speak.
#[derive(Debug, Default, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct WebMercatorCoordinate {
  pub x: f64,
  pub y: f64,
}

impl WebMercatorCoordinate {
  #[must_use]
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

/// Meant for actual pixel in the UI. Handled equivalently to a ``egui::Pos2``.
#[derive(Debug, Default, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct PixelPosition {
  pub x: f32,
  pub y: f32,
}

impl Mul<f32> for PixelPosition {
  type Output = Self;

  fn mul(self, rhs: f32) -> Self {
    Self {
      x: self.x * rhs,
      y: self.y * rhs,
    }
  }
}

impl Add<PixelPosition> for PixelPosition {
  type Output = Self;

  fn add(self, rhs: PixelPosition) -> Self {
    Self {
      x: self.x + rhs.x,
      y: self.y + rhs.y,
    }
  }
}

impl AddAssign for PixelPosition {
  fn add_assign(&mut self, other: Self) {
    self.x += other.x;
    self.y += other.y;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use assert_approx_eq::assert_approx_eq;

  #[test]
  fn coordinate_to_pixel() {
    let tc3 = TileCoordinate {
      x: 2.,
      y: 1.,
      zoom: 3,
    };
    let pp = PixelCoordinate { x: 512., y: 256. };
    assert_eq!(PixelCoordinate::from(tc3), pp);
    assert_eq!(TileCoordinate::from_pixel_position(pp, 3), tc3);
    assert_eq!(WGS84Coordinate::from(tc3), WGS84Coordinate::from(pp));
  }

  #[test]
  fn coordinate_to_pixel_zero() {
    let coord = WGS84Coordinate { lat: 0.0, lon: 0.0 };
    let tc2 = TileCoordinate::from_coordinate(coord, 2);
    let tc3 = TileCoordinate::from_coordinate(coord, 3);
    let tc4 = TileCoordinate::from_coordinate(coord, 4);
    let pp = PixelCoordinate { x: 1024., y: 1024. };
    assert_eq!(PixelCoordinate::from(tc2), pp);
    assert_eq!(PixelCoordinate::from(tc3), pp);
    assert_eq!(PixelCoordinate::from(tc4), pp);
  }

  #[test]
  fn mercator_to_pixel() {
    let origin = WebMercatorCoordinate::new(0., 0.);
    let pp = PixelCoordinate::from(origin);
    assert_approx_eq!(pp.x, 1024., 0.001);
    assert_approx_eq!(pp.y, 1024., 0.001);

    let nw = WebMercatorCoordinate::new(-MERCATOR_HALF_WORLD, MERCATOR_HALF_WORLD);
    let pp = PixelCoordinate::from(nw);
    assert_approx_eq!(pp.x, 0., 0.001);
    assert_approx_eq!(pp.y, 0., 0.001);
  }

  #[test]
  fn mercator_pixel_round_trip() {
    let lausanne = WebMercatorCoordinate::new(740_000., 5_870_000.);
    let back = WebMercatorCoordinate::from(PixelCoordinate::from(lausanne));
    // f32 canvas coordinates keep roughly km-scale precision world-wide.
    assert!((back.x - lausanne.x).abs() < 2_000.);
    assert!((back.y - lausanne.y).abs() < 2_000.);
  }

  #[test]
  fn mercator_agrees_with_wgs84() {
    let mercator = WebMercatorCoordinate::new(740_000., 5_870_000.);
    let wgs84 = mercator.as_wgs84();
    assert_approx_eq!(wgs84.lon, 6.6475, 0.01);
    assert_approx_eq!(wgs84.lat, 46.56, 0.05);
  }
}
