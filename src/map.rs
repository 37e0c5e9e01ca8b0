/// Contains everything needed to handle coordinates.
pub mod coordinates;
/// Handles geometry.
pub mod geometry_collection;
/// URL construction for the remote geo server.
pub mod sources;
/// Map tile functionality.
pub mod tile_loader;
/// The map widget and its layers.
pub mod viewer;
