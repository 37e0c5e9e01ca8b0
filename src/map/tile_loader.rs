use anyhow::Result;
use log::{debug, error, trace};
use regex::Regex;
use std::collections::HashSet;
use std::fs::{self, File};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use surf::http::Method;
use surf::{Config, Request, Url};
use surf_governor::GovernorMiddleware;
use thiserror::Error;

use crate::map::coordinates::Tile;
use crate::map::sources::TileUrlSource;

#[derive(Error, Debug)]
pub enum TileLoaderError {
  #[error("Tile not available.")]
  TileNotAvailable { tile: Tile },
  #[error("Download already in progress.")]
  DownloadInProgress { tile: Tile },
}

/// The raw bytes of a tile as served by the remote endpoint.
pub type TileData = Vec<u8>;

#[derive(Debug, Clone)]
struct TileCache {
  base_path: Option<PathBuf>,
  extension: &'static str,
}

impl TileCache {
  fn path(&self, tile: &Tile) -> Option<PathBuf> {
    self.base_path.clone().map(|b| {
      b.join(format!(
        "{}_{}_{}.{}",
        tile.zoom, tile.x, tile.y, self.extension
      ))
    })
  }

  fn cache_tile(&self, tile: &Tile, data: &[u8]) {
    let Some(path) = self.path(tile) else { return };
    let succ = File::create(path).map(|mut f| f.write_all(data));
    if succ.is_err() {
      debug!("Error when writing file: {}", succ.unwrap_err());
    }
  }

  fn tile_data(&self, tile: &Tile) -> Result<TileData> {
    match self.path(tile) {
      Some(p) if p.exists() => Ok(fs::read(p)?),
      _ => Err(TileLoaderError::TileNotAvailable { tile: *tile }.into()),
    }
  }
}

struct TileDownloader {
  source: Arc<dyn TileUrlSource + Send + Sync>,
  tiles_in_download: Arc<Mutex<HashSet<Tile>>>,
  client: surf::Client,
}

impl TileDownloader {
  fn new(source: Arc<dyn TileUrlSource + Send + Sync>) -> Self {
    let client: surf::Client = Config::new()
      .set_timeout(Some(Duration::from_secs(5)))
      .try_into()
      .expect("client");
    Self {
      source,
      tiles_in_download: Arc::default(),
      client: client.with(GovernorMiddleware::per_second(10).unwrap()),
    }
  }

  async fn tile_data(&self, tile: &Tile) -> Result<TileData> {
    {
      let mut tiles_in_download = self.tiles_in_download.lock().unwrap();
      if tiles_in_download.contains(tile) {
        return Err(TileLoaderError::DownloadInProgress { tile: *tile }.into());
      }
      tiles_in_download.insert(*tile);
    }

    let url = self.source.url_for(tile);
    let request = Request::new(Method::Get, Url::parse(&url)?);
    let result = self
      .client
      .send(request)
      .await
      .inspect_err(|e| error!("Error when downloading tile: {e}"))
      .map_err(|_| TileLoaderError::TileNotAvailable { tile: *tile });
    let result = if let Ok(mut result) = result {
      if result.status() == 200 {
        result
          .body_bytes()
          .await
          .map_err(|_| TileLoaderError::TileNotAvailable { tile: *tile })
      } else {
        error!(
          "Error when downloading tile: {}, {:?}",
          result.status(),
          result.body_string().await
        );
        Err(TileLoaderError::TileNotAvailable { tile: *tile })
      }
    } else {
      debug!("{result:?}");
      Err(TileLoaderError::TileNotAvailable { tile: *tile })
    };
    debug!("Downloaded {tile:?}.");

    let mut tiles_in_download = self.tiles_in_download.lock().unwrap();
    tiles_in_download.remove(tile);

    Ok(result?)
  }
}

/// Downloads tiles from one source and keeps a per-source disk cache.
pub struct CachedTileLoader {
  tile_cache: TileCache,
  tile_loader: TileDownloader,
}

impl CachedTileLoader {
  pub fn new(source: Arc<dyn TileUrlSource + Send + Sync>, cache_dir: Option<PathBuf>) -> Self {
    let extension = source.file_extension();
    let cache_path = cache_dir.map(|mut p| {
      // Mask api keys so the cache key does not depend on credentials.
      let key_re = Regex::new("[Kk]ey=([A-Za-z0-9-_]*)").expect("re did not compile");
      let masked = key_re.replace(source.cache_key(), "*");
      let mut hasher = DefaultHasher::new();
      masked.hash(&mut hasher);
      p.push(hasher.finish().to_string());
      p
    });

    Self::create_cache(cache_path.as_ref());

    CachedTileLoader {
      tile_cache: TileCache {
        base_path: cache_path,
        extension,
      },
      tile_loader: TileDownloader::new(source),
    }
  }

  fn create_cache(cache_path: Option<&PathBuf>) {
    let Some(cache_path) = cache_path else { return };
    if cache_path.exists() {
      return;
    }
    let _ = fs::create_dir_all(cache_path).inspect_err(|e| {
      error!("Failed to create cache directory: {e}");
    });
  }

  async fn download(&self, tile: &Tile) -> Result<TileData> {
    match self.tile_loader.tile_data(tile).await {
      Ok(data) => {
        self.tile_cache.cache_tile(tile, &data);
        match data.len() {
          0..=100 => Err(TileLoaderError::TileNotAvailable { tile: *tile }.into()),
          _ => Ok(data),
        }
      }
      Err(e) => Err(e),
    }
  }

  /// Fetches the tile from the cache if present, the network otherwise.
  pub async fn tile_data(&self, tile: &Tile) -> Result<TileData> {
    trace!("Loading tile from file {:?}", &tile);
    if let Ok(data) = self.tile_cache.tile_data(tile) {
      debug!("cache_hit: {tile:?}");
      Ok(data)
    } else {
      debug!("cache_miss: {tile:?}");
      self.download(tile).await
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::map::sources::XyzSource;

  #[test]
  fn cache_paths_carry_the_source_extension() {
    let source = Arc::new(XyzSource::new("https://tiles.test/{z}/{x}/{-y}.pbf".to_string()));
    let loader = CachedTileLoader::new(source, Some(std::env::temp_dir()));
    let path = loader
      .tile_cache
      .path(&Tile {
        x: 1,
        y: 2,
        zoom: 3,
      })
      .unwrap();
    assert!(path.to_string_lossy().ends_with("3_1_2.pbf"));
  }

  #[test]
  fn uncached_loader_reports_missing_tiles() {
    let cache = TileCache {
      base_path: None,
      extension: "png",
    };
    assert!(
      cache
        .tile_data(&Tile {
          x: 0,
          y: 0,
          zoom: 0,
        })
        .is_err()
    );
  }
}
