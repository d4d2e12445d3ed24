//! The batch orchestrator: list the assets, recolor each one on the worker
//! pool, and publish the results back to the remote store.
//!
//! Every asset is an independent unit of work. A corrupt image, a failed
//! fetch, or a failed publish marks that one asset failed and the batch
//! moves on; nothing short of the initial `list` call aborts a run. The
//! caller gets a progress callback after every per-asset outcome and the
//! aggregate counters at the end.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::path::PathBuf;
use std::thread;

use crate::cache::BaseImageCache;
use crate::color::Color;
use crate::pool::{JobRequest, WorkerPool};

/// An error reported by the remote icon store.
///
/// The concrete store client is outside this crate, so the error is an
/// opaque message; the orchestrator never retries store calls, it just
/// records the affected asset as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(pub String);
impl Display for StoreError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
impl std::error::Error for StoreError {}

/// One icon asset as listed by the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconAsset {
  /// The store's id for the asset.
  pub id: u64,
  /// The asset's display name. Must be unique within the store.
  pub name: String,
  /// Where the asset's bytes can be fetched from.
  pub url: String,
}

/// The remote icon store, reduced to the five calls a recolor run needs.
pub trait IconStore {
  /// Lists every asset in the store.
  fn list(&mut self) -> Result<Vec<IconAsset>, StoreError>;
  /// Fetches an asset's raw bytes.
  fn fetch(&mut self, url: &str) -> Result<Vec<u8>, StoreError>;
  /// Creates a new asset. The store rejects duplicate names.
  fn create(&mut self, name: &str, bytes: &[u8]) -> Result<IconAsset, StoreError>;
  /// Deletes an asset by id.
  fn delete(&mut self, id: u64) -> Result<(), StoreError>;
  /// Renames an asset in place.
  fn rename(&mut self, id: u64, name: &str) -> Result<(), StoreError>;
}

/// Aggregate counters for one batch run.
///
/// Only ever incremented, exactly once per asset, and only by the
/// orchestrator thread, so `updated + skipped + failed` always equals the
/// number of listed assets once [`Batch::run`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct BatchResult {
  pub updated: u32,
  pub skipped: u32,
  pub failed: u32,
}

/// How far the three-step publish protocol got before something failed.
///
/// The store has no atomic "replace bytes, keep name" call, so publishing is
/// create-under-temp-name, delete-original, rename. A failure after the
/// create leaves a renamed duplicate rather than data loss; the reached
/// state says which reconciliation is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
  /// The recolored asset exists under its temporary name.
  Created,
  /// The original asset is gone; only the temp-named copy remains.
  OriginalDeleted,
  /// The copy carries the original name. The protocol is complete.
  Renamed,
}
impl Display for PublishState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Created => f.write_str("created"),
      Self::OriginalDeleted => f.write_str("original-deleted"),
      Self::Renamed => f.write_str("renamed"),
    }
  }
}

/// A publish failure, carrying the last state the protocol reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishError {
  /// `None` when even the create step failed (the store is untouched).
  pub reached: Option<PublishState>,
  /// The store error that stopped the protocol.
  pub source: StoreError,
}
impl Display for PublishError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.reached {
      None => write!(f, "publish failed before creating anything: {}", self.source),
      Some(state) => write!(f, "publish failed after reaching {state}: {}", self.source),
    }
  }
}
impl std::error::Error for PublishError {}

/// Settings for a [`Batch`].
#[derive(Debug, Clone)]
pub struct BatchConfig {
  /// Worker threads for the decode/recolor/encode work.
  pub workers: usize,
  /// Where base images are cached on disk.
  pub cache_dir: PathBuf,
  /// Suffix appended to an asset's name for the temporary create step.
  pub temp_suffix: String,
}
impl Default for BatchConfig {
  fn default() -> Self {
    Self {
      workers: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
      cache_dir: std::env::temp_dir().join("retint-base-images"),
      temp_suffix: "tmp".to_string(),
    }
  }
}

/// Is this URL eligible for recoloring? Only `.png` sources are.
fn is_png_url(url: &str) -> bool {
  url.len() >= 4
    && url.is_char_boundary(url.len() - 4)
    && url[url.len() - 4..].eq_ignore_ascii_case(".png")
}

/// A reusable batch runner: one worker pool plus one base-image cache.
#[derive(Debug)]
pub struct Batch {
  cache: BaseImageCache,
  pool: WorkerPool,
  temp_suffix: String,
}
impl Batch {
  /// Builds the runner, spawning the worker pool up front.
  #[must_use]
  pub fn new(config: BatchConfig) -> Self {
    Self {
      cache: BaseImageCache::new(config.cache_dir),
      pool: WorkerPool::new(config.workers),
      temp_suffix: config.temp_suffix,
    }
  }

  /// Recolors every eligible asset in the store to `target`.
  ///
  /// `on_progress(current, total)` is called once before any work starts
  /// (with `current == 0`) and then once after each asset's outcome is
  /// known, in completion order.
  ///
  /// ## Failure
  /// * Only a failed `list` call aborts the run. Every per-asset error is
  ///   logged, counted in [`BatchResult::failed`], and otherwise contained.
  pub fn run<S, F>(
    &self, store: &mut S, target: Color, mut on_progress: F,
  ) -> Result<BatchResult, StoreError>
  where
    S: IconStore,
    F: FnMut(u32, u32),
  {
    let assets = store.list()?;
    let total = assets.len() as u32;
    let mut result = BatchResult::default();
    let mut current: u32 = 0;
    on_progress(0, total);

    // jobs in flight on the pool, keyed by correlation id. Outcomes come
    // back in completion order, not submission order.
    let mut pending: HashMap<u64, IconAsset> = HashMap::new();
    let mut next_id: u64 = 0;

    for asset in assets {
      if asset.name.is_empty() || !is_png_url(&asset.url) {
        result.skipped += 1;
        current += 1;
        on_progress(current, total);
        continue;
      }
      let fetched =
        self.cache.get_or_fetch(&asset.name, asset.id, || store.fetch(&asset.url));
      let bytes = match fetched {
        Ok(bytes) => bytes,
        Err(e) => {
          log::warn!("base image for {:?} unavailable: {e}", asset.name);
          result.failed += 1;
          current += 1;
          on_progress(current, total);
          continue;
        }
      };
      let id = next_id;
      next_id += 1;
      match self.pool.submit(JobRequest { id, bytes, color: target }) {
        Ok(()) => {
          pending.insert(id, asset);
        }
        Err(e) => {
          log::warn!("could not dispatch {:?}: {e}", asset.name);
          result.failed += 1;
          current += 1;
          on_progress(current, total);
        }
      }
    }

    while !pending.is_empty() {
      let reply = match self.pool.recv() {
        Ok(reply) => reply,
        Err(e) => {
          // the pool is gone; everything still in flight is lost.
          log::warn!("worker pool stopped with {} jobs in flight: {e}", pending.len());
          for (_, asset) in pending.drain() {
            log::warn!("recolor of {:?} never completed", asset.name);
            result.failed += 1;
            current += 1;
            on_progress(current, total);
          }
          break;
        }
      };
      let Some(asset) = pending.remove(&reply.id) else {
        // a reply we have no record of; nothing sensible to do with it.
        continue;
      };
      match reply.outcome {
        Ok(bytes) => match self.publish(store, &asset, &bytes) {
          Ok(()) => {
            log::info!("recolored {:?}", asset.name);
            result.updated += 1;
          }
          Err(e) => {
            log::warn!("publish of {:?} failed: {e}", asset.name);
            result.failed += 1;
          }
        },
        Err(e) => {
          log::warn!("recolor of {:?} failed: {e}", asset.name);
          result.failed += 1;
        }
      }
      current += 1;
      on_progress(current, total);
    }

    Ok(result)
  }

  /// Runs the three-step replace protocol for one recolored asset.
  fn publish<S: IconStore>(
    &self, store: &mut S, asset: &IconAsset, bytes: &[u8],
  ) -> Result<(), PublishError> {
    let temp_name = format!("{}_{}", asset.name, self.temp_suffix);
    let created = store
      .create(&temp_name, bytes)
      .map_err(|source| PublishError { reached: None, source })?;
    log::debug!("publish {:?}: {}", asset.name, PublishState::Created);
    store.delete(asset.id).map_err(|source| PublishError {
      reached: Some(PublishState::Created),
      source,
    })?;
    log::debug!("publish {:?}: {}", asset.name, PublishState::OriginalDeleted);
    store.rename(created.id, &asset.name).map_err(|source| PublishError {
      reached: Some(PublishState::OriginalDeleted),
      source,
    })?;
    log::debug!("publish {:?}: {}", asset.name, PublishState::Renamed);
    Ok(())
  }
}
