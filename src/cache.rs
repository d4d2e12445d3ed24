//! The disk cache of pristine ("base") image bytes.
//!
//! The recolor transform is destructive, so running a recolor over assets
//! that were themselves produced by a previous run would corrupt them. The
//! cache makes the overall operation idempotent: the first run of an asset
//! stores its untouched bytes on disk, and every later run reads those
//! instead of fetching whatever currently lives in the store.

use std::fmt::{self, Display};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Longest cache key we'll derive from an asset name.
const MAX_KEY_LEN: usize = 64;

/// An error from the cache.
#[derive(Debug)]
pub enum CacheError {
  /// Reading or writing the cache directory failed.
  Io(io::Error),
  /// The fetch callback failed on a cache miss.
  Fetch(crate::batch::StoreError),
}
impl Display for CacheError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Io(e) => write!(f, "cache io failed: {e}"),
      Self::Fetch(e) => write!(f, "base image fetch failed: {e}"),
    }
  }
}
impl std::error::Error for CacheError {}
impl From<io::Error> for CacheError {
  fn from(e: io::Error) -> Self {
    Self::Io(e)
  }
}

/// Derives the on-disk cache key for an asset name.
///
/// Lowercased, everything outside `[a-z0-9]` collapsed to single `_`
/// separators, trimmed, and truncated to a bounded length. Names that
/// sanitize away entirely fall back to an id-derived key so distinct assets
/// can't collide on the empty string.
pub(crate) fn sanitize_name(name: &str, id: u64) -> String {
  let mut key = String::with_capacity(name.len().min(MAX_KEY_LEN));
  for ch in name.chars() {
    let lower = ch.to_ascii_lowercase();
    if lower.is_ascii_lowercase() || lower.is_ascii_digit() {
      if key.len() >= MAX_KEY_LEN {
        break;
      }
      key.push(lower);
    } else if !key.is_empty() && !key.ends_with('_') && key.len() < MAX_KEY_LEN {
      key.push('_');
    }
  }
  while key.ends_with('_') {
    key.pop();
  }
  if key.is_empty() {
    key = format!("asset_{id}");
  }
  key
}

/// A content store of base images, one file per asset, keyed by sanitized
/// asset name.
#[derive(Debug, Clone)]
pub struct BaseImageCache {
  dir: PathBuf,
}
impl BaseImageCache {
  /// Makes a cache over the given directory. The directory is created lazily
  /// on the first write.
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn path_for(&self, name: &str, id: u64) -> PathBuf {
    self.dir.join(format!("{}.png", sanitize_name(name, id)))
  }

  /// Returns the base image bytes for an asset.
  ///
  /// On a hit this is a plain file read with no fetch. On a miss `fetch` is
  /// called once and its bytes are persisted before being returned; from
  /// then on the file is treated as immutable ground truth for the asset.
  pub fn get_or_fetch<F>(&self, name: &str, id: u64, fetch: F) -> Result<Vec<u8>, CacheError>
  where
    F: FnOnce() -> Result<Vec<u8>, crate::batch::StoreError>,
  {
    let path = self.path_for(name, id);
    match fs::read(&path) {
      Ok(bytes) => {
        log::debug!("base image cache hit: {}", path.display());
        Ok(bytes)
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        let bytes = fetch().map_err(CacheError::Fetch)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, &bytes)?;
        log::debug!("base image cached: {} ({} bytes)", path.display(), bytes.len());
        Ok(bytes)
      }
      Err(e) => Err(CacheError::Io(e)),
    }
  }

  /// The directory this cache stores files under.
  #[must_use]
  pub fn dir(&self) -> &Path {
    &self.dir
  }
}
