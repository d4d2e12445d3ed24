use std::collections::HashMap;
use std::path::PathBuf;

use retint::png::{decode, encode};
use retint::{
  Batch, BatchConfig, BatchResult, Bitmap, Color, IconAsset, IconStore, StoreError, RGBA8,
};

/// An in-memory icon store standing in for the remote one.
#[derive(Debug, Default)]
struct MemStore {
  assets: Vec<IconAsset>,
  blobs: HashMap<String, Vec<u8>>,
  next_id: u64,
  fetches: u32,
  fail_delete: bool,
}
impl MemStore {
  fn add_asset(&mut self, name: &str, ext: &str, bytes: Vec<u8>) -> u64 {
    let id = self.next_id;
    self.next_id += 1;
    let url = format!("mem://{id}.{ext}");
    self.blobs.insert(url.clone(), bytes);
    self.assets.push(IconAsset { id, name: name.to_string(), url });
    id
  }

  fn asset_named(&self, name: &str) -> Option<&IconAsset> {
    self.assets.iter().find(|a| a.name == name)
  }

  fn bytes_of(&self, name: &str) -> Option<&Vec<u8>> {
    self.blobs.get(&self.asset_named(name)?.url)
  }
}
impl IconStore for MemStore {
  fn list(&mut self) -> Result<Vec<IconAsset>, StoreError> {
    Ok(self.assets.clone())
  }

  fn fetch(&mut self, url: &str) -> Result<Vec<u8>, StoreError> {
    self.fetches += 1;
    self.blobs.get(url).cloned().ok_or_else(|| StoreError(format!("no blob at {url}")))
  }

  fn create(&mut self, name: &str, bytes: &[u8]) -> Result<IconAsset, StoreError> {
    if self.assets.iter().any(|a| a.name == name) {
      return Err(StoreError(format!("duplicate name {name:?}")));
    }
    let id = self.next_id;
    self.next_id += 1;
    let url = format!("mem://{id}.png");
    self.blobs.insert(url.clone(), bytes.to_vec());
    let asset = IconAsset { id, name: name.to_string(), url };
    self.assets.push(asset.clone());
    Ok(asset)
  }

  fn delete(&mut self, id: u64) -> Result<(), StoreError> {
    if self.fail_delete {
      return Err(StoreError("delete is down".to_string()));
    }
    let before = self.assets.len();
    self.assets.retain(|a| a.id != id);
    if self.assets.len() == before {
      return Err(StoreError(format!("no asset {id}")));
    }
    Ok(())
  }

  fn rename(&mut self, id: u64, name: &str) -> Result<(), StoreError> {
    if self.assets.iter().any(|a| a.id != id && a.name == name) {
      return Err(StoreError(format!("duplicate name {name:?}")));
    }
    match self.assets.iter_mut().find(|a| a.id == id) {
      Some(asset) => {
        asset.name = name.to_string();
        Ok(())
      }
      None => Err(StoreError(format!("no asset {id}"))),
    }
  }
}

/// A fresh per-test cache directory, so tests never see each other's files.
fn fresh_cache_dir(test: &str) -> PathBuf {
  let dir = std::env::temp_dir().join(format!("retint-test-{}-{test}", std::process::id()));
  let _ = std::fs::remove_dir_all(&dir);
  dir
}

fn test_batch(test: &str, workers: usize) -> Batch {
  Batch::new(BatchConfig {
    workers,
    cache_dir: fresh_cache_dir(test),
    ..BatchConfig::default()
  })
}

fn solid_png(color: RGBA8, width: u32, height: u32) -> Vec<u8> {
  encode(&Bitmap {
    width,
    height,
    pixels: vec![color; (width * height) as usize],
  })
}

const TARGET: Color = Color { r: 0x33, g: 0x66, b: 0x99, a: 255 };

#[test]
fn test_batch_recolors_and_keeps_names() {
  let mut store = MemStore::default();
  store.add_asset("fire", "png", solid_png(RGBA8 { r: 200, g: 0, b: 0, a: 255 }, 4, 4));
  store.add_asset("ice", "png", solid_png(RGBA8 { r: 0, g: 0, b: 200, a: 255 }, 4, 4));

  let batch = test_batch("recolors", 2);
  let result = batch.run(&mut store, TARGET, |_, _| {}).unwrap();
  assert_eq!(result, BatchResult { updated: 2, skipped: 0, failed: 0 });

  // names survive, bytes are recolored, and no temp-named assets linger.
  assert_eq!(store.assets.len(), 2);
  for name in ["fire", "ice"] {
    let decoded = decode(store.bytes_of(name).unwrap()).unwrap();
    assert!(decoded
      .pixels
      .iter()
      .all(|p| (p.r, p.g, p.b) == (TARGET.r, TARGET.g, TARGET.b)));
  }
}

#[test]
fn test_one_corrupt_job_does_not_abort_the_batch() {
  let mut store = MemStore::default();
  store.add_asset("first", "png", solid_png(RGBA8 { r: 1, g: 2, b: 3, a: 255 }, 4, 4));
  store.add_asset("broken", "png", b"not a png at all".to_vec());
  store.add_asset("third", "png", solid_png(RGBA8 { r: 4, g: 5, b: 6, a: 255 }, 4, 4));

  let batch = test_batch("corrupt-middle", 2);
  let result = batch.run(&mut store, TARGET, |_, _| {}).unwrap();
  assert_eq!(result, BatchResult { updated: 2, skipped: 0, failed: 1 });

  // both valid assets were still published.
  for name in ["first", "third"] {
    let decoded = decode(store.bytes_of(name).unwrap()).unwrap();
    assert_eq!(decoded.pixels[0].r, TARGET.r);
  }
}

#[test]
fn test_unnamed_and_non_png_assets_are_skipped() {
  let mut store = MemStore::default();
  store.add_asset("", "png", solid_png(RGBA8 { r: 9, g: 9, b: 9, a: 255 }, 2, 2));
  store.add_asset("animated", "gif", vec![1, 2, 3]);
  store.add_asset("good", "png", solid_png(RGBA8 { r: 9, g: 9, b: 9, a: 255 }, 2, 2));

  let batch = test_batch("skips", 1);
  let result = batch.run(&mut store, TARGET, |_, _| {}).unwrap();
  assert_eq!(result, BatchResult { updated: 1, skipped: 2, failed: 0 });
  // skipped assets were never even fetched.
  assert_eq!(store.fetches, 1);
}

#[test]
fn test_progress_reports_every_outcome() {
  let mut store = MemStore::default();
  store.add_asset("a", "png", solid_png(RGBA8 { r: 9, g: 9, b: 9, a: 255 }, 2, 2));
  store.add_asset("b", "gif", vec![]);
  store.add_asset("c", "png", b"garbage".to_vec());

  let mut calls: Vec<(u32, u32)> = Vec::new();
  let batch = test_batch("progress", 2);
  let result = batch.run(&mut store, TARGET, |current, total| calls.push((current, total))).unwrap();

  assert_eq!(result.updated + result.skipped + result.failed, 3);
  assert_eq!(calls.first(), Some(&(0, 3)));
  assert_eq!(calls.last(), Some(&(3, 3)));
  let currents: Vec<u32> = calls.iter().map(|(c, _)| *c).collect();
  assert_eq!(currents, vec![0, 1, 2, 3]);
  assert!(calls.iter().all(|(_, t)| *t == 3));
}

#[test]
fn test_cache_makes_reruns_idempotent() {
  let mut store = MemStore::default();
  let base = solid_png(RGBA8 { r: 10, g: 200, b: 30, a: 255 }, 4, 4);
  store.add_asset("emblem", "png", base);

  let cache_dir = fresh_cache_dir("idempotent");
  let config = BatchConfig { workers: 1, cache_dir, ..BatchConfig::default() };

  let batch = Batch::new(config.clone());
  let first = batch.run(&mut store, TARGET, |_, _| {}).unwrap();
  assert_eq!(first.updated, 1);
  assert_eq!(store.fetches, 1);
  let after_first = store.bytes_of("emblem").unwrap().clone();

  // second run: no new fetch, and the output is identical because it starts
  // from the cached base image rather than the recolored bytes.
  let batch = Batch::new(config);
  let second = batch.run(&mut store, TARGET, |_, _| {}).unwrap();
  assert_eq!(second.updated, 1);
  assert_eq!(store.fetches, 1);
  assert_eq!(store.bytes_of("emblem").unwrap(), &after_first);
}

#[test]
fn test_failed_publish_leaves_a_detectable_duplicate() {
  let mut store = MemStore::default();
  store.add_asset("stuck", "png", solid_png(RGBA8 { r: 9, g: 9, b: 9, a: 255 }, 2, 2));
  store.fail_delete = true;

  let batch = test_batch("publish-fail", 1);
  let result = batch.run(&mut store, TARGET, |_, _| {}).unwrap();
  assert_eq!(result, BatchResult { updated: 0, skipped: 0, failed: 1 });

  // the original is still there and the temp-named copy is detectable.
  assert!(store.asset_named("stuck").is_some());
  assert!(store.asset_named("stuck_tmp").is_some());
}

#[test]
fn test_counters_conserve_across_hundreds_of_jobs() {
  let mut store = MemStore::default();
  let n: u32 = 300;
  for i in 0..n {
    match i % 3 {
      0 => {
        let pixel = RGBA8 { r: (i % 255) as u8, g: 10, b: 20, a: 255 };
        store.add_asset(&format!("icon_{i}"), "png", solid_png(pixel, 3, 3));
      }
      1 => {
        store.add_asset(&format!("anim_{i}"), "gif", vec![1, 2, 3]);
      }
      _ => {
        store.add_asset(&format!("bad_{i}"), "png", b"corrupt".to_vec());
      }
    }
  }

  let batch = test_batch("conservation", 4);
  let mut progress_calls = 0_u32;
  let result = batch.run(&mut store, TARGET, |_, _| progress_calls += 1).unwrap();

  assert_eq!(result.updated + result.skipped + result.failed, n);
  assert_eq!(result.updated, n / 3);
  assert_eq!(result.skipped, n / 3);
  assert_eq!(result.failed, n / 3);
  assert_eq!(progress_calls, n + 1);
}

#[test]
fn test_list_failure_aborts_the_run() {
  struct DeadStore;
  impl IconStore for DeadStore {
    fn list(&mut self) -> Result<Vec<IconAsset>, StoreError> {
      Err(StoreError("listing is down".to_string()))
    }
    fn fetch(&mut self, _url: &str) -> Result<Vec<u8>, StoreError> {
      unreachable!("fetch should never run when list fails")
    }
    fn create(&mut self, _name: &str, _bytes: &[u8]) -> Result<IconAsset, StoreError> {
      unreachable!()
    }
    fn delete(&mut self, _id: u64) -> Result<(), StoreError> {
      unreachable!()
    }
    fn rename(&mut self, _id: u64, _name: &str) -> Result<(), StoreError> {
      unreachable!()
    }
  }

  let batch = test_batch("list-fails", 1);
  assert!(batch.run(&mut DeadStore, TARGET, |_, _| {}).is_err());
}
