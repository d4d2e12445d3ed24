#![forbid(unsafe_code)]

//! Batch recoloring for small PNG icon assets.
//!
//! The crate takes a set of icon assets from a remote store, recolors each
//! one to a single target color, and publishes the recolored bytes back to
//! the store. The pieces involved:
//!
//! * [`png`] — a decoder/encoder for the subset of PNG that icon assets
//!   actually use (8-bit RGBA, non-interlaced). Anything outside that subset
//!   is rejected up front rather than mis-rendered.
//! * [`recolor`](recolor()) — the pure pixel transform. Black pixels are a
//!   mask color and become fully transparent, everything else takes the
//!   target color.
//! * [`BaseImageCache`] — a disk cache of the pristine source bytes, so that
//!   repeated recolor runs always start from the original image instead of
//!   compounding on an already-recolored one.
//! * [`WorkerPool`] — a fixed set of OS threads that run the CPU-bound
//!   decode/recolor/encode cycle off the caller's thread.
//! * [`Batch`] — drives the whole thing across an asset list, isolating
//!   per-asset failures and reporting progress as it goes.

pub mod color;
pub use color::*;

pub mod image;
pub use image::*;

pub mod png;

mod recolor;
pub use recolor::*;

pub mod cache;
pub use cache::*;

pub mod pool;
pub use pool::*;

pub mod batch;
pub use batch::*;
