use crate::color::Color;
use crate::image::{Bitmap, RGBA8};

/// Remaps every pixel of `source` to the target color.
///
/// Pure black is the mask color: any `(0,0,0)` pixel comes out fully
/// transparent, whatever its original alpha was. Every other pixel takes the
/// target's RGB, with its existing alpha scaled by the target's alpha
/// (rounded to nearest).
///
/// The input is left untouched and a new bitmap is returned. The transform
/// is one-directional: once a pixel has been remapped there is no telling
/// what it used to be, so running it twice on the same image corrupts it.
/// Callers must always start from the pristine source bytes (see
/// [`BaseImageCache`](crate::BaseImageCache)).
#[must_use]
pub fn recolor(source: &Bitmap, target: Color) -> Bitmap {
  let pixels: Vec<RGBA8> = source
    .pixels
    .iter()
    .map(|p| {
      if (p.r, p.g, p.b) == (0, 0, 0) {
        RGBA8 { r: 0, g: 0, b: 0, a: 0 }
      } else {
        let a = ((u32::from(p.a) * u32::from(target.a) + 127) / 255) as u8;
        RGBA8 { r: target.r, g: target.g, b: target.b, a }
      }
    })
    .collect();
  Bitmap { width: source.width, height: source.height, pixels }
}
