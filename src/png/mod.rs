//! PNG decoding and encoding for the subset of the format that icon assets
//! use.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! Only non-interlaced, 8-bit RGBA (color type 6) images are handled. That
//! is what every icon asset this crate deals with actually is, and anything
//! else fails fast with a [`PngError`] instead of silently mis-rendering.
//! Palettes, other bit depths, interlacing, and ancillary chunk semantics
//! are all out of scope; ancillary chunks are skipped over, not parsed.
//!
//! [`decode`] walks the chunk stream, treats every `IDAT` payload as one
//! zlib stream (a PNG may split its image data across any number of `IDAT`
//! chunks), inflates it, and reverses the per-scanline filtering to produce
//! a [`Bitmap`]. [`encode`] does the reverse with filter type 0 on every
//! line, which costs some compression ratio and buys a much simpler encoder.

mod crc32;
pub use crc32::png_crc;

mod raw_chunk;
pub use raw_chunk::{RawChunk, RawChunkIter};
pub(crate) use raw_chunk::push_chunk;

mod unfilter;
use unfilter::{filter_none, unfilter_scanlines, BYTES_PER_PIXEL};

use core::fmt::{self, Display};

use crate::image::{Bitmap, RGBA8};

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// The decoder refuses images wider or taller than this.
///
/// The inflate buffer is sized from the declared header dimensions, so a
/// malformed 60-byte file could otherwise demand an arbitrarily large
/// allocation. Icon assets are tiny; this cap is already generous for them.
pub const MAX_DIMENSION: u32 = 16_384;

/// An error while decoding PNG bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PngError {
  /// The first 8 bytes aren't the PNG signature.
  BadSignature,
  /// The first chunk wasn't a well-formed `IHDR`.
  MissingHeader,
  /// `IHDR` itself was malformed (wrong length, zero dimensions, or a
  /// nonzero compression/filter method).
  BadHeader,
  /// Only bit depth 8 is supported.
  UnsupportedBitDepth(u8),
  /// Only RGBA (color type 6) is supported.
  UnsupportedColorType(u8),
  /// Interlaced images are not supported.
  Interlaced,
  /// Width or height exceeds [`MAX_DIMENSION`].
  DimensionsTooLarge,
  /// No `IDAT` chunk before `IEND`.
  MissingImageData,
  /// The `IDAT` payload didn't decompress as a zlib stream.
  Inflate,
  /// The decompressed data didn't cover `(1 + width*4) * height` bytes.
  WrongPixelCount,
  /// A scanline's filter byte was outside `0..=4`.
  BadFilterType(u8),
}
impl Display for PngError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::BadSignature => f.write_str("bytes are not a png"),
      Self::MissingHeader => f.write_str("first chunk is not IHDR"),
      Self::BadHeader => f.write_str("malformed IHDR chunk"),
      Self::UnsupportedBitDepth(d) => write!(f, "unsupported bit depth {d}"),
      Self::UnsupportedColorType(c) => write!(f, "unsupported color type {c}"),
      Self::Interlaced => f.write_str("interlaced images are not supported"),
      Self::DimensionsTooLarge => f.write_str("image dimensions are too large"),
      Self::MissingImageData => f.write_str("no IDAT chunk found"),
      Self::Inflate => f.write_str("IDAT decompression failed"),
      Self::WrongPixelCount => f.write_str("decompressed data has the wrong length"),
      Self::BadFilterType(t) => write!(f, "invalid scanline filter type {t}"),
    }
  }
}
impl std::error::Error for PngError {}

/// Checks if the PNG's initial 8 bytes are correct.
pub const fn is_png_signature_correct(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}

fn parse_ihdr(data: &[u8]) -> Result<(u32, u32), PngError> {
  match data {
    [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression, filter, interlace] => {
      let width = u32::from_be_bytes([*w0, *w1, *w2, *w3]);
      let height = u32::from_be_bytes([*h0, *h1, *h2, *h3]);
      if width == 0 || height == 0 || *compression != 0 || *filter != 0 {
        return Err(PngError::BadHeader);
      }
      if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(PngError::DimensionsTooLarge);
      }
      if *bit_depth != 8 {
        return Err(PngError::UnsupportedBitDepth(*bit_depth));
      }
      if *color_type != 6 {
        return Err(PngError::UnsupportedColorType(*color_type));
      }
      if *interlace != 0 {
        return Err(PngError::Interlaced);
      }
      Ok((width, height))
    }
    _ => Err(PngError::BadHeader),
  }
}

/// Decodes PNG bytes into a [`Bitmap`].
///
/// ## Failure
/// * The signature, `IHDR`, zlib stream, and scanline filters are all
///   validated; see [`PngError`] for the ways each can go wrong. On any
///   error nothing is returned, there is no partial output.
pub fn decode(bytes: &[u8]) -> Result<Bitmap, PngError> {
  if !is_png_signature_correct(bytes) {
    return Err(PngError::BadSignature);
  }
  let mut it = RawChunkIter::new(bytes);
  let (width, height) = match it.next() {
    Some(chunk) if chunk.ty == *b"IHDR" => parse_ihdr(chunk.data)?,
    _ => return Err(PngError::MissingHeader),
  };

  // All IDAT payloads form a single zlib stream, however many chunks the
  // encoder split it across. Chunks of any other type in between don't
  // matter here. Scanning stops at IEND.
  let mut idat_slices: Vec<&[u8]> = Vec::new();
  for chunk in it {
    match &chunk.ty {
      b"IDAT" => idat_slices.push(chunk.data),
      b"IEND" => break,
      _ => (),
    }
  }
  if idat_slices.is_empty() {
    return Err(PngError::MissingImageData);
  }

  let filtered_len = (1 + (width as usize) * BYTES_PER_PIXEL) * (height as usize);
  let mut filtered: Vec<u8> = vec![0; filtered_len];
  match miniz_oxide::inflate::decompress_slice_iter_to_slice(
    &mut filtered,
    idat_slices.iter().copied(),
    true,
    true,
  ) {
    Ok(count) if count == filtered_len => (),
    Ok(_) => return Err(PngError::WrongPixelCount),
    Err(_) => return Err(PngError::Inflate),
  }

  let pixel_bytes = unfilter_scanlines(&filtered, width, height)?;
  let pixels: Vec<RGBA8> = bytemuck::cast_slice(&pixel_bytes).to_vec();
  Ok(Bitmap { width, height, pixels })
}

/// Encodes a [`Bitmap`] as PNG bytes: 8-bit RGBA, non-interlaced, filter
/// type 0 on every scanline, one `IDAT` chunk.
#[must_use]
pub fn encode(bitmap: &Bitmap) -> Vec<u8> {
  let filtered = filter_none(bitmap.as_bytes(), bitmap.width, bitmap.height);
  let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&filtered, 6);

  let mut ihdr_data = [0_u8; 13];
  ihdr_data[0..4].copy_from_slice(&bitmap.width.to_be_bytes());
  ihdr_data[4..8].copy_from_slice(&bitmap.height.to_be_bytes());
  ihdr_data[8] = 8; // bit depth
  ihdr_data[9] = 6; // color type: RGBA
  // compression, filter, and interlace methods stay 0.

  let mut out: Vec<u8> = Vec::with_capacity(compressed.len() + 12 * 3 + 8 + 13);
  out.extend_from_slice(&PNG_SIGNATURE);
  push_chunk(&mut out, *b"IHDR", &ihdr_data);
  push_chunk(&mut out, *b"IDAT", &compressed);
  push_chunk(&mut out, *b"IEND", &[]);
  out
}
