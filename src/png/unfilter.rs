use super::PngError;

/// Bytes per pixel for the one pixel format this crate handles (RGBA8).
pub(crate) const BYTES_PER_PIXEL: usize = 4;

pub(crate) const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // The PNG spec is extremely specific that you shall not, under any
  // circumstances, alter the order of evaluation of this expression's tests.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Reverses the per-scanline filtering of decompressed PNG image data.
///
/// `filtered` is `height` scanlines, each one a filter-type byte followed by
/// `width * 4` pixel bytes. The output is the reconstructed pixel bytes with
/// the filter bytes stripped.
///
/// Each filter refers to already-reconstructed neighbor bytes: `left` (same
/// row, one pixel back), `up` (previous row, same column), and `up_left`.
/// Neighbors that fall outside the image are zero. Looking those up in the
/// output buffer directly keeps this a pure function of its input, rather
/// than something carrying cursor state between rows.
///
/// ## Failure
/// * `BadFilterType` if any scanline's filter byte is outside `0..=4`.
pub(crate) fn unfilter_scanlines(
  filtered: &[u8], width: u32, height: u32,
) -> Result<Vec<u8>, PngError> {
  let line_len = (width as usize) * BYTES_PER_PIXEL;
  let mut out: Vec<u8> = Vec::with_capacity(line_len * (height as usize));
  for (y, filter_line) in filtered.chunks_exact(1 + line_len).enumerate().take(height as usize) {
    let (filter_ty, raw_line) = (filter_line[0], &filter_line[1..]);
    let row_start = y * line_len;
    for (i, raw) in raw_line.iter().copied().enumerate() {
      let left = if i >= BYTES_PER_PIXEL { out[row_start + i - BYTES_PER_PIXEL] } else { 0 };
      let up = if y > 0 { out[row_start - line_len + i] } else { 0 };
      let up_left = if y > 0 && i >= BYTES_PER_PIXEL {
        out[row_start - line_len + i - BYTES_PER_PIXEL]
      } else {
        0
      };
      let value = match filter_ty {
        0 => raw,
        1 => raw.wrapping_add(left),
        2 => raw.wrapping_add(up),
        3 => raw.wrapping_add(((u32::from(left) + u32::from(up)) / 2) as u8),
        4 => raw.wrapping_add(paeth_predict(left, up, up_left)),
        other => return Err(PngError::BadFilterType(other)),
      };
      out.push(value);
    }
  }
  Ok(out)
}

/// Applies filter type 0 to every scanline: each output line is the filter
/// byte `0` followed by the raw pixel bytes.
///
/// Icon assets are small, so the encoder trades compression ratio for the
/// simplicity of never predicting anything.
pub(crate) fn filter_none(pixel_bytes: &[u8], width: u32, height: u32) -> Vec<u8> {
  let line_len = (width as usize) * BYTES_PER_PIXEL;
  let mut out: Vec<u8> = Vec::with_capacity((1 + line_len) * (height as usize));
  for line in pixel_bytes.chunks_exact(line_len).take(height as usize) {
    out.push(0);
    out.extend_from_slice(line);
  }
  out
}
