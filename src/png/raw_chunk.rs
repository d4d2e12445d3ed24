use core::fmt::{Debug, Write};

use super::crc32::png_crc;

/// An unparsed chunk from a PNG datastream.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'b> {
  /// The 4-byte ASCII chunk type tag.
  pub ty: [u8; 4],
  /// The chunk payload.
  pub data: &'b [u8],
  /// The CRC the datastream claims for `ty` plus `data`.
  pub declared_crc: u32,
}
impl Debug for RawChunk<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char(self.ty[0] as char)?;
    f.write_char(self.ty[1] as char)?;
    f.write_char(self.ty[2] as char)?;
    f.write_char(self.ty[3] as char)?;
    write!(f, "({} bytes)", self.data.len())
  }
}

/// An iterator over the raw chunks of a PNG datastream.
///
/// The iterator just walks `length, type, data, crc` records. It stops
/// cleanly when the input runs out mid-record, so feeding it truncated or
/// non-PNG bytes produces fewer chunks (possibly zero), never a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct RawChunkIter<'b>(&'b [u8]);
impl<'b> RawChunkIter<'b> {
  /// Pass the full PNG bytes, the 8-byte signature is skipped automatically.
  pub const fn new(bytes: &'b [u8]) -> Self {
    match bytes {
      [_, _, _, _, _, _, _, _, rest @ ..] => Self(rest),
      _ => Self(&[]),
    }
  }

  /// Takes `count` bytes off the front of the remaining input, or ends the
  /// iteration for good when the input can't cover them.
  fn take_front(&mut self, count: usize) -> Option<&'b [u8]> {
    if self.0.len() < count {
      self.0 = &[];
      return None;
    }
    let (taken, rest) = self.0.split_at(count);
    self.0 = rest;
    Some(taken)
  }

  fn take_be_u32(&mut self) -> Option<u32> {
    Some(u32::from_be_bytes(self.take_front(4)?.try_into().ok()?))
  }
}
impl<'b> Iterator for RawChunkIter<'b> {
  type Item = RawChunk<'b>;
  fn next(&mut self) -> Option<Self::Item> {
    let chunk_len = self.take_be_u32()?;
    let ty: [u8; 4] = self.take_front(4)?.try_into().ok()?;
    let data = self.take_front(chunk_len as usize)?;
    let declared_crc = self.take_be_u32()?;
    Some(RawChunk { ty, data, declared_crc })
  }
}

/// Appends one complete chunk to `out`: length, type, data, CRC trailer.
pub(crate) fn push_chunk(out: &mut Vec<u8>, ty: [u8; 4], data: &[u8]) {
  out.extend_from_slice(&(data.len() as u32).to_be_bytes());
  out.extend_from_slice(&ty);
  out.extend_from_slice(data);
  let crc = png_crc(ty.iter().copied().chain(data.iter().copied()));
  out.extend_from_slice(&crc.to_be_bytes());
}
