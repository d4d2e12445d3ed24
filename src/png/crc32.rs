/// The reflected CRC32 polynomial that PNG uses.
const POLY: u32 = 0xEDB8_8320;

/// One entry per possible byte, each holding eight shift-and-divide rounds.
const CRC_TABLE: [u32; 256] = {
  let mut table = [0_u32; 256];
  let mut byte = 0_usize;
  while byte < 256 {
    let mut crc = byte as u32;
    let mut round = 0;
    while round < 8 {
      crc = if (crc & 1) != 0 { POLY ^ (crc >> 1) } else { crc >> 1 };
      round += 1;
    }
    table[byte] = crc;
    byte += 1;
  }
  table
};

/// The CRC32 used by PNG chunk trailers.
#[inline]
pub fn png_crc(iter: impl Iterator<Item = u8>) -> u32 {
  let crc = iter.fold(u32::MAX, |crc, byte| {
    CRC_TABLE[usize::from((crc as u8) ^ byte)] ^ (crc >> 8)
  });
  crc ^ u32::MAX
}
