//! The target color for a recolor run, and parsing it from hex input.

use core::fmt::{self, Debug, Display};

/// An 8-bit RGBA color.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

/// An error from [`Color::from_hex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorParseError {
  /// The input wasn't 6 or 8 hex digits (after any leading `#`).
  WrongLength,
  /// A character in the input wasn't a hex digit.
  NotHex,
}
impl Display for ColorParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::WrongLength => f.write_str("color must be 6 or 8 hex digits"),
      Self::NotHex => f.write_str("color contains a non-hex digit"),
    }
  }
}
impl std::error::Error for ColorParseError {}

impl Color {
  /// Parses a color from hex digits.
  ///
  /// Accepts `RRGGBB` (alpha defaults to 255) or `AARRGGBB`, with an
  /// optional leading `#` in either case.
  ///
  /// ```
  /// # use retint::Color;
  /// assert_eq!(Color::from_hex("#336699"), Ok(Color { r: 0x33, g: 0x66, b: 0x99, a: 255 }));
  /// assert_eq!(Color::from_hex("80ff0000"), Ok(Color { r: 255, g: 0, b: 0, a: 0x80 }));
  /// ```
  pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
      return Err(ColorParseError::NotHex);
    }
    let byte_at = |i: usize| {
      // the caller has checked both length and digit validity already.
      u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0)
    };
    match digits.len() {
      6 => Ok(Self { r: byte_at(0), g: byte_at(2), b: byte_at(4), a: 255 }),
      8 => Ok(Self { a: byte_at(0), r: byte_at(2), g: byte_at(4), b: byte_at(6) }),
      _ => Err(ColorParseError::WrongLength),
    }
  }
}

impl Debug for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    Display::fmt(self, f)
  }
}
impl Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
  }
}
