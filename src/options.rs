//! Generation options and the color / error-correction value types they carry.
//!
//! A [`GenerationOptions`] value is an immutable snapshot: the session clones it at
//! the moment a generation starts, so later edits never reach an attempt in flight.

use std::fmt;
use std::str::FromStr;

use image::Rgba;

use crate::error::{Error, Result};

/// Default edge length of the composed image, in pixels.
pub const DEFAULT_SIZE: u32 = 300;

/// Largest accepted edge length, in pixels.
pub const MAX_SIZE: u32 = 4096;

/// Quiet-zone width around the symbol, in modules.
pub const DEFAULT_MARGIN: u32 = 2;

/// The error correction level of a QR symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EcLevel {
    /// Tolerates ~7% erroneous codewords.
    L,
    /// Tolerates ~15% erroneous codewords.
    #[default]
    M,
    /// Tolerates ~25% erroneous codewords.
    Q,
    /// Tolerates ~30% erroneous codewords.
    H,
}

impl EcLevel {
    /// Single-letter name, as shown in the level picker.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        }
    }
}

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::L => Self::L,
            EcLevel::M => Self::M,
            EcLevel::Q => Self::Q,
            EcLevel::H => Self::H,
        }
    }
}

impl FromStr for EcLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(Self::L),
            "M" => Ok(Self::M),
            "Q" => Ok(Self::Q),
            "H" => Ok(Self::H),
            _ => Err(Error::EncodeFailed(format!("unsupported error correction level {s:?}"))),
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Formats as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(self) -> String {
        if self.a == u8::MAX {
            format!("#{}", hex::encode([self.r, self.g, self.b]))
        } else {
            format!("#{}", hex::encode([self.r, self.g, self.b, self.a]))
        }
    }
}

impl From<Color> for Rgba<u8> {
    fn from(c: Color) -> Self {
        Rgba([c.r, c.g, c.b, c.a])
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches('#');
        let expanded: String = if digits.len() == 3 {
            digits.chars().flat_map(|c| [c, c]).collect()
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(&expanded).map_err(|_| Error::InvalidColor(s.to_string()))?;
        match bytes.as_slice() {
            &[r, g, b] => Ok(Self::rgb(r, g, b)),
            &[r, g, b, a] => Ok(Self { r, g, b, a }),
            _ => Err(Error::InvalidColor(s.to_string())),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Everything one generation needs besides the logo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Text or URL to encode. Surrounding whitespace is ignored.
    pub payload: String,
    /// Edge length of the square output, in pixels.
    pub size: u32,
    pub error_correction: EcLevel,
    pub foreground: Color,
    pub background: Color,
    /// Quiet zone around the symbol, in modules.
    pub margin: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            payload: String::new(),
            size: DEFAULT_SIZE,
            error_correction: EcLevel::default(),
            foreground: Color::BLACK,
            background: Color::WHITE,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl GenerationOptions {
    /// Default options for the given payload.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_error_correction(mut self, level: EcLevel) -> Self {
        self.error_correction = level;
        self
    }

    pub fn with_colors(mut self, foreground: Color, background: Color) -> Self {
        self.foreground = foreground;
        self.background = background;
        self
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    /// The payload with surrounding whitespace removed.
    pub fn trimmed_payload(&self) -> &str {
        self.payload.trim()
    }

    /// Label shown next to the size slider, e.g. `300px`.
    pub fn size_label(&self) -> String {
        format!("{}px", self.size)
    }

    /// Checks the invariants every generation relies on.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyPayload`] if the trimmed payload is empty, [`Error::InvalidSize`]
    /// if `size` is zero or larger than [`MAX_SIZE`].
    pub fn validate(&self) -> Result<()> {
        if self.trimmed_payload().is_empty() {
            return Err(Error::EmptyPayload);
        }
        if self.size == 0 || self.size > MAX_SIZE {
            return Err(Error::InvalidSize(self.size));
        }
        Ok(())
    }

    /// Options handed to the encoder for this snapshot.
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            width: self.size,
            height: self.size,
            dark: self.foreground,
            light: self.background,
            error_correction: Some(self.error_correction),
            margin: self.margin,
        }
    }
}

/// The option set understood by a [`SymbolEncoder`](crate::encoder::SymbolEncoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub width: u32,
    pub height: u32,
    pub dark: Color,
    pub light: Color,
    /// `None` leaves the choice to the encoder (level M).
    pub error_correction: Option<EcLevel>,
    pub margin: u32,
}

impl EncodeOptions {
    /// Drops the error correction level, leaving the encoder default.
    pub fn reduced(mut self) -> Self {
        self.error_correction = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colors() {
        assert_eq!("#000000".parse::<Color>().unwrap(), Color::BLACK);
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!(
            "#12345680".parse::<Color>().unwrap(),
            Color { r: 0x12, g: 0x34, b: 0x56, a: 0x80 }
        );
        assert!("#12345".parse::<Color>().is_err());
        assert!("orange".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_hex_round_trip() {
        assert_eq!(Color::rgb(255, 165, 0).to_hex(), "#ffa500");
        let translucent = Color { r: 1, g: 2, b: 3, a: 4 };
        assert_eq!(translucent.to_hex().parse::<Color>().unwrap(), translucent);
    }

    #[test]
    fn test_parse_levels() {
        assert_eq!("q".parse::<EcLevel>().unwrap(), EcLevel::Q);
        assert_eq!(EcLevel::H.to_string(), "H");
        assert!("X".parse::<EcLevel>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(GenerationOptions::new("https://example.com").validate().is_ok());
        assert!(matches!(
            GenerationOptions::new("   \n\t").validate(),
            Err(Error::EmptyPayload)
        ));
        assert!(matches!(
            GenerationOptions::new("x").with_size(0).validate(),
            Err(Error::InvalidSize(0))
        ));
        assert!(matches!(
            GenerationOptions::new("x").with_size(MAX_SIZE + 1).validate(),
            Err(Error::InvalidSize(_))
        ));
    }

    #[test]
    fn test_defaults_and_label() {
        let options = GenerationOptions::new(" hi ");
        assert_eq!(options.trimmed_payload(), "hi");
        assert_eq!(options.size_label(), "300px");
        assert_eq!(options.margin, 2);
        let encode = options.encode_options();
        assert_eq!(encode.error_correction, Some(EcLevel::M));
        assert_eq!(encode.reduced().error_correction, None);
    }
}
