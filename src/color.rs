use crate::error::{PixelError, Result};
use std::str::FromStr;

/// Parses `#RRGGBB` (the `#` is optional) into its components.
pub fn hex_to_rgb(hex: &str) -> Result<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.chars().count() != 6 {
        return Err(PixelError::color(format!(
            "{} must be exactly 6 hex digits after '#'",
            hex
        )));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PixelError::color(format!("{} contains invalid hex digits", hex)));
    }

    let channel = |at: usize| u8::from_str_radix(&digits[at..at + 2], 16).unwrap_or_default();
    Ok((channel(0), channel(2), channel(4)))
}

pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Per-pixel color transform applied when deriving an edited image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Filter {
    Grayscale,
    Sepia,
}

impl Filter {
    pub fn name(self) -> &'static str {
        match self {
            Filter::Grayscale => "grayscale",
            Filter::Sepia => "sepia",
        }
    }

    pub fn apply_rgb(self, (r, g, b): (u8, u8, u8)) -> (u8, u8, u8) {
        let (r, g, b) = (r as f64, g as f64, b as f64);
        match self {
            Filter::Grayscale => {
                let gray = (0.2989 * r + 0.5870 * g + 0.1140 * b) as u8;
                (gray, gray, gray)
            }
            Filter::Sepia => {
                // `as u8` saturates, matching min(.., 255)
                let sr = (0.393 * r + 0.769 * g + 0.189 * b) as u8;
                let sg = (0.349 * r + 0.686 * g + 0.168 * b) as u8;
                let sb = (0.272 * r + 0.534 * g + 0.131 * b) as u8;
                (sr, sg, sb)
            }
        }
    }

    /// Applies the filter to a hex color string.
    pub fn apply(self, hex: &str) -> Result<String> {
        let (r, g, b) = self.apply_rgb(hex_to_rgb(hex)?);
        Ok(rgb_to_hex(r, g, b))
    }
}

impl FromStr for Filter {
    type Err = PixelError;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "grayscale" => Ok(Filter::Grayscale),
            "sepia" => Ok(Filter::Sepia),
            _ => Err(PixelError::UnsupportedFilter {
                name: name.to_string(),
            }),
        }
    }
}
