//! Height palette and the banding policy that maps heights onto it.
//!
//! Band `i` covers heights in `[40 * i, 40 * (i + 1))` meters. Heights past
//! the last band, negative heights and non-finite heights are clamped into
//! the palette instead of failing: the source height data has known quality
//! problems and every formation still has to resolve to a visible color.
//! Clamping is reported through [`HeightWarning`] so callers can flag those
//! records separately.

use crate::error::{BigWallError, Result};
use once_cell::sync::Lazy;
use serde::Serialize;

/// Width of one height band in meters.
pub const BAND_WIDTH_METERS: f64 = 40.0;

/// Number of entries in the built-in palette.
pub const DEFAULT_PALETTE_LEN: usize = 40;

/// Gradient stops for the built-in palette, low to high.
const GRADIENT_STOPS: [(u8, u8, u8); 5] = [
    (0xff, 0xff, 0xb2),
    (0xfe, 0xcc, 0x5c),
    (0xfd, 0x8d, 0x3c),
    (0xf0, 0x3b, 0x20),
    (0xbd, 0x00, 0x26),
];

static DEFAULT_COLORS: Lazy<Vec<String>> = Lazy::new(|| {
    let segments = (GRADIENT_STOPS.len() - 1) as f64;
    (0..DEFAULT_PALETTE_LEN)
        .map(|i| {
            let t = i as f64 / (DEFAULT_PALETTE_LEN - 1) as f64 * segments;
            let lo = (t.floor() as usize).min(GRADIENT_STOPS.len() - 2);
            let frac = t - lo as f64;
            let (a, b) = (GRADIENT_STOPS[lo], GRADIENT_STOPS[lo + 1]);
            let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
            format!("#{:02x}{:02x}{:02x}", mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
        })
        .collect()
});

/// Fixed, ordered list of hex colors, one per height band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    /// Build a palette from `#rrggbb` colors; the length is fixed from here on.
    pub fn new(colors: Vec<String>) -> Result<Self> {
        if colors.is_empty() {
            return Err(BigWallError::Config(
                "palette must contain at least one color".to_string(),
            ));
        }
        for (idx, color) in colors.iter().enumerate() {
            if !is_hex_color(color) {
                return Err(BigWallError::Config(format!(
                    "palette entry {} is not a #rrggbb color: {:?}",
                    idx, color
                )));
            }
        }
        Ok(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn color(&self, index: usize) -> Option<&str> {
        self.colors.get(index).map(String::as_str)
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    /// Heights at or above this value land in the last band.
    pub fn covered_height(&self) -> f64 {
        self.colors.len() as f64 * BAND_WIDTH_METERS
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.clone(),
        }
    }
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Why a height was clamped into the palette.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeightWarning {
    /// Below zero; shown in band 0.
    Negative { height: f64 },
    /// NaN or infinite; shown in band 0.
    NotFinite,
    /// At or past the palette's covered range; shown in the last band.
    AboveRange { height: f64, covered: f64 },
}

/// Band chosen for a height, with the clamp reason if one applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandAssignment {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<HeightWarning>,
}

/// Maps formation heights to palette bands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorBander {
    palette: Palette,
}

impl ColorBander {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// `floor(height / 40)` clamped into `[0, palette.len() - 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bigwall::palette::ColorBander;
    ///
    /// let bander = ColorBander::default();
    /// assert_eq!(bander.band_index(0.0), 0);
    /// assert_eq!(bander.band_index(455.0), 11);
    /// assert_eq!(bander.band_index(1_600.0), 39);
    /// assert_eq!(bander.band_index(-12.0), 0);
    /// ```
    pub fn band_index(&self, height: f64) -> usize {
        self.assign(height).index
    }

    pub fn assign(&self, height: f64) -> BandAssignment {
        let last = self.palette.len() - 1;

        if !height.is_finite() {
            return BandAssignment {
                index: if height == f64::INFINITY { last } else { 0 },
                warning: Some(HeightWarning::NotFinite),
            };
        }
        if height < 0.0 {
            return BandAssignment {
                index: 0,
                warning: Some(HeightWarning::Negative { height }),
            };
        }

        let band = (height / BAND_WIDTH_METERS).floor();
        if band >= last as f64 {
            let covered = self.palette.covered_height();
            return BandAssignment {
                index: last,
                warning: (height >= covered).then_some(HeightWarning::AboveRange { height, covered }),
            };
        }

        BandAssignment {
            index: band as usize,
            warning: None,
        }
    }

    /// Palette color for a height.
    pub fn color_for(&self, height: f64) -> &str {
        let index = self.band_index(height);
        &self.palette.colors[index]
    }
}
