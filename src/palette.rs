// Category color palettes

use crate::error::ChartError;
use std::fmt;
use std::str::FromStr;

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub const fn from_hex(hex: u32) -> Self {
        Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Component-wise linear interpolation, `t` in [0, 1]
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| {
            (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Which palette the chart draws categories with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteKind {
    #[default]
    Viridis,
    Category10,
}

impl FromStr for PaletteKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viridis" => Ok(PaletteKind::Viridis),
            "category10" => Ok(PaletteKind::Category10),
            _ => Err(ChartError::UnknownPalette(s.to_string())),
        }
    }
}

// Evenly spaced stops along the viridis colormap
const VIRIDIS_STOPS: [Rgb; 9] = [
    Rgb::from_hex(0x440154),
    Rgb::from_hex(0x482878),
    Rgb::from_hex(0x3e4989),
    Rgb::from_hex(0x31688e),
    Rgb::from_hex(0x26828e),
    Rgb::from_hex(0x1f9e89),
    Rgb::from_hex(0x35b779),
    Rgb::from_hex(0x6ece58),
    Rgb::from_hex(0xfde725),
];

const CATEGORY10: [Rgb; 10] = [
    Rgb::from_hex(0x1f77b4),
    Rgb::from_hex(0xff7f0e),
    Rgb::from_hex(0x2ca02c),
    Rgb::from_hex(0xd62728),
    Rgb::from_hex(0x9467bd),
    Rgb::from_hex(0x8c564b),
    Rgb::from_hex(0xe377c2),
    Rgb::from_hex(0x7f7f7f),
    Rgb::from_hex(0xbcbd22),
    Rgb::from_hex(0x17becf),
];

/// Map `t` in [0, 1] onto the viridis colormap
pub fn viridis(t: f64) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let segments = (VIRIDIS_STOPS.len() - 1) as f64;
    let position = t * segments;
    let idx = (position.floor() as usize).min(VIRIDIS_STOPS.len() - 2);
    VIRIDIS_STOPS[idx].lerp(VIRIDIS_STOPS[idx + 1], position - idx as f64)
}

/// Sample `n` evenly spaced colors from an interpolator, endpoints included
pub fn quantize(interpolator: fn(f64) -> Rgb, n: usize) -> Vec<Rgb> {
    match n {
        0 => Vec::new(),
        1 => vec![interpolator(0.0)],
        _ => (0..n).map(|i| interpolator(i as f64 / (n - 1) as f64)).collect(),
    }
}

/// Color palette for categorical data
pub struct ColorPalette {
    colors: Vec<Rgb>,
}

impl ColorPalette {
    /// D3 Category10 colors
    pub fn category10() -> Self {
        ColorPalette {
            colors: CATEGORY10.to_vec(),
        }
    }

    /// Get color for a specific index (wraps around if index > palette size)
    pub fn get_color(&self, index: usize) -> Rgb {
        self.colors[index % self.colors.len()]
    }
}

/// How category keys (or values) become colors.
#[derive(Clone)]
pub enum ColorMapping {
    /// One color per key, by position in `categories`
    Ordinal {
        categories: Vec<String>,
        colors: Vec<Rgb>,
    },
    /// A value in `domain` is normalized and fed to `interpolator`
    Continuous {
        domain: (f64, f64),
        interpolator: fn(f64) -> Rgb,
    },
}

impl ColorMapping {
    /// Ordinal mapping for the given category order
    pub fn for_categories(kind: PaletteKind, categories: &[String]) -> Self {
        let colors = match kind {
            PaletteKind::Viridis => quantize(viridis, categories.len()),
            PaletteKind::Category10 => {
                let palette = ColorPalette::category10();
                (0..categories.len()).map(|i| palette.get_color(i)).collect()
            }
        };
        ColorMapping::Ordinal {
            categories: categories.to_vec(),
            colors,
        }
    }

    /// Color of a category; unknown keys fall back to the first color
    pub fn color_for(&self, category: &str) -> Rgb {
        match self {
            ColorMapping::Ordinal { categories, colors } => {
                let idx = categories.iter().position(|c| c == category).unwrap_or(0);
                colors.get(idx).or_else(|| colors.first()).copied().unwrap_or(Rgb::BLACK)
            }
            ColorMapping::Continuous { interpolator, .. } => interpolator(0.0),
        }
    }

    /// Color of a numeric value under a continuous mapping
    pub fn color_for_value(&self, value: f64) -> Rgb {
        match self {
            ColorMapping::Continuous { domain, interpolator } => {
                let span = domain.1 - domain.0;
                let t = if span == 0.0 { 0.0 } else { (value - domain.0) / span };
                interpolator(t)
            }
            ColorMapping::Ordinal { colors, .. } => colors.first().copied().unwrap_or(Rgb::BLACK),
        }
    }
}

impl fmt::Debug for ColorMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMapping::Ordinal { categories, colors } => f
                .debug_struct("Ordinal")
                .field("categories", categories)
                .field("colors", colors)
                .finish(),
            ColorMapping::Continuous { domain, .. } => {
                f.debug_struct("Continuous").field("domain", domain).finish_non_exhaustive()
            }
        }
    }
}
