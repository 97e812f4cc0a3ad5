// Chart configuration: surface size, margins and animation timing

use crate::error::ChartError;
use crate::palette::PaletteKind;
use chrono::{FixedOffset, Offset, Utc};
use std::time::Duration;

/// Pixel margins around the plot area, measured inside the chart surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Margin {
            top: 10.0,
            right: 10.0,
            bottom: 20.0,
            left: 40.0,
        }
    }
}

/// Timing of the stacked/grouped transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionTiming {
    /// Duration of the first phase
    pub phase_one: Duration,
    /// Duration of the chained second phase
    pub phase_two: Duration,
    /// Extra start delay per category stacking index
    pub stagger: Duration,
}

impl Default for TransitionTiming {
    fn default() -> Self {
        TransitionTiming {
            phase_one: Duration::from_millis(500),
            phase_two: Duration::from_millis(250),
            stagger: Duration::from_millis(20),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Width of the whole surface in pixels
    pub width: u32,
    /// Height of the chart region (legend excluded)
    pub height: u32,
    /// Height of the legend strip drawn above the chart
    pub legend_height: u32,
    pub margin: Margin,
    /// Fraction of each band left empty between neighbouring buckets
    pub band_padding: f64,
    /// Headroom multiplier on the value axis maximum
    pub value_headroom: f64,
    pub transition: TransitionTiming,
    /// Offset in which bucket boundaries and tick labels are computed
    pub utc_offset: FixedOffset,
    pub palette: PaletteKind,
    pub legend_title: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            width: 800,
            height: 300,
            legend_height: 50,
            margin: Margin::default(),
            band_padding: 0.1,
            value_headroom: 1.1,
            transition: TransitionTiming::default(),
            utc_offset: Utc.fix(),
            palette: PaletteKind::Viridis,
            legend_title: "Bat species".to_string(),
        }
    }
}

impl ChartConfig {
    /// Plot rectangle in chart coordinates (legend strip excluded)
    pub fn plot_area(&self) -> PlotArea {
        PlotArea {
            left: self.margin.left,
            right: self.width as f64 - self.margin.right,
            top: self.margin.top,
            bottom: self.height as f64 - self.margin.bottom,
        }
    }
}

/// The rectangle bars are drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl PlotArea {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// Parse an offset written as `+HHMM`, `-HHMM`, `+HH:MM` or `Z`
pub fn parse_utc_offset(input: &str) -> Result<FixedOffset, ChartError> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }
    trimmed
        .parse::<FixedOffset>()
        .map_err(|_| ChartError::InvalidOffset(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plot_area() {
        let config = ChartConfig::default();
        let plot = config.plot_area();
        assert_eq!(plot.left, 40.0);
        assert_eq!(plot.right, 790.0);
        assert_eq!(plot.top, 10.0);
        assert_eq!(plot.bottom, 280.0);
        assert_eq!(plot.width(), 750.0);
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+0200").unwrap().local_minus_utc(), 7200);
        assert_eq!(parse_utc_offset("-05:30").unwrap().local_minus_utc(), -19800);
        assert_eq!(parse_utc_offset(" +01:00 ").unwrap().local_minus_utc(), 3600);
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_utc_offset_invalid() {
        assert!(parse_utc_offset("0200").is_err());
        assert!(parse_utc_offset("+2").is_err());
        assert!(parse_utc_offset("+0290").is_err());
        assert!(parse_utc_offset("east").is_err());
    }
}
