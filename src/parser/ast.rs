// Abstract Syntax Tree for the gesture script

use crate::binner::Resolution;
use crate::layout::LayoutMode;

/// A named argument value: `k: 2`, `shift: true`
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Number(f64),
    Bool(bool),
}

/// One scripted interaction step, in chart pixel coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Re-fetch and rebuild at another resolution
    Resolution(Resolution),
    /// Toggle between stacked and grouped bars
    Layout(LayoutMode),
    /// Wheel or pinch by factor `k` around the pointer
    Wheel { x: f64, y: f64, k: f64, shift: bool },
    /// Press at (x, y) and move by (dx, dy)
    Drag { x: f64, y: f64, dx: f64, dy: f64 },
    Hover { x: f64, y: f64 },
    /// Let animation time pass
    Wait { ms: u64 },
    /// Back to the unzoomed view
    Reset,
}

/// Complete gesture script
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub commands: Vec<Command>,
}
