use crate::palette::Rgb;

// =============================================================================
// Scene graph: what the renderer executes
// =============================================================================

/// A list of primitive drawing commands in surface pixels.
/// The backend just executes these blindly, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub commands: Vec<DrawCommand>,
}

/// Horizontal alignment of a text command relative to its position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        // Top-Left, Bottom-Right
        tl: (f64, f64),
        br: (f64, f64),
        fill: Rgb,
        opacity: f64,
    },
    Line {
        points: Vec<(f64, f64)>,
        color: Rgb,
        opacity: f64,
    },
    Text {
        text: String,
        /// Anchor point; the text is vertically centred on it
        pos: (f64, f64),
        size: f64,
        color: Rgb,
        anchor: TextAnchor,
    },
}

impl SceneGraph {
    pub fn rects(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| matches!(c, DrawCommand::Rect { .. }))
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}
