use crate::chart::{Frame, Tooltip};
use crate::config::{ChartConfig, PlotArea};
use crate::ir::{DrawCommand, SceneGraph, TextAnchor};
use crate::layout::BarRect;
use crate::palette::{ColorMapping, Rgb};

const GRID_COLOR: Rgb = Rgb(0x99, 0x99, 0x99);
const GRID_OPACITY: f64 = 0.3;
const AXIS_COLOR: Rgb = Rgb::BLACK;
const TICK_SIZE: f64 = 6.0;
const LABEL_SIZE: f64 = 10.0;
const TITLE_SIZE: f64 = 12.0;
const SWATCH_SIZE: f64 = 10.0;
/// Opacity of bars belonging to the hovered category
const HIGHLIGHT_OPACITY: f64 = 0.4;

/// Compile the current frame into a SceneGraph of drawing commands.
///
/// Chart coordinates are shifted down by the legend strip; bars are clipped
/// to the plot area so zoomed-in bars never spill over the axes.
pub fn compile_scene(
    config: &ChartConfig,
    colors: &ColorMapping,
    categories: &[String],
    frame: &Frame,
    tooltip: Option<&Tooltip>,
) -> SceneGraph {
    let mut commands = Vec::new();
    let offset = config.legend_height as f64;
    let plot = config.plot_area();

    compile_legend(&mut commands, config, colors, categories);
    compile_grid(&mut commands, &plot, frame, offset);

    let highlight = tooltip.map(|t| t.category.as_str());
    for bar in &frame.visible {
        if let Some(cmd) = compile_bar(bar, &plot, offset, colors, highlight) {
            commands.push(cmd);
        }
    }

    compile_axes(&mut commands, &plot, frame, offset);

    if let Some(tooltip) = tooltip {
        compile_tooltip(&mut commands, tooltip, offset);
    }

    SceneGraph {
        width: config.width,
        height: config.height + config.legend_height,
        background: Rgb::WHITE,
        commands,
    }
}

fn compile_legend(
    commands: &mut Vec<DrawCommand>,
    config: &ChartConfig,
    colors: &ColorMapping,
    categories: &[String],
) {
    let left = config.margin.left;
    commands.push(DrawCommand::Text {
        text: config.legend_title.clone(),
        pos: (left, 12.0),
        size: TITLE_SIZE,
        color: AXIS_COLOR,
        anchor: TextAnchor::Start,
    });

    let row_y = 31.0;
    let mut cursor = left;
    for category in categories {
        commands.push(DrawCommand::Rect {
            tl: (cursor, row_y - SWATCH_SIZE / 2.0),
            br: (cursor + SWATCH_SIZE, row_y + SWATCH_SIZE / 2.0),
            fill: colors.color_for(category),
            opacity: 1.0,
        });
        commands.push(DrawCommand::Text {
            text: category.clone(),
            pos: (cursor + SWATCH_SIZE + 4.0, row_y),
            size: LABEL_SIZE,
            color: AXIS_COLOR,
            anchor: TextAnchor::Start,
        });
        // Rough advance: average glyph width at the label size
        cursor += SWATCH_SIZE + 4.0 + category.chars().count() as f64 * LABEL_SIZE * 0.6 + 16.0;
    }
}

fn compile_grid(commands: &mut Vec<DrawCommand>, plot: &PlotArea, frame: &Frame, offset: f64) {
    for tick in &frame.y_ticks {
        let y = frame.y_scale.apply(tick.value);
        if y >= plot.top && y <= plot.bottom {
            commands.push(DrawCommand::Line {
                points: vec![(plot.left, y + offset), (plot.right, y + offset)],
                color: GRID_COLOR,
                opacity: GRID_OPACITY,
            });
        }
    }
    for tick in &frame.x_ticks {
        let x = frame.x_scale.apply(tick.value);
        if x >= plot.left && x <= plot.right {
            commands.push(DrawCommand::Line {
                points: vec![(x, plot.top + offset), (x, plot.bottom + offset)],
                color: GRID_COLOR,
                opacity: GRID_OPACITY,
            });
        }
    }
}

fn compile_bar(
    bar: &BarRect,
    plot: &PlotArea,
    offset: f64,
    colors: &ColorMapping,
    highlight: Option<&str>,
) -> Option<DrawCommand> {
    let left = bar.x.max(plot.left);
    let right = (bar.x + bar.width).min(plot.right);
    let top = bar.y.max(plot.top);
    let bottom = (bar.y + bar.height).min(plot.bottom);
    if right <= left || bottom <= top {
        return None;
    }

    let opacity = if highlight == Some(bar.category.as_str()) {
        HIGHLIGHT_OPACITY
    } else {
        1.0
    };
    Some(DrawCommand::Rect {
        tl: (left, top + offset),
        br: (right, bottom + offset),
        fill: colors.color_for(&bar.category),
        opacity,
    })
}

fn compile_axes(commands: &mut Vec<DrawCommand>, plot: &PlotArea, frame: &Frame, offset: f64) {
    let bottom = plot.bottom + offset;
    let top = plot.top + offset;

    // X axis along the plot bottom
    commands.push(DrawCommand::Line {
        points: vec![(plot.left, bottom), (plot.right, bottom)],
        color: AXIS_COLOR,
        opacity: 1.0,
    });
    for tick in &frame.x_ticks {
        let x = frame.x_scale.apply(tick.value);
        if x < plot.left || x > plot.right {
            continue;
        }
        commands.push(DrawCommand::Line {
            points: vec![(x, bottom), (x, bottom + TICK_SIZE)],
            color: AXIS_COLOR,
            opacity: 1.0,
        });
        commands.push(DrawCommand::Text {
            text: tick.label.clone(),
            pos: (x, bottom + TICK_SIZE + LABEL_SIZE / 2.0 + 1.0),
            size: LABEL_SIZE,
            color: AXIS_COLOR,
            anchor: TextAnchor::Middle,
        });
    }

    // Y axis along the plot left edge
    commands.push(DrawCommand::Line {
        points: vec![(plot.left, top), (plot.left, bottom)],
        color: AXIS_COLOR,
        opacity: 1.0,
    });
    for tick in &frame.y_ticks {
        let y = frame.y_scale.apply(tick.value);
        if y < plot.top || y > plot.bottom {
            continue;
        }
        commands.push(DrawCommand::Line {
            points: vec![(plot.left - TICK_SIZE, y + offset), (plot.left, y + offset)],
            color: AXIS_COLOR,
            opacity: 1.0,
        });
        commands.push(DrawCommand::Text {
            text: tick.label.clone(),
            pos: (plot.left - TICK_SIZE - 3.0, y + offset),
            size: LABEL_SIZE,
            color: AXIS_COLOR,
            anchor: TextAnchor::End,
        });
    }
}

fn compile_tooltip(commands: &mut Vec<DrawCommand>, tooltip: &Tooltip, offset: f64) {
    let width = tooltip.text.chars().count() as f64 * LABEL_SIZE * 0.6 + 8.0;
    let height = LABEL_SIZE + 8.0;
    let y = tooltip.y + offset;
    commands.push(DrawCommand::Rect {
        tl: (tooltip.x, y - height / 2.0),
        br: (tooltip.x + width, y + height / 2.0),
        fill: Rgb::WHITE,
        opacity: 0.9,
    });
    commands.push(DrawCommand::Text {
        text: tooltip.text.clone(),
        pos: (tooltip.x + 4.0, y),
        size: LABEL_SIZE,
        color: AXIS_COLOR,
        anchor: TextAnchor::Start,
    });
}
