use crate::ir::{DrawCommand, SceneGraph, TextAnchor};
use crate::palette::Rgb;
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::warn;

/// Output encoding of a rendered scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    /// `.svg` paths render as SVG, everything else as PNG
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => OutputFormat::Svg,
            _ => OutputFormat::Png,
        }
    }
}

pub fn render(scene: &SceneGraph, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Png => render_png(scene),
        OutputFormat::Svg => render_svg(scene).map(String::into_bytes),
    }
}

pub fn render_png(scene: &SceneGraph) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; (scene.width * scene.height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (scene.width, scene.height))
            .into_drawing_area();
        draw_scene(&root, scene)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, scene.width, scene.height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

pub fn render_svg(scene: &SceneGraph) -> Result<String> {
    let mut svg = String::new();
    {
        let root =
            SVGBackend::with_string(&mut svg, (scene.width, scene.height)).into_drawing_area();
        draw_scene(&root, scene)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(svg)
}

/// Execute every command of the scene on a drawing area
pub fn draw_scene<DB>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&color(scene.background)).context("Failed to fill background")?;

    // Text needs a system font; a missing one costs the labels, not the chart
    let mut text_failed = false;

    for command in &scene.commands {
        match command {
            DrawCommand::Rect { tl, br, fill, opacity } => {
                let style = color(*fill).mix(*opacity).filled();
                root.draw(&Rectangle::new([px(*tl), px(*br)], style))
                    .context("Failed to draw rectangle")?;
            }
            DrawCommand::Line { points, color: c, opacity } => {
                let path: Vec<(i32, i32)> = points.iter().copied().map(px).collect();
                root.draw(&PathElement::new(path, color(*c).mix(*opacity)))
                    .context("Failed to draw line")?;
            }
            DrawCommand::Text { text, pos, size, color: c, anchor } => {
                let h = match anchor {
                    TextAnchor::Start => HPos::Left,
                    TextAnchor::Middle => HPos::Center,
                    TextAnchor::End => HPos::Right,
                };
                let style = ("sans-serif", *size)
                    .into_font()
                    .color(&color(*c))
                    .pos(Pos::new(h, VPos::Center));
                if let Err(e) = root.draw(&Text::new(text.as_str(), px(*pos), style)) {
                    if !text_failed {
                        warn!(error = %e, "Text rendering unavailable, labels skipped");
                        text_failed = true;
                    }
                }
            }
        }
    }

    Ok(())
}

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn px((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}
