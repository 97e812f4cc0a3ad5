use anyhow::{Context, Result};
use batchart::binner::Resolution;
use batchart::config::{parse_utc_offset, ChartConfig};
use batchart::event::InputFormat;
use batchart::graph::OutputFormat;
use batchart::layout::LayoutMode;
use batchart::palette::PaletteKind;
use batchart::parser;
use batchart::runtime::Runtime;
use batchart::session::ChartSession;
use batchart::source::FileSource;
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "batchart")]
#[command(about = "Render stacked or grouped bar charts of bat detections", long_about = None)]
struct Args {
    #[arg(
        short = 'i',
        long = "input",
        help = "Detection export (JSON or CSV); '-' or omitted reads stdin"
    )]
    input: Option<PathBuf>,

    #[arg(long = "format", help = "Input format: json or csv (defaults to the file extension)")]
    format: Option<String>,

    #[arg(
        short = 'r',
        long = "resolution",
        default_value = "day",
        help = "Bucket size: hour, day or month"
    )]
    resolution: String,

    #[arg(
        short = 'l',
        long = "layout",
        default_value = "stacked",
        help = "Initial layout: stacked or grouped"
    )]
    layout: String,

    #[arg(long = "width", default_value = "800", help = "Output width in pixels")]
    width: u32,

    #[arg(
        long = "palette",
        default_value = "viridis",
        help = "Category colors: viridis or category10"
    )]
    palette: String,

    #[arg(
        long = "utc-offset",
        default_value = "+0000",
        allow_hyphen_values = true,
        help = "Offset used for bucket boundaries and labels, e.g. +0200"
    )]
    utc_offset: String,

    #[arg(
        short = 's',
        long = "script",
        help = "Gesture script, e.g. \"wheel(x: 300, y: 120, k: 2) | layout(grouped)\""
    )]
    script: Option<String>,

    #[arg(
        short = 'o',
        long = "output",
        help = "Output file (.png or .svg); stdout PNG when omitted"
    )]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("batchart=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let resolution: Resolution = args.resolution.parse()?;
    let layout: LayoutMode = args.layout.parse()?;
    let palette: PaletteKind = args.palette.parse()?;
    let utc_offset = parse_utc_offset(&args.utc_offset)?;
    let format: Option<InputFormat> = args.format.as_deref().map(str::parse).transpose()?;

    // Parse the script before touching the data so typos fail fast
    let script = args
        .script
        .as_deref()
        .map(parser::parse)
        .transpose()
        .context("Failed to parse gesture script")?;

    let config = ChartConfig {
        width: args.width,
        utc_offset,
        palette,
        ..ChartConfig::default()
    };

    let input = args.input.filter(|p| p.as_os_str() != "-");
    let mut source = FileSource::new(input, format);
    let session = ChartSession::new(config, layout);
    let mut runtime = Runtime::start(session, &mut source, resolution)?;

    if let Some(script) = &script {
        runtime.run(script)?;
    }

    let output_format = args
        .output
        .as_deref()
        .map(OutputFormat::from_path)
        .unwrap_or(OutputFormat::Png);
    let bytes = runtime.render(output_format).context("Failed to generate chart")?;

    match &args.output {
        Some(path) => {
            fs::write(path, &bytes)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            info!(path = %path.display(), bytes = bytes.len(), "Wrote chart");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(&bytes).context("Failed to write chart to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
