//! Command-line front end: render a scene script to PNG

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use scanline_raster::scene::render_file;
use scanline_raster::settings::{load_settings, Settings};
use scanline_raster::VERSION;

#[derive(Parser, Debug)]
#[command(name = "scanline-raster", version, about = "Rasterize a scene script into a PNG image")]
struct Cli {
    /// Scene script to render
    script: PathBuf,

    /// RON settings file (background color, initial flags)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write images here instead of the files named by `png` (later ones get -2, -3, ...)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Start with sRGB encoding enabled
    #[arg(long)]
    srgb: bool,

    /// Start with depth testing enabled
    #[arg(long)]
    depth: bool,

    /// Start with perspective-correct interpolation enabled
    #[arg(long)]
    hyp: bool,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = match &cli.config {
        Some(path) => load_settings(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    settings.srgb |= cli.srgb;
    settings.depth |= cli.depth;
    settings.perspective |= cli.hyp;

    let saved = render_file(&cli.script, settings, cli.output)
        .with_context(|| format!("rendering {}", cli.script.display()))?;
    if saved.is_empty() {
        info!("script contained no `png` command, nothing written");
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("scanline-raster v{}", VERSION);

    if let Err(e) = run(Cli::parse()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
