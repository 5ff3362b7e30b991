use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use atelier::{Context, Layout, Pipeline, Step};

/// Front-end asset pipeline with a live-reloading preview
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// With no subcommand the full pipeline runs: cleaning, every build
    /// task, HTML minification, then watch mode.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fast start: pages, styles and scripts, then watch (no cleaning,
    /// fonts or post-processing)
    App,
    /// Compile the stylesheet bundle
    Styles,
    /// Concatenate and minify the script bundle
    Scripts,
    /// Convert fonts to woff and woff2
    Fonts,
    /// Optimize raster images
    Imgmin,
    /// Assemble the SVG sprite
    Svgsprite,
    /// Build HTML pages from partials
    Pages,
    /// Minify the built HTML
    Htmlmin,
    /// Remove the output tree
    Cleaning,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let layout = Layout::default();
    let pipeline = Pipeline::site()?;

    match Cli::parse().command {
        None => atelier::watch(&pipeline, &Pipeline::full(), layout)?,
        Some(Commands::App) => atelier::watch(&pipeline, &Pipeline::fast(), layout)?,
        Some(Commands::Styles) => run_task(&pipeline, "styles", layout)?,
        Some(Commands::Scripts) => run_task(&pipeline, "scripts", layout)?,
        Some(Commands::Fonts) => run_task(&pipeline, "fonts", layout)?,
        Some(Commands::Imgmin) => run_task(&pipeline, "imgmin", layout)?,
        Some(Commands::Svgsprite) => run_task(&pipeline, "svgsprite", layout)?,
        Some(Commands::Pages) => run_task(&pipeline, "pages", layout)?,
        Some(Commands::Htmlmin) => run_task(&pipeline, "htmlmin", layout)?,
        Some(Commands::Cleaning) => run_task(&pipeline, "cleaning", layout)?,
    }

    Ok(())
}

fn run_task(pipeline: &Pipeline, name: &'static str, layout: Layout) -> Result<()> {
    pipeline.run(&Step::Task(name), &Context::build(layout))?;
    Ok(())
}
