use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use sitecanvas::model::Canvas;
use sitecanvas::validate::validate_subdomain;
use sitecanvas::{flatten, RenderMode, Renderer, ServerConfig};

#[derive(Parser)]
#[command(name = "sitecanvas")]
#[command(about = "Canvas renderer and page server for the website builder", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the page API and published websites
    Serve(ServeArgs),
    /// Render a canvas JSON file
    Render(RenderArgs),
    /// Print the flat render feed for a canvas JSON file
    Flatten {
        canvas: PathBuf,
    },
    /// Check whether a subdomain is acceptable
    CheckSubdomain {
        name: String,
    },
}

#[derive(clap::Args)]
struct ServeArgs {
    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    bind: Option<String>,
    #[arg(long)]
    workers: Option<usize>,
    /// Snapshot file for pages and websites
    #[arg(long)]
    data_file: Option<PathBuf>,
    #[arg(long)]
    root_domain: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    DisplayList,
    Flat,
}

#[derive(clap::Args)]
struct RenderArgs {
    canvas: PathBuf,
    #[arg(long, default_value = "preview")]
    mode: RenderMode,
    #[arg(long, value_enum, default_value = "html")]
    format: Format,
    /// Render the interactive phase instead of the skeleton
    #[arg(long)]
    hydrate: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args),
        Commands::Render(args) => render(args),
        Commands::Flatten { canvas } => {
            let canvas = read_canvas(&canvas)?;
            println!("{}", serde_json::to_string_pretty(&flatten(&canvas))?);
            Ok(())
        }
        Commands::CheckSubdomain { name } => {
            validate_subdomain(&name)?;
            println!("{} is a valid subdomain", name);
            Ok(())
        }
    }
}

fn read_canvas(path: &Path) -> Result<Canvas> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let canvas: Canvas = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    for issue in canvas.validate() {
        log::warn!("{}: {}", path.display(), issue);
    }
    Ok(canvas)
}

fn render(args: RenderArgs) -> Result<()> {
    let canvas = read_canvas(&args.canvas)?;
    let mut renderer = Renderer::new(args.mode);
    if args.hydrate {
        renderer = renderer.hydrate();
    }
    let out = renderer.render_canvas(&canvas);
    match args.format {
        Format::Html => println!("{}", out.html),
        Format::DisplayList => println!("{}", serde_json::to_string_pretty(&out.display_list)?),
        Format::Flat => println!("{}", serde_json::to_string_pretty(&flatten(&canvas))?),
    }
    Ok(())
}

fn serve(args: ServeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    if args.data_file.is_some() {
        config.data_file = args.data_file;
    }
    if args.root_domain.is_some() {
        config.root_domain = args.root_domain;
    }
    config.validate()?;

    let store = Arc::new(config.open_store()?);
    let server = sitecanvas::Server::bind(&config, Arc::clone(&store))?;
    let stop = server.shutdown_handle();
    ctrlc::set_handler(move || {
        log::info!("interrupt received, shutting down");
        stop.trigger();
    })
    .context("installing the interrupt handler")?;

    println!("sitecanvas listening on {}", server.url());
    server.wait();
    store.teardown()?;
    Ok(())
}
