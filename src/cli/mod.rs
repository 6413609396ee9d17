use anyhow::Context;
use chrono::Datelike;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::{
    config::{self, Config},
    domain::playlist::Playlist,
    http::server::HttpServer,
    pipeline::{self, Charts},
    scrape::nova::NovaSource,
    storage::{page_cache::PageCache, playlists::PlaylistStore},
};

#[derive(Parser)]
#[command(name = "nova-playlist")]
#[command(version = "0.1")]
#[command(about = "Monthly and yearly charts of what Radio Nova plays")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the chart of one month (last month by default)
    Month {
        /// Month to process, 1 for January
        #[arg(short, long)]
        month: Option<u32>,
        /// Year of the month, guessed from today when omitted
        #[arg(short, long)]
        year: Option<i32>,
        /// Fetch the days of the month from the radio website
        #[arg(short, long)]
        fetch: bool,
    },
    /// Build the yearly chart from the saved months
    Year {
        /// Defaults to the current year
        #[arg(short, long)]
        year: Option<i32>,
        /// Keep this many tracks instead of the configured amount
        #[arg(short, long)]
        top: Option<usize>,
    },
    /// Build the all time chart from the saved months
    AllTime,
    /// Render html pages for every saved chart
    Render,
    /// Run http server previewing the rendered pages
    Serve,
    /// Show lookup cache statistics
    Cache,
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut cfg = config::Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.to_string_lossy()))?;

    match cli.command {
        Commands::Month { month, year, fetch } => {
            let mut charts = Charts::open(cfg.clone())?;
            let (year, month) = pipeline::resolve_month(month, year, charts.today())?;

            let playlist = if fetch {
                let pages = PageCache::open(&cfg.page_cache)
                    .context("failed to open the page cache")?;
                let source = NovaSource::new(cfg.scrape.clone(), pages);
                charts.month(Some(&source), year, month)?
            } else {
                charts.month(None, year, month)?
            };
            print_top(&playlist, cfg.charts.print_top);
            charts.render()?;
        }

        Commands::Year { year, top } => {
            if let Some(top) = top {
                cfg.charts.yearly_top = top;
            }
            let mut charts = Charts::open(cfg.clone())?;
            let year = year.unwrap_or_else(|| charts.today().year());
            let playlist = charts.year(year)?;
            print_top(&playlist, cfg.charts.print_top);
            charts.render()?;
        }

        Commands::AllTime => {
            let mut charts = Charts::open(cfg.clone())?;
            let playlist = charts.all_time()?;
            print_top(&playlist, cfg.charts.print_top);
            charts.render()?;
        }

        Commands::Render => {
            let mut charts = Charts::open(cfg)?;
            let index = charts.render()?;
            println!("Pages written, index at {}", index.to_string_lossy());
        }

        Commands::Serve => {
            println!("Starting HTTP server...");
            let store = PlaylistStore::new(&cfg.paths.data_dir);
            let http_server = HttpServer::new(&cfg.paths.web_dir, store, cfg.http.clone());

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }

        Commands::Cache => print_cache_stats(&cfg)?,
    }

    Ok(())
}

fn print_top(playlist: &Playlist, n: usize) {
    println!();
    println!("{} ({} tracks, {} plays)", playlist.title(), playlist.len(), playlist.total_plays());
    for (i, track) in playlist.tracks.iter().take(n).enumerate() {
        println!(
            "({}) {} by {}  [{}] - {}",
            i + 1,
            track.title,
            track.artist,
            track.count,
            track.yt_music_url().unwrap_or_default()
        );
    }
}

fn print_cache_stats(cfg: &Config) -> anyhow::Result<()> {
    let charts = Charts::open(cfg.clone())?;
    let cache = charts.cache();
    println!(
        "Lookup cache {}",
        cache
            .path()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| "(in memory)".to_string())
    );
    println!("  queries: {}", cache.len());
    println!("  without a track match: {}", cache.misses());

    let pages = PageCache::open(&cfg.page_cache).context("failed to open the page cache")?;
    println!("Page cache: {} pages", pages.len()?);

    let store = charts.store();
    let playlists = store.load_all()?;
    println!(
        "Saved charts in {}: {}",
        store.root().to_string_lossy(),
        playlists.len()
    );
    for playlist in &playlists {
        println!("  - {} ({} tracks)", playlist.title(), playlist.len());
    }
    Ok(())
}
