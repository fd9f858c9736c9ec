//! IPTV channel browser - command line front end
//! Lists, filters and inspects channels from one or more playlists

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iptv_browser::fetch::{load_catalog, HttpFetcher};
use iptv_browser::{parse, AppConfig, Catalog, Channel, PlaylistFormat};

#[derive(Parser)]
#[command(name = "iptv_browser")]
#[command(version)]
#[command(about = "Browse IPTV channels from M3U playlists")]
struct Cli {
    /// Read playlists from local files instead of the configured sources
    #[arg(short, long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,

    /// Format of the files given with --file
    #[arg(long, value_enum, default_value = "m3u")]
    format: FormatArg,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    M3u,
    Json,
}

impl From<FormatArg> for PlaylistFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::M3u => PlaylistFormat::M3u,
            FormatArg::Json => PlaylistFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List channels, one page at a time
    Channels {
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// List categories with channel counts
    Categories,
    /// Show everything known about one channel
    Show { name: String },
    /// Show or change the display theme
    Theme { mode: Option<ThemeArg> },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Dark,
    Light,
    Toggle,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("iptv_browser={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = AppConfig::load();

    if let Command::Theme { mode } = cli.command {
        return theme(&mut config, mode);
    }

    let catalog = load(&cli, &config)?;
    match cli.command {
        Command::Channels { category, search, page } => {
            list_channels(catalog, category.as_deref(), search.as_deref(), page)
        }
        Command::Categories => {
            let counts = catalog.category_counts();
            for category in catalog.categories() {
                println!("{:<30} {}", category, counts.get(category).copied().unwrap_or(0));
            }
        }
        Command::Show { name } => {
            let needle = name.to_lowercase();
            let channel = catalog
                .channels()
                .iter()
                .find(|c| c.name.to_lowercase() == needle)
                .with_context(|| format!("No channel named {:?}", name))?;
            show_channel(channel);
        }
        Command::Theme { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn load(cli: &Cli, config: &AppConfig) -> Result<Catalog> {
    if cli.files.is_empty() {
        let mut fetcher = HttpFetcher::from_config(config);
        let load = load_catalog(&mut fetcher, &config.playlists, config.page_size)?;
        for source in &load.failed {
            warn!("Failed to fetch playlist: {}", source.url);
        }
        for warning in &load.warnings {
            warn!("{}", warning);
        }
        info!("Loaded {} channels", load.catalog.len());
        return Ok(load.catalog);
    }

    let format = PlaylistFormat::from(cli.format);
    let mut outcomes = Vec::new();
    for path in &cli.files {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read playlist {}", path.display()))?;
        let outcome = parse(&text, format);
        for warning in &outcome.warnings {
            warn!("{}: {}", path.display(), warning);
        }
        outcomes.push(outcome);
    }

    let mut catalog = Catalog::new(config.page_size);
    catalog.load_outcomes(outcomes);
    info!("Loaded {} channels", catalog.len());
    Ok(catalog)
}

fn list_channels(mut catalog: Catalog, category: Option<&str>, search: Option<&str>, page: usize) {
    if let Some(category) = category {
        catalog.select_category(category);
    }
    if let Some(query) = search {
        catalog.set_query(query);
    }
    catalog.set_page(page);

    let page = catalog.current_page();
    if page.items.is_empty() {
        println!("No channels found");
        return;
    }
    for channel in &page.items {
        println!("{:<40} {:<20} {}", channel.name, channel.category, channel.link);
    }
    println!("-- page {}/{} ({} channels)", page.page, page.total_pages, page.total_items);
}

fn show_channel(channel: &Channel) {
    println!("Name:     {}", channel.name);
    println!("Category: {}", channel.category);
    println!("Link:     {}", channel.link);
    println!("Logo:     {}", channel.logo);
    if let Some(ref language) = channel.language {
        println!("Language: {}", language);
    }
    if let Some(ref id) = channel.id {
        println!("TVG ID:   {}", id);
    }
    let headers = channel.request_headers();
    if !headers.is_empty() {
        println!("Request headers:");
        for (name, value) in &headers {
            println!("  {}: {}", name, value);
        }
    }
}

fn theme(config: &mut AppConfig, mode: Option<ThemeArg>) -> Result<()> {
    let changed = match mode {
        None => false,
        Some(ThemeArg::Dark) => !std::mem::replace(&mut config.dark_mode, true),
        Some(ThemeArg::Light) => std::mem::replace(&mut config.dark_mode, false),
        Some(ThemeArg::Toggle) => {
            config.toggle_dark_mode();
            true
        }
    };
    if changed {
        config.save().context("Failed to save display preference")?;
    }
    println!("{}", if config.dark_mode { "dark" } else { "light" });
    Ok(())
}
