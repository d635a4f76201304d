use clap::Parser;
use mserv_cache::{KeyValueStore, MemoryStore, SqliteStore};
use mserv_core::providers::source_from_config;
use mserv_core::{theme, Config, Dashboard};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mserv")]
#[command(version, about = "Dashboard for self-hosted services", long_about = None)]
struct Cli {
    /// Config file (defaults to <config_dir>/mserv/config.toml)
    #[arg(long, global = true, env = "MSERV_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog URL or local JSON file
    #[arg(long, global = true, env = "MSERV_CATALOG")]
    catalog: Option<String>,

    /// Storage database path
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Open the interactive dashboard (default)
    Tui,
    /// Print every service, grouped by category
    List,
    /// Filter services the same way the dashboard search does
    Search {
        /// Search query
        query: String,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(clap::Subcommand)]
enum FavoritesAction {
    /// Show favorites in order
    List,
    /// Add a service id to favorites
    Add { id: String },
    /// Remove a service id from favorites
    Remove { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Tui));

    // The TUI owns the screen, so its logs go to a file
    let writer = if interactive {
        log_file_writer().unwrap_or_else(|| BoxMakeWriter::new(std::io::sink))
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    // Initialize logging - helps when things go sideways
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mserv=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(!interactive),
        )
        .init();

    mserv_core::dashboard::log_startup();

    let config = load_config(&cli)?;
    let storage = open_storage(&config);
    let source = source_from_config(&config.catalog)?;

    let mut dashboard = Dashboard::new(
        storage,
        config,
        mserv_tui::terminal_width(),
        theme::system_appearance(),
    );

    match cli.command {
        None | Some(Commands::Tui) => {
            let app = mserv_tui::App::new(dashboard);
            mserv_tui::run_tui(app, source.as_ref()).await?;
        }
        Some(Commands::List) => {
            dashboard.load(source.as_ref()).await?;
            print_groups(&dashboard);
        }
        Some(Commands::Search { query }) => {
            tracing::info!("Searching for: {}", query);
            dashboard.load(source.as_ref()).await?;
            print_search(&mut dashboard, &query);
        }
        Some(Commands::Favorites { action }) => match action {
            FavoritesAction::List => {
                // Names are a bonus, ids alone are fine when the catalog is down
                if let Err(e) = dashboard.load(source.as_ref()).await {
                    tracing::warn!("Catalog unavailable, showing ids only: {}", e);
                }
                print_favorites(&dashboard);
            }
            FavoritesAction::Add { id } => {
                dashboard.add_favorite(&id)?;
                println!("★ {} ajouté aux favoris", id);
            }
            FavoritesAction::Remove { id } => {
                dashboard.remove_favorite(&id)?;
                println!("{} retiré des favoris", id);
            }
        },
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(catalog) = &cli.catalog {
        if catalog.contains("://") {
            config.catalog.url = catalog.clone();
            config.catalog.path = None;
        } else {
            config.catalog.path = Some(PathBuf::from(catalog));
        }
    }
    if let Some(storage) = &cli.storage {
        config.storage.path = Some(storage.clone());
    }

    Ok(config)
}

/// Persistent storage, or an in-memory one when the database can't be opened
fn open_storage(config: &Config) -> Rc<dyn KeyValueStore> {
    let opened = config
        .storage
        .resolved_path()
        .map_err(anyhow::Error::from)
        .and_then(|path| SqliteStore::new(&path).map_err(anyhow::Error::from));

    match opened {
        Ok(store) => Rc::new(store),
        Err(e) => {
            tracing::warn!("Storage unavailable, preferences won't persist: {}", e);
            Rc::new(MemoryStore::new())
        }
    }
}

fn log_file_writer() -> Option<BoxMakeWriter> {
    let dir = Config::data_dir().ok()?;
    std::fs::create_dir_all(&dir).ok()?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("mserv.log"))
        .ok()?;
    Some(BoxMakeWriter::new(Mutex::new(file)))
}

fn print_groups(dashboard: &Dashboard) {
    for group in &dashboard.view().groups {
        println!("{} ({})", group.name, group.services.len());
        for card in &group.services {
            let star = if card.favorite { "★" } else { " " };
            println!("  {} {:<20} {:<40} {}", star, card.name, card.description, card.href);
        }
        println!();
    }
}

fn print_search(dashboard: &mut Dashboard, query: &str) {
    let min_len = dashboard.config().search.min_query_len;
    let visibility = dashboard.search_now(query).clone();

    if !visibility.is_filtered() {
        println!(
            "Requête trop courte (minimum {} caractères), tous les services sont affichés",
            min_len
        );
    }

    for card in dashboard
        .view()
        .grid
        .iter()
        .filter(|c| visibility.is_service_visible(&c.id))
    {
        let star = if card.favorite { "★" } else { " " };
        println!("{} {:<20} {:<40} {}", star, card.name, card.description, card.href);
    }

    if let Some(indicator) = visibility.indicator() {
        println!("\n{}", indicator);
    }
}

fn print_favorites(dashboard: &Dashboard) {
    for id in dashboard.favorites() {
        match dashboard.catalog().service(id) {
            Some(service) => println!("★ {:<16} {}", id, service.name),
            None => println!("★ {}", id),
        }
    }
}
