mod render;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use hanabi_api::anilist::AniListClient;
use hanabi_api::resolver::{NoopResolver, ResolverClient};
use hanabi_api::traits::{PlaybackCandidate, PlaybackResolver};
use hanabi_api::ApiError;
use hanabi_core::config::{AppConfig, EnrichmentConfig};
use hanabi_core::store::{self, StoreEvent};
use hanabi_core::views;
use hanabi_core::{Catalog, CatalogSettings, FetchOutcome, Selection, ViewStore};
use tokio::sync::broadcast;

const DEFAULT_LOG_FILTER: &str = "hanabi=info,hanabi_core=info,hanabi_api=info";
const VERBOSE_LOG_FILTER: &str = "hanabi=debug,hanabi_core=debug,hanabi_api=debug";

#[derive(Parser, Debug)]
#[command(name = "hanabi", version)]
#[command(about = "Browse trending anime and resolve playable sources", long_about = None)]
struct Cli {
    /// Log request and state transitions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Featured, trending and popular titles
    Home,
    /// Currently trending anime
    Trending {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// All-time popular anime
    Popular {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Search by title
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Details and playback source for one anime
    Show { id: String },
    /// Trending anime in one genre ("All" for everything)
    Genre { name: String },
    /// Print the effective configuration
    Config,
}

/// Resolver selected by `[enrichment]` config.
enum Enrichment {
    Http(ResolverClient),
    Disabled(NoopResolver),
}

impl Enrichment {
    fn from_config(config: &EnrichmentConfig) -> Self {
        if !config.enabled {
            return Self::Disabled(NoopResolver);
        }
        match ResolverClient::new(&config.api_url, config.timeout()) {
            Ok(client) => Self::Http(client.with_match_threshold(config.match_threshold)),
            Err(e) => {
                tracing::warn!(url = %config.api_url, error = %e, "Playback resolver disabled");
                Self::Disabled(NoopResolver)
            }
        }
    }
}

impl PlaybackResolver for Enrichment {
    async fn resolve(&self, title_hint: &str) -> Result<PlaybackCandidate, ApiError> {
        match self {
            Self::Http(client) => client.resolve(title_hint).await,
            Self::Disabled(noop) => noop.resolve(title_hint).await,
        }
    }
}

type AppCatalog = Catalog<AniListClient, Enrichment>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("hanabi: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Command::Config = cli.command {
        return match toml::to_string_pretty(&config) {
            Ok(text) => {
                println!("# {}", AppConfig::config_path().display());
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("hanabi: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let store = Arc::new(ViewStore::new());
    if cli.verbose {
        tokio::spawn(log_events(store.subscribe()));
    }

    let catalog = Catalog::new(
        AniListClient::with_api_url(config.metadata.api_url.clone()),
        Enrichment::from_config(&config.enrichment),
        store,
        CatalogSettings::from(&config),
    );

    if run(&catalog, cli.command).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Execute one command. Returns `false` if anything it displays failed.
async fn run(catalog: &AppCatalog, command: Command) -> bool {
    let store = catalog.store();
    match command {
        Command::Home => {
            let (trending, popular) = catalog.load_home().await;
            let popular_state = store.state::<store::Popular>();
            render::featured(&views::featured(&popular_state.data));
            render::list("Trending Now", &store.state::<store::Trending>());
            render::list("Most Popular", &popular_state);
            succeeded(trending) && succeeded(popular)
        }
        Command::Trending { page } => {
            let outcome = catalog.refresh_trending(page).await;
            render::list("Trending Now", &store.state::<store::Trending>());
            succeeded(outcome)
        }
        Command::Popular { page } => {
            let outcome = catalog.refresh_popular(page).await;
            render::list("Most Popular", &store.state::<store::Popular>());
            succeeded(outcome)
        }
        Command::Search { query } => {
            let query = query.join(" ");
            let outcome = catalog.search_now(&query).await;
            render::list(
                &format!("Results for \"{}\"", query.trim()),
                &store.state::<store::Search>(),
            );
            succeeded(outcome)
        }
        Command::Show { id } => {
            let (selection, _) = futures::join!(catalog.select_detail(&id), catalog.ensure_trending());
            if let Selection::Loaded {
                enrichment: Some(task),
            } = selection
            {
                if let Err(e) = task.await {
                    tracing::warn!(error = %e, "Playback lookup task ended abnormally");
                }
            }

            let snapshot = store.snapshot();
            let ok = render::detail(&snapshot.detail, snapshot.source.as_ref());
            if let Some(anime) = snapshot.detail.data.as_ref() {
                render::related(&views::related(&snapshot.trending.data, anime.id()));
            }
            ok
        }
        Command::Genre { name } => {
            let Some(genre) = views::known_genre(&name) else {
                eprintln!("Unknown genre {name:?}. Available: {}", views::GENRES.join(", "));
                return false;
            };
            let outcome = catalog.ensure_trending().await;
            let state = store.state::<store::Trending>();
            render::genre(genre, &state, &views::filter_by_genre(&state.data, genre));
            succeeded(outcome)
        }
        Command::Config => true,
    }
}

fn succeeded(outcome: FetchOutcome) -> bool {
    outcome != FetchOutcome::Failed
}

async fn log_events(mut events: broadcast::Receiver<StoreEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => tracing::debug!(?event, "Store updated"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Store event log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
