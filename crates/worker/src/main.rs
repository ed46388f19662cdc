use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pricewatch_core::dashboard::state::DashboardState;
use pricewatch_core::domain::asin::Asin;
use pricewatch_core::storage::memory::MemoryProductStore;
use pricewatch_core::storage::products::PgProductStore;
use pricewatch_core::storage::ProductStore;
use pricewatch_core::tracker::PriceTracker;

mod render;

#[derive(Debug, Parser)]
#[command(name = "pricewatch_worker")]
struct Args {
    /// Use an in-memory store instead of the database. Nothing is persisted.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search the marketplace and record up to SCRAPE_LIMIT results.
    Scrape { term: String },

    /// Record the current price of one product (ASIN or Amazon URL).
    Track { asin: String },

    /// Print the tracked products as dashboard cards.
    List {
        /// Case-insensitive filter on title, ASIN or price.
        #[arg(long)]
        search: Option<String>,

        /// Show the price history of this ASIN.
        #[arg(long)]
        chart: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = pricewatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let store: Arc<dyn ProductStore> = if args.dry_run {
        tracing::info!(dry_run = true, "using in-memory store");
        Arc::new(MemoryProductStore::new())
    } else {
        let db_url = settings.require_database_url()?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
            .context("connect DATABASE_URL failed")?;
        pricewatch_core::storage::migrate(&pool).await?;
        Arc::new(PgProductStore::new(pool))
    };

    let fetcher = pricewatch_core::ingest::fetcher_from_settings(&settings)?;
    let tracker = PriceTracker::new(fetcher, store, settings.scrape_limit);

    if let Err(err) = run(&tracker, args.command).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "worker command failed");
        return Err(err);
    }
    Ok(())
}

async fn run(tracker: &PriceTracker, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Scrape { term } => {
            let products = tracker.scrape_search(&term).await?;
            println!("Recorded {} product(s) for {term:?}", products.len());
            for p in &products {
                println!("{}", render::summary_line(p));
            }
        }
        Command::Track { asin } => {
            let product = tracker.scrape_asin(&asin).await?;
            println!("{}", render::summary_line(&product));
        }
        Command::List { search, chart } => {
            let mut state = DashboardState::new();
            state.apply_listing(tracker.list_products().await?);
            if let Some(term) = search {
                state.set_search(term);
            }
            if let Some(asin) = chart {
                state.toggle_chart(&Asin::from_input(&asin)?);
            }
            print!("{}", render::dashboard(&state.view()));
        }
    }
    Ok(())
}

fn init_sentry(settings: &pricewatch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
