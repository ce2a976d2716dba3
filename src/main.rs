use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use storefront_catalog::archiver;
use storefront_catalog::fetcher::HttpFetcher;
use storefront_catalog::models::{CatalogSummary, SourceContext};
use storefront_catalog::parser::SpringTiles;
use storefront_catalog::pipeline;
use storefront_catalog::report;

const SPRING_PAGES: &[&str] = &[
    "/",
    "/apparel",
    "/unisex-men-s-t-shirts",
    "/hoodies-sweatshirts",
    "/tank-tops",
    "/long-sleeve-tees",
    "/women-s-athletic",
];

#[derive(Parser)]
#[command(name = "storefront_catalog", about = "Scrape storefront product catalogs into JSON")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a creator-marketplace (Spring) store from its listing pages
    Spring {
        #[command(flatten)]
        store: StoreArgs,
        /// Store-relative listing pages, scraped in order
        #[arg(short, long = "page")]
        pages: Vec<String>,
        /// Pause between page requests, in milliseconds
        #[arg(long, env = "STOREFRONT_DELAY_MS", default_value = "1000")]
        delay_ms: u64,
    },
    /// Scrape a Shopify store via products.json, falling back to /collections/all
    Shopify {
        #[command(flatten)]
        store: StoreArgs,
        /// Pause between page requests, in milliseconds
        #[arg(long, env = "STOREFRONT_DELAY_MS", default_value = "500")]
        delay_ms: u64,
        /// Upper bound on products.json pages
        #[arg(long, env = "STOREFRONT_MAX_PAGES", default_value = "40")]
        max_pages: usize,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// Store root, e.g. https://example.creator-spring.com
    #[arg(long, env = "STOREFRONT_BASE_URL")]
    base_url: String,
    /// Collection name used in generated descriptions
    #[arg(long, env = "STOREFRONT_COLLECTION")]
    collection: String,
    /// First word of generated descriptions
    #[arg(long, env = "STOREFRONT_PREFIX", default_value = "Official")]
    prefix: String,
    /// Catalog output file
    #[arg(short, long, env = "STOREFRONT_OUTPUT", default_value = "products.json")]
    output: PathBuf,
    /// Category summary output file
    #[arg(long, env = "STOREFRONT_SUMMARY")]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let (store, products) = match cli.command {
        Commands::Spring {
            store,
            pages,
            delay_ms,
        } => {
            let ctx = SourceContext::new(&store.base_url, &store.collection, &store.prefix)
                .with_context(|| format!("Invalid store URL {}", store.base_url))?;
            let pages = if pages.is_empty() {
                SPRING_PAGES.iter().map(|p| p.to_string()).collect()
            } else {
                pages
            };
            info!(store = ctx.base_url(), pages = pages.len(), "Scraping Spring store");
            let fetcher = HttpFetcher::new(Duration::from_millis(delay_ms))?;
            let products = pipeline::scrape_pages(&fetcher, &SpringTiles, &ctx, &pages)?;
            (store, products)
        }
        Commands::Shopify {
            store,
            delay_ms,
            max_pages,
        } => {
            let ctx = SourceContext::new(&store.base_url, &store.collection, &store.prefix)
                .with_context(|| format!("Invalid store URL {}", store.base_url))?;
            info!(store = ctx.base_url(), "Scraping Shopify store");
            let fetcher = HttpFetcher::new(Duration::from_millis(delay_ms))?;
            let products = pipeline::scrape_shopify(&fetcher, &ctx, max_pages)?;
            (store, products)
        }
    };

    report::print_catalog(&products);

    archiver::save_catalog(&products, &store.output)?;
    println!("\nProduct catalog saved to: {}", store.output.display());

    if let Some(summary_path) = &store.summary {
        let summary = CatalogSummary::from_catalog(&store.base_url, &products);
        archiver::save_summary(&summary, summary_path)?;
        println!("Summary saved to: {}", summary_path.display());
    }

    Ok(())
}
