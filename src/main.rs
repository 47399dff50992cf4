use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use assessment_finder::crawlers::build_reqwest_client;
use assessment_finder::crawlers::catalog::ShlCatalogCrawler;
use assessment_finder::models::config::AppConfig;
use assessment_finder::processing::combine::process_combine;
use assessment_finder::processing::crawler::process_crawl;
use assessment_finder::processing::embedding::{Embedder, FastEmbedder, parse_model};
use assessment_finder::processing::ingest::process_ingest;
use assessment_finder::processing::query::{HttpTextFetcher, QueryService};
use assessment_finder::repository::catalog::CsvCatalogRepository;
use assessment_finder::repository::index::UsearchIndex;
use assessment_finder::routes::create_router;

#[derive(Parser)]
#[command(version, about = "Assessment catalog crawler, indexer and search service")]
struct Cli {
    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve `POST /query` over the persisted index.
    Serve,
    /// Scrape the catalog and download product documents.
    Crawl,
    /// Merge the scraped listing and detail tables.
    Combine,
    /// Embed downloaded documents into the vector index.
    Ingest,
}

fn fatal(message: impl std::fmt::Display) -> ! {
    log::error!("{message}");
    std::process::exit(1);
}

fn load_embedder(config: &AppConfig) -> Arc<dyn Embedder> {
    let model = match parse_model(&config.index.model) {
        Ok(model) => model,
        Err(e) => fatal(e),
    };
    match FastEmbedder::try_new(&config.index.model, model) {
        Ok(embedder) => Arc::new(embedder),
        Err(e) => fatal(e),
    }
}

async fn serve(config: AppConfig) {
    let embedder = load_embedder(&config);
    let directory = config.index.directory.clone();
    let index = match tokio::task::spawn_blocking(move || UsearchIndex::load(&directory, embedder))
        .await
    {
        Ok(Ok(index)) => index,
        Ok(Err(e)) => fatal(format!("Failed to load vector index: {e}")),
        Err(e) => fatal(format!("Failed to load vector index: {e}")),
    };

    let client = match build_reqwest_client(Duration::from_secs(config.server.fetch_timeout_secs)) {
        Ok(client) => client,
        Err(e) => fatal(e),
    };
    let service = QueryService::new(
        Arc::new(index),
        Arc::new(HttpTextFetcher::new(client)),
        config.ranking,
    );
    let app = create_router(Arc::new(service));

    let listener = match tokio::net::TcpListener::bind(&config.server.bind_address).await {
        Ok(listener) => listener,
        Err(e) => fatal(format!(
            "Cannot bind to {}: {e}",
            config.server.bind_address
        )),
    };
    log::info!("Listening on {}", config.server.bind_address);

    if let Err(e) = axum::serve(listener, app).await {
        fatal(format!("Server error: {e}"));
    }
}

async fn crawl(config: AppConfig) {
    let client = match build_reqwest_client(Duration::from_secs(config.server.fetch_timeout_secs)) {
        Ok(client) => client,
        Err(e) => fatal(e),
    };
    let crawler = match ShlCatalogCrawler::new(&config.crawler, client) {
        Ok(crawler) => crawler,
        Err(e) => fatal(e),
    };
    let repo = CsvCatalogRepository::in_dir(&config.crawler.data_dir);

    if let Err(e) = process_crawl(&crawler, &repo, &config.crawler.downloads_dir).await {
        fatal(format!("Crawl failed: {e}"));
    }
}

fn combine(config: AppConfig) {
    let repo = CsvCatalogRepository::in_dir(&config.crawler.data_dir);
    if let Err(e) = process_combine(&repo) {
        fatal(format!("Combine failed: {e}"));
    }
}

async fn ingest(config: AppConfig) {
    let embedder = load_embedder(&config);
    let outcome = tokio::task::spawn_blocking(move || {
        let repo = CsvCatalogRepository::in_dir(&config.crawler.data_dir);
        process_ingest(
            &repo,
            &config.crawler.downloads_dir,
            &config.index.directory,
            embedder,
            config.ingest,
        )
    })
    .await;

    match outcome {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => fatal(format!("Ingest failed: {e}")),
        Err(e) => fatal(format!("Ingest failed: {e}")),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();
    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => fatal(e),
    };

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Crawl => crawl(config).await,
        Command::Combine => combine(config),
        Command::Ingest => ingest(config).await,
    }
}
