//! The `scio` binary: `serve` runs the HTTP API plus the stage-B/C
//! queue workers in one process; `analyze` runs the scheduler once
//! over stdin for standalone/offline use; `config show` prints the
//! effective merged configuration.

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use clap::{Parser, Subcommand};
use scio_core::config::Config;
use scio_core::http::{self, AppState};
use scio_core::pipeline::{
    self, FsBlobStore, HttpIndexClient, HttpSink, IndexClient, MemoryQueue, PlainTextExtractor,
    Sink,
};
use scio_core::scheduler::registry;
use scio_core::vocab::AliasTable;

#[derive(Parser)]
#[command(name = "scio", about = "Document ingest and enrichment pipeline for cyber-threat-intelligence reports")]
struct Cli {
    /// Path to a TOML config file. Defaults to the XDG config directory.
    #[arg(long, global = true, env = "SCIO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP submit API and the extract/analyze workers.
    Serve {
        /// Override the configured bind address.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Read one job envelope from stdin, run the analyzer DAG, print the result to stdout.
    Analyze,
    /// Print the effective merged configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
}

fn load_alias_table(path: &Option<PathBuf>) -> anyhow::Result<Arc<AliasTable>> {
    let table = match path {
        Some(p) => AliasTable::load_file(p, true, &[])?,
        None => AliasTable::load_str("", true, &[])?,
    };
    Ok(Arc::new(table))
}

fn resolve_config_path(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(Config::default_config_path)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(&cli);
    let config = Config::load(config_path.as_deref())?;

    match cli.command {
        Command::Serve { bind } => run_serve(config, bind).await,
        Command::Analyze => run_analyze(config).await,
        Command::Config { action: ConfigAction::Show } => run_config_show(config),
    }
}

async fn run_serve(config: Config, bind_override: Option<String>) -> anyhow::Result<()> {
    let bind = bind_override.unwrap_or_else(|| config.http_bind.clone());

    let blob_store: Arc<dyn pipeline::BlobStore + Send + Sync> =
        Arc::new(FsBlobStore::new(config.blob_store_path.clone()));
    let queue: Arc<dyn pipeline::Queue + Send + Sync> = Arc::new(MemoryQueue::new());

    let threatactor_table = load_alias_table(&config.threatactor_alias_path)?;
    let tools_table = load_alias_table(&config.tools_alias_path)?;
    let sector_table = load_alias_table(&config.sector_alias_path)?;
    let country_table = load_alias_table(&config.country_alias_path)?;

    let analyzers = registry::built_in_analyzers(
        &config,
        threatactor_table,
        tools_table,
        sector_table,
        country_table,
    );
    registry::validate(&analyzers)?;

    let index: Option<Arc<dyn IndexClient + Send + Sync>> = match &config.index_url {
        Some(url) => Some(Arc::new(HttpIndexClient::new(
            url.clone(),
            "scio2".to_string(),
            std::time::Duration::from_secs(config.index_timeout_secs),
        )?)),
        None => None,
    };
    let sink: Option<Arc<dyn Sink + Send + Sync>> = match &config.sink_url {
        Some(url) => Some(Arc::new(HttpSink::new(
            url.clone(),
            std::time::Duration::from_secs(config.http_timeout_secs),
        )?)),
        None => None,
    };

    let extractor = Arc::new(PlainTextExtractor::new());
    tokio::spawn(pipeline::run_extract_worker(
        queue.clone(),
        blob_store.clone(),
        extractor,
    ));

    let stage_c = Arc::new(pipeline::stage_c::StageC {
        analyzers,
        date_fields: config.date_fields.clone(),
        sink,
        index: index.clone(),
    });
    tokio::spawn(pipeline::run_analyze_worker(queue.clone(), stage_c));

    let app_state = web::Data::new(AppState {
        blob_store,
        queue,
        index,
        max_jobs: config.max_jobs,
    });

    tracing::info!(bind = %bind, "scio serve: listening");
    HttpServer::new(move || App::new().app_data(app_state.clone()).configure(http::configure))
        .bind(&bind)?
        .run()
        .await?;

    Ok(())
}

async fn run_analyze(config: Config) -> anyhow::Result<()> {
    let threatactor_table = load_alias_table(&config.threatactor_alias_path)?;
    let tools_table = load_alias_table(&config.tools_alias_path)?;
    let sector_table = load_alias_table(&config.sector_alias_path)?;
    let country_table = load_alias_table(&config.country_alias_path)?;

    let analyzers = registry::built_in_analyzers(
        &config,
        threatactor_table,
        tools_table,
        sector_table,
        country_table,
    );
    registry::validate(&analyzers)?;

    pipeline::analyze_one(analyzers, config.date_fields.clone()).await?;
    Ok(())
}

fn run_config_show(config: Config) -> anyhow::Result<()> {
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
