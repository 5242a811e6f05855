use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tbr_lookup::api::ApiServer;
use tbr_lookup::config::{Config, LookupStrategy};
use tbr_lookup::tropes::TropeDictionary;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("TikTok TBR Lookup")
        .version(env!("CARGO_PKG_VERSION"))
        .author("TigreRoll")
        .about("Book metadata enrichment API: pages, descriptions and tropes")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to a TOML configuration file")
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Listen port (overrides config and PORT)")
                .value_parser(clap::value_parser!(u16))
        )
        .arg(
            Arg::new("strategy")
                .short('s')
                .long("strategy")
                .value_name("STRATEGY")
                .help("Lookup strategy: catalog_then_api, catalog_only or api_only")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
        )
        .get_matches();

    // Load configuration. An explicit --config must load; a discovered
    // file that fails falls back to defaults plus environment overrides.
    let explicit = matches.get_one::<String>("config").map(PathBuf::from);
    let config_path = explicit.clone().or_else(Config::discover);
    let mut load_failure = None;
    let mut config = match &config_path {
        Some(path) if explicit.is_some() => Config::load_from(path)?,
        Some(path) => Config::load_from(path).or_else(|e| {
            load_failure = Some(e);
            Config::from_env()
        })?,
        None => Config::from_env()?,
    };

    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }
    if let Some(strategy) = matches.get_one::<String>("strategy") {
        config.sources.strategy = LookupStrategy::parse(strategy)?;
    }

    // Initialize logging
    let verbose = matches.get_flag("verbose");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter(verbose)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if verbose {
        info!("Verbose logging enabled");
    }

    match (&config_path, load_failure) {
        (Some(path), Some(e)) => warn!("Failed to load {}, using defaults: {}", path.display(), e),
        (Some(path), None) => info!("📄 Loaded configuration from: {}", path.display()),
        (None, _) => info!("No configuration file found, using defaults"),
    }

    config.validate()?;

    info!("🚀 TikTok TBR Lookup starting...");
    info!("{}", config.summary());

    let tropes = match &config.tropes.vocabulary_file {
        Some(path) => TropeDictionary::from_file(path).await.unwrap_or_else(|e| {
            warn!("Failed to load trope vocabulary, using built-in list: {}", e);
            TropeDictionary::new()
        }),
        None => TropeDictionary::new(),
    }
    .with_max_tropes(config.tropes.max_tropes);

    info!("📚 {}", tropes.get_stats().summary());

    let server = ApiServer::new(Arc::new(config), tropes)?;
    server.start().await
}
