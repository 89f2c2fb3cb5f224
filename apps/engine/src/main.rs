//! Citeline - command-line entry point
//!
//! Usage:
//!   citeline compile '"lung cancer" AND (screening OR NOT procedure)' [--offline]
//!   citeline date-range gt2010-12
//!   citeline search artifact-current-state=active _content=asthma _count=10 [--url URL] [--client ADDR]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use citeline::config::{Config, DatabaseConfig};
use citeline::db::search::{parse_comparator_search, SearchCriteria};
use citeline::db::{
    with_timeout, ConceptStore, PgAuditLogStore, PgCitationStore, PgConceptStore, PgMeshTreeStore,
};
use citeline::logging;
use citeline::services::{SearchAuditLogger, SearchRequest, SearchService};
use citeline_query::{compile_parsed, parse, ConceptIndex, SynonymResolver};

#[derive(Parser, Debug)]
#[clap(name = "citeline")]
#[clap(about = "Citation search engine", version)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a free-text expression to a PostgreSQL tsquery
    Compile {
        expression: String,

        /// Skip the concept store (no synonym expansion)
        #[clap(long)]
        offline: bool,
    },

    /// Resolve a comparator-prefixed partial date
    DateRange { value: String },

    /// Run a search and print the searchset Bundle
    Search {
        /// Search parameters as name=value
        #[clap(required = true)]
        params: Vec<String>,

        /// Request URL used for navigation links
        #[clap(long, default_value = "/Citation")]
        url: String,

        /// Client address recorded in the search log
        #[clap(long)]
        client: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
    logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    match cli.command {
        Command::Compile { expression, offline } => compile(&config, &expression, offline).await,
        Command::DateRange { value } => {
            let search = parse_comparator_search(&value)
                .with_context(|| format!("Cannot resolve date '{value}'"))?;
            println!("comparator: {}", search.comparator);
            println!("start:      {}", search.start.to_rfc3339());
            println!("end:        {}", search.end.to_rfc3339());
            Ok(())
        }
        Command::Search { params, url, client } => search(config, params, url, client).await,
    }
}

async fn connect(database: &DatabaseConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(Duration::from_secs(database.acquire_timeout_seconds))
        .connect(&database.url)
        .await
        .context("Failed to connect to database")
}

async fn compile(config: &Config, expression: &str, offline: bool) -> anyhow::Result<()> {
    let stop_words = config.search.load_stop_words()?;
    let parsed = parse(expression);

    let index = if offline {
        ConceptIndex::empty()
    } else {
        let keys = SynonymResolver::new(&stop_words).lookup_keys(&parsed);
        let pool = connect(&config.database).await?;
        let store = PgConceptStore::new(pool);
        let concepts = with_timeout(
            config.search.store_timeout(),
            "concepts.matching",
            store.matching(&keys),
        )
        .await
        .context("Concept lookup failed")?;
        ConceptIndex::new(concepts)
    };

    println!("{}", compile_parsed(&parsed, &stop_words, &index));
    Ok(())
}

async fn search(
    config: Config,
    params: Vec<String>,
    url: String,
    client: Option<String>,
) -> anyhow::Result<()> {
    let items = params
        .iter()
        .map(|p| {
            p.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .with_context(|| format!("Expected name=value, got '{p}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let pool = connect(&config.database).await?;
    let stop_words = config.search.load_stop_words()?;
    let audit = SearchAuditLogger::new(Arc::new(PgAuditLogStore::new(pool.clone())), &config.audit);
    let service = SearchService::new(
        Arc::new(PgCitationStore::new(pool.clone())),
        Arc::new(PgConceptStore::new(pool.clone())),
        Arc::new(PgMeshTreeStore::new(pool)),
        audit,
        stop_words,
        config.search.clone(),
    );

    let request = SearchRequest {
        criteria: SearchCriteria::from_items(items),
        url: url_with_params(&url, &params),
        client_address: client,
    };

    match service.search(&request).await {
        Ok(outcome) => {
            let bundle = service.to_bundle(&outcome);
            println!("{}", serde_json::to_string_pretty(&bundle)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.to_operation_outcome())?);
            Err(e.into())
        }
    }
}

/// Append the command-line parameters to the link URL when it has no query.
fn url_with_params(url: &str, params: &[String]) -> String {
    if url.contains('?') {
        return url.to_string();
    }
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for param in params {
        if let Some((k, v)) = param.split_once('=') {
            serializer.append_pair(k, v);
        }
    }
    format!("{}?{}", url, serializer.finish())
}
