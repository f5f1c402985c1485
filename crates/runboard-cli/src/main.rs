//! Runboard command line
//!
//! Runs queries over run payload files through the background worker.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use runboard_cli::condition::{add_condition, parse_condition};
use runboard_cli::input::{load_batch, load_query, load_requests, read_file};
use runboard_cli::{LogFormat, RunboardConfig};
use runboard_core::FilterNode;
use runboard_sdk::{LatestResponse, Query, RunsRequest, RunsWorker, SortSpec};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "runboard", version, about = "Runboard: run data query engine")]
struct Cli {
    /// Config file base name (extension optional)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print single-line JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one query over a batch of raw run payloads
    Query {
        /// JSON/YAML file with raw run payloads
        #[arg(long)]
        runs: PathBuf,

        /// JSON/YAML file with the query
        #[arg(long, conflicts_with = "filter_url")]
        query: Option<PathBuf>,

        /// Filters as produced by `filter encode`
        #[arg(long)]
        filter_url: Option<String>,

        /// Extra condition such as `config:lr<0.1`; repeatable
        #[arg(long = "where", value_name = "CONDITION")]
        conditions: Vec<String>,

        /// Sort key, e.g. `summary:acc`
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Maximum number of rows
        #[arg(long)]
        page: Option<usize>,
    },

    /// Replay a sequence of requests, in order, through one worker
    Replay {
        /// JSON/YAML file with one request or an array of requests
        requests: PathBuf,

        /// Print only the newest response
        #[arg(long)]
        latest_only: bool,
    },

    /// Convert filters to and from their URL parameter form
    Filter {
        #[command(subcommand)]
        cmd: FilterCmd,
    },
}

#[derive(Subcommand, Debug)]
enum FilterCmd {
    /// Encode a JSON/YAML filter file
    Encode { file: PathBuf },
    /// Decode a URL parameter
    Decode { param: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RunboardConfig::load_from(path)?,
        None => RunboardConfig::load()?,
    };
    init_tracing(&config)?;
    let pretty = config.pretty && !cli.compact;

    match cli.command {
        Command::Query {
            runs,
            query,
            filter_url,
            conditions,
            sort,
            desc,
            page,
        } => {
            let mut query = match (&query, &filter_url) {
                (Some(path), _) => load_query(path)?,
                (None, Some(param)) => Query::new(FilterNode::from_url(param)?),
                (None, None) => Query::default(),
            };
            for condition in &conditions {
                query.filters = add_condition(&query.filters, parse_condition(condition)?);
            }
            if let Some(sort) = sort {
                query = query.with_sort(SortSpec::by(sort, !desc));
            }
            if let Some(size) = page {
                query = query.with_page_size(size);
            }
            let request = RunsRequest::new(query).with_raw_batch(load_batch(&runs)?);
            run_requests(config, vec![request], false, pretty).await
        }
        Command::Replay {
            requests,
            latest_only,
        } => {
            let requests = load_requests(&requests)?;
            run_requests(config, requests, latest_only, pretty).await
        }
        Command::Filter { cmd } => match cmd {
            FilterCmd::Encode { file } => {
                let filter: FilterNode = read_file(&file)?;
                println!("{}", filter.to_url());
                Ok(())
            }
            FilterCmd::Decode { param } => {
                let filter = FilterNode::from_url(&param)?;
                print_json(&filter, pretty)
            }
        },
    }
}

/// Submit `requests` in order. A request without a previous batch inherits
/// the raw batch of the request before it.
async fn run_requests(
    config: RunboardConfig,
    requests: Vec<RunsRequest>,
    latest_only: bool,
    pretty: bool,
) -> Result<()> {
    let worker = RunsWorker::spawn(config.engine)?;
    let client = worker.client();
    info!("Replaying {} request(s)", requests.len());

    let mut latest = LatestResponse::new();
    let mut previous_batch = Vec::new();
    for mut request in requests {
        if request.previous_raw_batch.is_empty() {
            request.previous_raw_batch = std::mem::take(&mut previous_batch);
        }
        previous_batch = request.raw_batch.clone();

        let tagged = client.submit(request).await?;
        if latest_only {
            latest.offer(tagged);
        } else {
            print_json(&tagged, pretty)?;
        }
    }
    if let Some(response) = latest.get() {
        print_json(response, pretty)?;
    }

    tokio::task::spawn_blocking(move || worker.shutdown())
        .await
        .context("Worker shutdown task failed")??;
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing(config: &RunboardConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_level.clone().into());
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}
