//! ragline: operator CLI for building an index and asking questions.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ragline_api::telemetry;
use ragline_chat::{
    index_configured_source, index_manager, Backends, ChatMessage, ChatPipeline, Overrides,
    RagConfig,
};

#[derive(Parser)]
#[command(name = "ragline")]
#[command(author, version, about = "Build search indexes and ask grounded questions")]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (default: ~/.config/ragline/ragline.toml, else environment)
    #[arg(short, long, global = true, env = "RAGLINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild a search index from a content file (CSV, JSONL or JSON)
    Index {
        /// Content file to index
        #[arg(long)]
        csv_file: PathBuf,

        /// Index to (re)create (default: configured index name)
        #[arg(long)]
        index_name: Option<String>,
    },

    /// Ask a single question against the configured index
    Ask {
        /// Question text
        #[arg(short, long)]
        query: String,

        /// Number of documents to retrieve
        #[arg(long)]
        top: Option<usize>,

        /// Print the full response, including retrieval context, as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _file_guard = telemetry::init("ragline=info,ragline_chat=info", "ragline.log");

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = RagConfig::load(cli.config.as_deref())?;
    let backends = Backends::from_config(&config)?;

    match cli.command {
        Commands::Index {
            csv_file,
            index_name,
        } => {
            let index_name = index_name.unwrap_or_else(|| config.search.index_name.clone());
            cmd_index(&config, &backends, &csv_file, &index_name).await
        }
        Commands::Ask { query, top, json } => {
            cmd_ask(&config, &backends, query, top, json).await
        }
    }
}

async fn cmd_index(
    config: &RagConfig,
    backends: &Backends,
    path: &Path,
    index_name: &str,
) -> anyhow::Result<()> {
    let report = index_manager(config, backends)?
        .create_index(path, index_name)
        .await?;
    println!(
        "Indexed {} documents into '{}' ({} dimensions{})",
        report.document_count,
        report.index_name,
        report.dimensions,
        if report.replaced_existing {
            ", replaced existing index"
        } else {
            ""
        }
    );
    Ok(())
}

async fn cmd_ask(
    config: &RagConfig,
    backends: &Backends,
    query: String,
    top: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    // A process-local index only exists once the configured source is loaded
    index_configured_source(config, backends).await?;

    let pipeline = ChatPipeline::from_config(config, backends, None)?;
    let response = pipeline
        .send_chat(&[ChatMessage::user(query)], Overrides { top })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", response.message.content);
    if let Some(batch) = response.context.grounding_data().last() {
        if !batch.is_empty() {
            println!();
            println!("Sources:");
            for doc in batch {
                println!("  [{}] {} ({})", doc.id, doc.title, doc.url);
            }
        }
    }
    Ok(())
}
