//! ragline-api: HTTP server for grounded chat.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use ragline_api::{router, telemetry, AppState};
use ragline_chat::{
    index_configured_source, Backends, ChatPipeline, PipelineObserver, RagConfig,
    TracingObserver,
};

#[derive(Parser)]
#[command(name = "ragline-api")]
#[command(author, version, about = "Grounded chat HTTP server")]
struct Args {
    /// Config file (default: ~/.config/ragline/ragline.toml, else environment)
    #[arg(short, long, env = "RAGLINE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _file_guard = telemetry::init(
        "ragline_api=debug,ragline_chat=debug,tower_http=debug",
        "ragline-api.log",
    );

    let args = Args::parse();
    let config = RagConfig::load(args.config.as_deref())?;
    let backends = Backends::from_config(&config)?;

    if let Some(report) = index_configured_source(&config, &backends).await? {
        info!(
            index_name = %report.index_name,
            document_count = report.document_count,
            "Indexed configured source"
        );
    }

    let observer: Arc<dyn PipelineObserver> = Arc::new(TracingObserver);
    let pipeline = ChatPipeline::from_config(&config, &backends, Some(observer))?;
    let app = router(AppState::new(pipeline));

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!(
        index_name = %config.search.index_name,
        search_backend = backends.search.backend_name(),
        "Starting server on {}",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;

    Ok(())
}
