use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};
use rustdocs_mcp::config::Config;
use rustdocs_mcp::error::ServerError;
use rustdocs_mcp::index::SemanticIndex;
use rustdocs_mcp::provider::OpenAiProvider;
use rustdocs_mcp::server::DocsServer;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory containing generated rustdoc HTML (one subdirectory per crate)
    #[arg(short = 'd', long)]
    docs_root: PathBuf,

    /// Name of the crate to serve documentation for
    crate_name: String,

    /// Index every candidate file instead of only the largest of each duplicate group
    #[arg(long)]
    all_files: bool,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let docs_root = std::fs::canonicalize(&cli.docs_root).map_err(|e| {
        ServerError::Config(format!(
            "Failed to resolve docs root '{}': {}",
            cli.docs_root.display(),
            e
        ))
    })?;

    let config = Config::from_env(docs_root, cli.crate_name, cli.all_files)?;
    tracing::info!(
        crate_name = %config.crate_name,
        docs_root = %config.docs_root.display(),
        all_files = config.all_files,
        "starting rustdocs-mcp"
    );

    let provider = Arc::new(OpenAiProvider::new(&config));

    // One-shot gate: no tool call is accepted before the index is Ready,
    // and a failure here is fatal to the whole process.
    let index = SemanticIndex::open(&config, provider).await?;
    tracing::info!(documents = index.len(), "index ready, serving on stdio");

    let server = DocsServer::new(config.crate_name.clone(), Arc::new(index));

    let service = server.serve(stdio()).await.map_err(|e| {
        tracing::error!("failed to start server: {e:?}");
        ServerError::McpRuntime(e.to_string())
    })?;

    service
        .waiting()
        .await
        .map_err(|e| ServerError::McpRuntime(e.to_string()))?;

    tracing::info!("server stopped");
    Ok(())
}
