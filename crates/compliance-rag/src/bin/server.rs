//! Compliance server binary
//!
//! Run with: cargo run -p compliance-rag --bin compliance-rag-server
//! GCP backend: cargo run -p compliance-rag --features gcp --bin compliance-rag-server

use compliance_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "compliance_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?}", config.backend);
    tracing::info!("  - Auth: {:?}", config.auth.mode);
    tracing::info!(
        "  - Naive context: {} docs x {} chars",
        config.context.naive_max_documents,
        config.context.naive_max_chars
    );
    match &config.gcp {
        Some(gcp) => {
            tracing::info!("  - Generation model: {}", gcp.generation_model);
            tracing::info!(
                "  - RAG corpus: {}",
                gcp.rag_corpus.as_deref().unwrap_or("(none, document-based context)")
            );
        }
        None => tracing::info!("  - Generation model: {}", config.llm.generate_model),
    }

    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST   /            - Ask a compliance question");
    println!("  POST   /upload      - Upload a knowledge base document");
    println!("  GET    /files       - List documents");
    println!("  DELETE /files/:name - Delete a document");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
