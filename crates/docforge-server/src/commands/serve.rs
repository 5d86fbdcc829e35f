//! `docforge serve`: run the HTTP service.

use anyhow::{Context, Result};

use docforge_core::config::ServiceConfig;
use docforge_core::pipeline::DocumentService;

use crate::api::{self, AppState};
use crate::output;

/// Build the per-process service context and serve it until Ctrl-C.
pub async fn run(config: ServiceConfig) -> Result<()> {
    let (service, bucket) = DocumentService::from_config(&config)?;

    let links = match config.signed_url_expiry_secs {
        Some(secs) => format!("signed, expire after {secs}s"),
        None => "public".to_string(),
    };
    let templates: Vec<String> = service
        .registry()
        .list()
        .into_iter()
        .map(|v| v.id)
        .collect();
    output::Panel::new("docforge serve")
        .row("Listening", format!("http://{}", config.bind))
        .row("Bucket", config.storage_root.display().to_string())
        .row("Public URL", config.public_base_url.as_str())
        .row("Links", links)
        .row("Templates", templates.join(", "))
        .print();
    if !bucket.root().join("templates").is_dir() {
        output::warning("bucket has no templates/ directory; run `docforge init` first");
    }

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(bind = %config.bind, "listening");

    axum::serve(listener, api::router(AppState::new(service, bucket)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    output::success("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
