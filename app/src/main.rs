// app/src/main.rs

use std::sync::Arc;

use actix_web::HttpServer;
use marketplace::config::{AppConfig, BackendKind};
use marketplace::hosted::{Hosted, MemoryBackend, RestBackend};
use marketplace::state::AppState;
use marketplace::web::build_app;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting marketplace server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let hosted = match app_config.backend {
    BackendKind::Rest => {
      let backend = RestBackend::new(
        &app_config.hosted_url,
        &app_config.hosted_anon_key,
        &app_config.hosted_service_key,
      )
      .map_err(|e| {
        tracing::error!(error = %e, "Failed to build hosted client.");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
      })?;
      tracing::info!(url = %app_config.hosted_url, "Using hosted backend.");
      Hosted::from_rest(backend)
    }
    BackendKind::Memory => {
      tracing::warn!("Using in-memory backend; nothing is persisted.");
      Hosted::from_memory(Arc::new(MemoryBackend::new(&app_config.app_base_url)))
    }
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  let app_state = AppState::new(hosted, app_config);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || build_app(app_state.clone()))
    .bind(&server_address)?
    .run()
    .await
}
