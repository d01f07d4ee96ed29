use std::sync::Arc;

use abook_service::AddressbookService;
use abook_snapshot::JsonFileSnapshot;
use abook_types::Principal;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::AppState;
use crate::router::build_router;

/// Principal recorded on entities created while bootstrapping.
pub const BOOTSTRAP_PRINCIPAL: &str = "system";

/// Addressbook HTTP server.
pub struct AbookServer {
    config: ServerConfig,
    service: Arc<AddressbookService>,
}

impl AbookServer {
    /// Open the file snapshot in `config.data_dir` and restore the registry.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let snapshot = Arc::new(JsonFileSnapshot::new(config.snapshot_config()));
        let service = AddressbookService::open(snapshot, &Principal::new(BOOTSTRAP_PRINCIPAL))?;
        Ok(Self::with_service(config, Arc::new(service)))
    }

    pub fn with_service(config: ServerConfig, service: Arc<AddressbookService>) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn service(&self) -> &Arc<AddressbookService> {
        &self.service
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(
            self.service.clone(),
            &self.config.principal_header,
        ))
    }

    /// Serve requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            data_dir = %self.config.data_dir.display(),
            persistent = self.config.persistent,
            "abook server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("abook server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
