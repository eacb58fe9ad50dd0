// Copyright (c), BioPredict Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use biopredict_server::app::{api_router, spawn_admin_server};
use biopredict_server::config::ServerConfig;
use biopredict_server::store::RecordStore;
use biopredict_server::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    info!("BioPredict server v{} starting", env!("CARGO_PKG_VERSION"));

    let store = RecordStore::open(&config.database_path)?;
    info!("Using database {}", config.database_path.display());

    let listen_addr = config.listen_addr;
    let state = Arc::new(AppState { config, store });

    spawn_admin_server(state.clone()).await?;

    let app = api_router(state);
    let listener = TcpListener::bind(listen_addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
