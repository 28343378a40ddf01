use actix_web::HttpServer;
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod app;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod recorder;
mod routes;
mod store;
mod utils;

#[cfg(test)]
mod test_support;

use app::{AppState, build_app};
use config::{Config, StorageBackend};
use db::init_db;
use store::{InMemoryRepository, MySqlRepository};
use utils::document_cache::DocumentCache;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_appender::rolling;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(backend = ?config.storage_backend, "Server starting...");

    let state = match config.storage_backend {
        StorageBackend::MySql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when STORAGE_BACKEND is mysql")?;
            let pool = init_db(url, config.db_max_connections).await?;

            let documents = DocumentCache::new(config.document_cache_ttl);
            let cache_for_warmup = documents.clone();
            let pool_for_warmup = pool.clone();
            actix_web::rt::spawn(async move {
                if let Err(e) = cache_for_warmup.warmup(&pool_for_warmup, 250).await {
                    error!(error = ?e, "Failed to warmup document cache");
                }
            });

            AppState::new(config.clone(), Arc::new(MySqlRepository::new(pool, documents)))?
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, data is lost on restart");
            AppState::new(config.clone(), Arc::new(InMemoryRepository::new()))?
        }
    };

    match &config.bootstrap_admin {
        Some(seed) => {
            auth::bootstrap::ensure_admin(state.admins.as_ref(), seed).await?;
        }
        None => info!("No bootstrap administrator configured"),
    }

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || build_app(state.clone()))
        .bind(&server_addr)
        .with_context(|| format!("binding {server_addr}"))?
        .run()
        .await?;

    Ok(())
}
