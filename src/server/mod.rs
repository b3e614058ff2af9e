//! HTTP API over the catalog.
//!
//! Every handler takes a fresh store handle from the shared
//! [`StoreFactory`] and runs its blocking store work on tokio's blocking
//! pool.

pub mod errors;
pub mod handlers;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::db::{Database, StoreFactory};
use errors::ApiError;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub stores: Arc<StoreFactory>,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub upcoming_window_days: i64,
}

impl AppState {
    pub fn new(stores: StoreFactory, config: &Config) -> Self {
        Self {
            stores: Arc::new(stores),
            default_page_size: config.server.default_page_size,
            max_page_size: config.server.max_page_size,
            upcoming_window_days: config.events.upcoming_window_days,
        }
    }

    /// Run `work` against a new store handle off the async runtime.
    ///
    /// Store failures and panics in `work` are logged under `operation` and
    /// answered with `failure` as a 500.
    pub(crate) async fn with_store<T, E, F>(
        &self,
        operation: &'static str,
        failure: &'static str,
        work: F,
    ) -> Result<T, ApiError>
    where
        T: Send + 'static,
        E: std::fmt::Display + From<crate::db::StoreError> + Send + 'static,
        F: FnOnce(&Database) -> Result<T, E> + Send + 'static,
    {
        let stores = Arc::clone(&self.stores);
        let joined = tokio::task::spawn_blocking(move || {
            let db = stores.connect()?;
            work(&db)
        })
        .await;

        match joined {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("{} failed: {}", operation, e);
                Err(ApiError::internal(failure))
            }
            Err(e) => {
                error!("{} task did not complete: {}", operation, e);
                Err(ApiError::internal(failure))
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/photos", get(handlers::list_photos))
        .route("/api/photos/{reference_code}", get(handlers::get_photo))
        .route("/api/schools", get(handlers::list_schools))
        .route("/api/classes", get(handlers::list_classes))
        .route("/api/events", get(handlers::list_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the store, make sure the schema exists, and serve until the
/// process is stopped.
pub async fn serve(config: &Config, bind: &str) -> Result<()> {
    let stores = StoreFactory::new(&config.database).context("Failed to configure store")?;

    let init = stores.connect().and_then(|db| db.initialize());
    if let Err(e) = init {
        // The store may come up later; requests report failures individually.
        error!("Store not ready at startup: {}", e);
    }

    let app = router(AppState::new(stores, config));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on {}", bind);

    axum::serve(listener, app).await?;
    Ok(())
}
