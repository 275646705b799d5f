//! Sundial API - recurring prompt scheduling and execution service.
//!
//! Sundial attaches a recurring time trigger to a natural-language prompt:
//! at the configured cadence an external trigger service invokes the
//! execution entry point, the prompt is sent to a generation backend, the
//! result is persisted, and optionally emailed.
//!
//! # Architecture
//!
//! The service is organized into several key modules:
//!
//! - [`config`]: Configuration management and environment loading
//! - [`gateway`]: Identity verification for user-facing routes
//! - [`scheduler`]: Cadence translation, schedule lifecycle, execution,
//!   results paging, and trigger reconciliation
//! - [`store`]: Narrow interface over the durable key-value store
//! - [`trigger`]: Narrow interface over the external trigger service
//! - [`llm`]: Generation backend drivers
//! - [`mailer`]: Best-effort notification delivery
//! - [`api`]: HTTP API endpoints
//!
//! # Example
//!
//! ```rust,ignore
//! use sundial_api::{config::AppConfig, server::create_app};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let app = create_app(config)?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod llm;
pub mod logging;
pub mod mailer;
pub mod scheduler;
pub mod server;
pub mod store;
pub mod trigger;

use std::sync::Arc;

use config::AppConfig;
use scheduler::{ExecutionEngine, ResultsPager, ScheduleManager};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Schedule lifecycle manager.
    pub manager: Arc<ScheduleManager>,
    /// Execution engine invoked on trigger fires and manual runs.
    pub engine: Arc<ExecutionEngine>,
    /// Execution-history pager.
    pub pager: Arc<ResultsPager>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"AppConfig")
            .field("manager", &self.manager)
            .field("engine", &self.engine)
            .field("pager", &self.pager)
            .finish()
    }
}
