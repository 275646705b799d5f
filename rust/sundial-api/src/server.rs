//! HTTP server setup and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::config::AppConfig;
use crate::gateway;
use crate::llm::{ChatCompletionsClient, GenerationClient};
use crate::logging::OpTimer;
use crate::mailer::{HttpMailer, Notifier};
use crate::scheduler::{ExecutionEngine, ResultsPager, ScheduleManager};
use crate::store::{InMemoryScheduleStore, ScheduleStore};
use crate::trigger::{InMemoryTriggerService, TriggerService};
use crate::{log_init_step, log_init_warning, AppState};

/// Sundial API version (from Cargo.toml).
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create the application with all routes and middleware.
///
/// Wires the default adapters: in-memory store and trigger backends (the
/// durable backends are deployment adapters configured at the edge), the
/// OpenAI-compatible generation driver, and the HTTP mail relay.
pub fn create_app(config: AppConfig) -> anyhow::Result<Router> {
    let overall_timer = OpTimer::new("server", "create_app");
    tracing::info!("Sundial API v{VERSION} starting");

    // [1/5] Generation backend
    let generation_info = format!(
        "{} {}",
        config.generation.model,
        if config.generation.api_key.is_some() {
            "✓"
        } else {
            "✗ No API key"
        }
    );
    log_init_step!(1, 5, "Generation client", generation_info);
    if config.generation.api_key.is_none() {
        log_init_warning!("No generation API key configured. Scheduled runs will fail.");
    }
    let generator: Arc<dyn GenerationClient> =
        Arc::new(ChatCompletionsClient::new(config.generation.clone()));

    // [2/5] Mail relay
    log_init_step!(
        2,
        5,
        "Mail relay",
        if config.mailer.endpoint.is_some() {
            "configured"
        } else {
            "not configured (notifications skipped)"
        }
    );
    let notifier: Arc<dyn Notifier> = Arc::new(HttpMailer::new(config.mailer.clone()));

    // [3/5] Store and trigger adapters
    log_init_step!(3, 5, "Adapters", "in-memory store + trigger service");
    let store: Arc<dyn ScheduleStore> = Arc::new(InMemoryScheduleStore::new());
    let triggers: Arc<dyn TriggerService> = Arc::new(InMemoryTriggerService::new());

    // [4/5] Core components
    log_init_step!(4, 5, "Scheduler", format!("timezone {}", config.trigger.timezone));
    let manager = Arc::new(ScheduleManager::new(
        Arc::clone(&store),
        triggers,
        config.trigger.timezone.clone(),
    ));
    let engine = Arc::new(ExecutionEngine::new(
        Arc::clone(&store),
        generator,
        notifier,
    ));
    let pager = Arc::new(ResultsPager::new(store));

    // [5/5] Router
    if config.gateway.jwt_secret.is_none() {
        log_init_warning!("No JWT secret configured. User-facing routes will reject all calls.");
    }
    log_init_step!(5, 5, "Router", "routes + middleware");

    let state = AppState {
        config: Arc::new(config),
        manager,
        engine,
        pager,
    };

    let app = build_router(state);
    overall_timer.finish();
    Ok(app)
}

/// Assemble the router over prepared application state.
///
/// Split from [`create_app`] so tests can wire their own adapters.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let authed = api::schedules::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        gateway::require_identity,
    ));

    Router::new()
        .merge(api::health::router())
        .merge(api::internal::router())
        .merge(authed)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.timeout_secs,
        )))
        .with_state(state)
}
