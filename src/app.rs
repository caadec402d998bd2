use axum::{
    middleware::{from_fn_with_state, map_response},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{self, create_cors_layer, set_security_headers};
use crate::database::Store;
use crate::handlers;
use crate::middleware::{admin_auth, event_auth};
use crate::services::{AccountService, ResetCodeNotifier};

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub accounts: Arc<AccountService>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn ResetCodeNotifier>) -> Self {
        let accounts = Arc::new(AccountService::new(Arc::clone(&store), notifier));
        Self { store, accounts }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/health", get(handlers::health))
        .merge(auth_public_routes())
        .merge(event_public_routes())
        // Protected
        .merge(event_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&config::config().security))
                .layer(map_response(set_security_headers)),
        )
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/signin", post(auth::signin))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password))
}

fn event_public_routes() -> Router<AppState> {
    use handlers::public::events;

    Router::new()
        .route("/api/events", get(events::list))
        .route("/api/events/:id", get(events::show))
}

fn event_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::events;

    Router::new()
        .route("/api/events", post(events::create))
        .route("/api/events/:id", put(events::update).delete(events::delete))
        .route_layer(from_fn_with_state(state, event_auth))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use handlers::elevated;

    Router::new()
        .route("/api/events/change-role", post(elevated::change_role))
        .route_layer(from_fn_with_state(state, admin_auth))
}
