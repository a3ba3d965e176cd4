//! Router assembly

use crate::handlers::{batches, catalog, drugs, health, registrations};
use crate::{middleware as app_middleware, AppState};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use drugreg_common::{
    auth::{require_bearer, JwtManager},
    db::{
        AuthorityHolders, DosageForms, Ingredients, ManufacturingSites, MarketingAuthorizations,
        RoutesOfAdmin, StrengthUnits,
    },
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Health endpoints (no auth)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready));

    let mut api_routes = Router::new()
        // Catalog
        .merge(catalog::routes::<Ingredients>("/ingredients"))
        .merge(catalog::routes::<DosageForms>("/dosage-forms"))
        .merge(catalog::routes::<RoutesOfAdmin>("/routes"))
        .merge(catalog::routes::<StrengthUnits>("/strength-units"))
        .merge(catalog::routes::<AuthorityHolders>("/authority-holders"))
        .merge(catalog::routes::<ManufacturingSites>("/manufacturing-sites"))
        .merge(catalog::routes::<MarketingAuthorizations>("/marketing-authorizations"))
        // Drugs
        .route("/drugs", post(drugs::create).get(drugs::list))
        .route("/drugs/{id}", patch(drugs::update))
        .route("/drugs/{id}/batches", get(batches::list_for_drug))
        .route("/drugs-with-batches", get(drugs::list_with_batches))
        // Batches
        .route("/batches", post(batches::create).get(batches::list))
        .route("/batches/{id}", patch(batches::update))
        // Registrations and their links
        .route("/registrations", post(registrations::create).get(registrations::list))
        .route("/registrations/{id}", patch(registrations::update))
        .route(
            "/registrations/sites",
            post(registrations::create_site).get(registrations::list_sites),
        )
        .route("/registrations/sites/{id}", patch(registrations::update_site))
        .route(
            "/registrations/holders",
            post(registrations::create_holder).get(registrations::list_holders),
        )
        .route("/registrations/holders/{id}", patch(registrations::update_holder));

    if let Some(secret) = &state.config.auth.jwt_secret {
        info!("Bearer authentication enabled for /v1");
        let jwt = Arc::new(JwtManager::new(secret));
        api_routes = api_routes.route_layer(middleware::from_fn_with_state(jwt, require_bearer));
    }

    let request_timeout = state.config.request_timeout();
    let max_concurrent = state.config.server.max_concurrent_requests;

    // Compose the app
    Router::new()
        .merge(health_routes)
        .nest("/v1", api_routes)
        .layer(middleware::from_fn(app_middleware::track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state)
}
