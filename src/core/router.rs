use axum::{http::StatusCode, middleware::from_fn, routing::get, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::{AppConfig, SwaggerConfig};
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::auth::{routes as auth_routes, AuthService, TokenService};
use crate::features::files::{routes as files_routes, FileService};
use crate::features::users::{routes as users_routes, ProfileService};
use crate::shared::constants::API_PREFIX;

/// Services the HTTP layer dispatches to
pub struct AppServices {
    pub token_service: Arc<TokenService>,
    pub auth_service: Arc<AuthService>,
    pub profile_service: Arc<ProfileService>,
    pub file_service: Arc<FileService>,
}

async fn ping() -> &'static str {
    "pong"
}

/// Assemble the API under `/api/v1` with the shared middleware stack
pub fn build_router(services: AppServices, config: &AppConfig) -> Router {
    // Protected routes (require a valid access token)
    let protected_routes = Router::new()
        .merge(users_routes::routes(services.profile_service))
        .merge(files_routes::routes(services.file_service))
        .route_layer(axum::middleware::from_fn_with_state(
            services.token_service,
            middleware::auth_middleware,
        ));

    let public_routes = Router::new().merge(auth_routes::public_routes(services.auth_service));

    let api = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .route("/ping", get(ping))
        .nest(API_PREFIX, api)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(middleware::cors_layer(config.cors_allowed_origins.clone()))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}

/// Swagger UI and the OpenAPI document, behind basic auth when credentials are set
pub fn swagger_routes(config: &SwaggerConfig) -> Router {
    let swagger_modifier = SwaggerInfoModifier {
        title: config.title.clone(),
        version: config.version.clone(),
        description: config.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let ui = Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    if let Some(credentials) = config.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        ui.layer(from_fn(middleware::basic_auth_middleware(Arc::new(
            credentials,
        ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        ui
    }
}
