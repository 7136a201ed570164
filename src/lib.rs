use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod repository;
pub mod security;

// Routers segregated by access level (public, authenticated, per role).
pub mod routes;
use routes::{admin, authenticated, public, student, teacher};

// --- Public Re-exports ---

pub use auth::{CredentialVerifier, LoginService, Principal, RoleGate, TokenIssuer, TokenValidator};
pub use config::AppConfig;
pub use error::ApiError;
pub use notifier::{MockNotifier, NotificationDispatcher, NotifierState};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generated OpenAPI document, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::health, handlers::get_me, handlers::list_students,
        handlers::get_student_profile, handlers::list_users, handlers::get_user
    ),
    components(
        schemas(
            models::Role, models::Profile, models::LoginRequest, models::LoginResponse,
            models::ErrorBody, auth::Principal,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "campus-portal", description = "University portal authentication and directory API")
    )
)]
struct ApiDoc;

struct BearerAuth;

impl utoipa::Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// Implements the **Unified State Pattern**: one cloneable, immutable container for every
/// service a request may need. The signing secret only lives inside the token issuer
/// and validator built here.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: credential lookups and the user directory.
    pub repo: RepositoryState,
    /// Login orchestration (verifier, issuer, notification dispatcher).
    pub login: LoginService,
    /// Token validation for the `require_auth` layer.
    pub validator: TokenValidator,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Wires the authentication services from configuration. `notifications` must
    /// already be running (see [`NotificationDispatcher::spawn`]).
    pub fn new(config: AppConfig, repo: RepositoryState, notifications: NotificationDispatcher) -> Self {
        let secret = config.jwt_secret.as_bytes();
        let issuer = TokenIssuer::new(secret, config.token_ttl_secs);
        let validator = TokenValidator::new(secret);
        let verifier = CredentialVerifier::new(repo.clone(), config.db_timeout);

        Self {
            login: LoginService::new(verifier, issuer, notifications),
            repo,
            validator,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenValidator {
    fn from_ref(app_state: &AppState) -> TokenValidator {
        app_state.validator.clone()
    }
}

impl FromRef<AppState> for LoginService {
    fn from_ref(app_state: &AppState) -> LoginService {
        app_state.login.clone()
    }
}

/// create_router
///
/// Assembles the routing structure. Everything except the public router is wrapped in
/// `require_auth`; that layer is added last, so it runs before any role gate attached
/// by the inner routers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let protected = Router::new()
        .merge(authenticated::authenticated_routes())
        .nest("/admin", admin::admin_routes())
        .nest("/teacher", teacher::teacher_routes())
        .nest("/student", student::student_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protected)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span with method, URI and the generated request id, so every
/// log line of one request is correlated. The Authorization header is never recorded.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
