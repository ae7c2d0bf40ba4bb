use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::Method;
use axum::middleware::from_fn_with_state;
use dfort::domain::config::ApiConfig;
use dfort::domain::constants::{
    AUDIT_TAG, AUTH_TAG, BEARER_SCHEME, CREDENTIALS_TAG, DOCUMENTS_TAG, HEADER_AUTH_TAG,
    HEADER_IV, SYSTEM_TAG, VAULTS_TAG,
};
use dfort::kernel::server::{ApiState, RateLimiter, enforce_rate_limit};
use dfort::server::router::{not_found, system_router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DataFort API",
        description = "Zero-knowledge vault: the server stores ciphertext it cannot read."
    ),
    modifiers(&BearerAuth),
    tags(
        (name = SYSTEM_TAG, description = "Liveness"),
        (name = AUTH_TAG, description = "Registration, login and session tokens"),
        (name = VAULTS_TAG, description = "Vault containers"),
        (name = CREDENTIALS_TAG, description = "Sealed credential records"),
        (name = DOCUMENTS_TAG, description = "Sealed document blobs"),
        (name = AUDIT_TAG, description = "The caller's access trail"),
    )
)]
struct ApiDoc;

#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build(),
            ),
        );
    }
}

#[allow(unreachable_pub)]
pub fn init(state: ApiState) -> Router {
    let cfg = state.config.clone();

    let api = dfort::router(&cfg);
    let api = if cfg.rate_limit.enabled {
        api.layer(from_fn_with_state(RateLimiter::general(&cfg.rate_limit), enforce_rate_limit))
    } else {
        api
    };

    // Separate the OpenAPI routes and the API documentation object
    let (openapi_routes, api_doc) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", api)
        .merge(system_router())
        .with_state(state)
        .split_for_parts();

    Router::new()
        .merge(openapi_routes)
        .merge(Scalar::with_url("/docs", api_doc))
        .fallback(not_found)
        // Route-level limits (document upload) take precedence over this one.
        .layer(DefaultBodyLimit::max(cfg.server.json_limit_bytes))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(cors(&cfg))
        .layer(TraceLayer::new_for_http())
}

fn cors(cfg: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| warn!(origin = %origin, "Ignoring malformed CORS origin"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([
            HeaderName::from_static(HEADER_IV),
            HeaderName::from_static(HEADER_AUTH_TAG),
            header::CONTENT_DISPOSITION,
        ])
}
