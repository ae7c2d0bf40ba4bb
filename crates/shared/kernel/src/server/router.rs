use super::{ApiError, health};
use axum::http::Uri;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub fn system_router<S>() -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
{
    OpenApiRouter::<S>::new().routes(routes!(health::health_handler))
}

/// Fallback for every path no router claimed.
#[allow(clippy::unused_async)]
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        message: "Route not found".into(),
        context: Some(uri.path().to_owned().into()),
    }
}
