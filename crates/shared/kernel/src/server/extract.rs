use super::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

/// `axum::Json` with rejections rendered through [`ApiError`], so malformed bodies get the same
/// `{ success: false, message }` envelope as every other failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(&rejection)),
        }
    }
}

fn rejection_to_error(rejection: &JsonRejection) -> ApiError {
    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body.",
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON.",
        JsonRejection::BytesRejection(_) => "Request body could not be read.",
        _ => "Request body has an invalid shape.",
    };
    ApiError::Validation { message: message.into(), context: Some(rejection.body_text().into()) }
}
