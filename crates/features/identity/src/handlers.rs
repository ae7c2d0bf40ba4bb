use crate::Identity;
use crate::accounts::INVALID_LOGIN;
use crate::extractor::Authenticated;
use crate::models::*;
use crate::tokens::TokenError;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use dfort_derive::api_handler;
use dfort_domain::constants::AUTH_TAG;
use dfort_kernel::server::{ApiError, ApiJson, ApiResult, ApiState};
use tracing::instrument;

#[api_handler(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = CREATED, description = "Account created and signed in", body = AuthResponse),
        (status = BAD_REQUEST, description = "Malformed email or password"),
        (status = CONFLICT, description = "Email already registered"),
    ),
    tag = AUTH_TAG,
)]
#[instrument(skip_all)]
pub(crate) async fn register(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let identity = state.try_get_slice::<Identity>()?;
    let (user, tokens) = identity.register(&req.email, req.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            user: UserPayload::from_record(&user, identity.kdf_iterations),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }),
    ))
}

#[api_handler(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = OK, description = "Signed in", body = AuthResponse),
        (status = BAD_REQUEST, description = "Malformed body"),
        (status = UNAUTHORIZED, description = "Invalid email or password"),
    ),
    tag = AUTH_TAG,
)]
#[instrument(skip_all)]
pub(crate) async fn login(
    State(state): State<ApiState>,
    payload: Result<ApiJson<LoginRequest>, ApiError>,
) -> ApiResult<Json<AuthResponse>> {
    let ApiJson(req) = payload.map_err(|_| ApiError::validation(INVALID_LOGIN))?;
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation(INVALID_LOGIN));
    }

    let identity = state.try_get_slice::<Identity>()?;
    let (user, tokens) = identity.login(&req.email, req.password).await?;

    Ok(Json(AuthResponse {
        success: true,
        user: UserPayload::from_record(&user, identity.kdf_iterations),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

#[api_handler(
    post,
    path = "/refresh",
    request_body = RefreshRequest,
    responses(
        (status = OK, description = "A brand new token pair", body = TokenResponse),
        (status = BAD_REQUEST, description = "No refresh token in the body"),
        (status = UNAUTHORIZED, description = "Invalid or expired refresh token"),
    ),
    tag = AUTH_TAG,
)]
#[instrument(skip_all)]
pub(crate) async fn refresh(
    State(state): State<ApiState>,
    payload: Result<ApiJson<RefreshRequest>, ApiError>,
) -> ApiResult<Json<TokenResponse>> {
    let token = payload
        .ok()
        .and_then(|ApiJson(req)| req.token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::validation("Refresh token required."))?;

    let identity = state.try_get_slice::<Identity>()?;
    let tokens = identity.tokens.refresh(&token).await.map_err(|err| match err {
        err if err.is_subject_gone() => ApiError::auth("User not found."),
        TokenError::Expired { .. } | TokenError::Invalid { .. } => {
            ApiError::auth("Invalid or expired refresh token.")
        },
        TokenError::Internal { message, context } => ApiError::Internal { message, context },
    })?;

    Ok(Json(TokenResponse {
        success: true,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// Tokens are stateless; the client discards them.
#[api_handler(
    post,
    path = "/logout",
    responses((status = OK, description = "Acknowledged", body = MessageResponse)),
    security(("bearer" = [])),
    tag = AUTH_TAG,
)]
pub(crate) async fn logout(_user: Authenticated) -> Json<MessageResponse> {
    Json(MessageResponse { success: true, message: "Logged out successfully.".to_owned() })
}

#[api_handler(
    get,
    path = "/me",
    responses(
        (status = OK, description = "Current profile", body = ProfileResponse),
        (status = UNAUTHORIZED, description = "Missing or rejected token"),
    ),
    security(("bearer" = [])),
    tag = AUTH_TAG,
)]
pub(crate) async fn me(
    State(state): State<ApiState>,
    user: Authenticated,
) -> ApiResult<Json<ProfileResponse>> {
    let identity = state.try_get_slice::<Identity>()?;
    let record =
        identity.profile(&user.user_id).ok_or_else(|| ApiError::auth("User no longer exists."))?;

    Ok(Json(ProfileResponse {
        success: true,
        user: UserPayload::from_record(&record, identity.kdf_iterations),
    }))
}
