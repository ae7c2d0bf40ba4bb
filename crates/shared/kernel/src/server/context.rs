use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use std::convert::Infallible;
use std::net::SocketAddr;

/// Who is on the other end of a request, as far as the transport can tell. Recorded in the audit
/// trail and used as the rate-limit key; never used for authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequesterContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequesterContext {
    #[must_use]
    pub fn from_parts(parts: &Parts) -> Self {
        Self::from_extensions_and_headers(&parts.extensions, &parts.headers)
    }

    pub(crate) fn from_extensions_and_headers(
        extensions: &axum::http::Extensions,
        headers: &axum::http::HeaderMap,
    ) -> Self {
        let ip_address = extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);

        Self { ip_address, user_agent }
    }
}

impl<S> FromRequestParts<S> for RequesterContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
