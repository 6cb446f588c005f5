use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    Json,
};
use log::error;
use std::sync::Arc;

use crate::api::handlers::ErrorResponse;
use crate::model::Id;
use crate::store::traits::Store;

/// The admin behind a request, resolved from its `Authorization: Bearer` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub user_id: Id,
    pub token: String,
}

#[async_trait]
impl<S> FromRequestParts<Arc<S>> for AdminSession
where
    S: Store + 'static,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, store: &Arc<S>) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_bearer_token(&parts.headers) else {
            return Err(ErrorResponse::reply(StatusCode::UNAUTHORIZED, "Unauthorized"));
        };

        match store.session_user(&token).await {
            Ok(Some(user_id)) => Ok(AdminSession { user_id, token }),
            Ok(None) => Err(ErrorResponse::reply(StatusCode::UNAUTHORIZED, "Unauthorized")),
            Err(e) => {
                error!("session lookup failed: {e:#}");
                Err(ErrorResponse::reply(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                ))
            }
        }
    }
}

/// Token of a `Bearer` authorization header; blank tokens count as absent
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}
