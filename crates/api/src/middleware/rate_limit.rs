//! Per-client rate limiting for state-changing routes.
//!
//! Provides a `RateLimitedClient` Axum extractor that identifies the caller
//! and records an attempt against the shared `RateLimiter`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;

use sdai_common::error::AppError;

use crate::state::AppState;

/// Header carrying the caller's identifier, usually the wallet address.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Identifier used when the caller does not send one.
const ANONYMOUS_CLIENT: &str = "anonymous";

/// A caller that passed the rate limiter.
///
/// Use as an Axum extractor on routes that mutate state:
/// ```ignore
/// async fn handler(client: RateLimitedClient) -> impl IntoResponse {
///     // client.id identifies the caller
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitedClient {
    pub id: String,
}

impl FromRequestParts<AppState> for RateLimitedClient {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let limiter = state.limiter.clone();

        let id = parts
            .headers
            .get(CLIENT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(ANONYMOUS_CLIENT)
            .to_string();

        async move {
            let allowed = limiter.lock().await.is_allowed(&id, Utc::now());
            if !allowed {
                tracing::warn!(client = %id, "Rate limit exceeded");
                return Err(AppError::RateLimited(
                    "Too many attempts. Please wait a minute and try again.".to_string(),
                ));
            }
            Ok(RateLimitedClient { id })
        }
    }
}
