//! Request-time guard denying access to locked-out identifiers.
//!
//! The guard extracts the configured login field from the request (query
//! string, JSON body, or form body), checks the lockout state, and answers
//! with a 429 when locked. It is a defense-in-depth layer, not the sole
//! authority: a request without an identifier passes, and any internal error
//! during the check is treated as "not locked".

use std::collections::HashMap;

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::header::CONTENT_TYPE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use bastille::RepositoryProvider;

use crate::error::LockoutHttpError;
use crate::routes::LockoutState;

/// Largest request body the guard will buffer while looking for the login
/// field. Bigger bodies skip inspection rather than blocking the request.
const BODY_LIMIT: usize = 64 * 1024;

/// Deny the request with a 429 when its login identifier is locked out.
///
/// Wire it around login-shaped routes:
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/login", post(login_handler))
///     .layer(axum::middleware::from_fn_with_state(state, access_guard::<MyProvider>));
/// ```
pub async fn access_guard<R>(
    State(state): State<LockoutState<R>>,
    request: Request,
    next: Next,
) -> Response
where
    R: RepositoryProvider,
{
    let login_field = state.bastille.config().login_field.clone();
    let (request, identifier) = extract_identifier(request, &login_field).await;

    let Some(identifier) = identifier else {
        return next.run(request).await;
    };

    if state.bastille.is_identifier_locked_out(&identifier).await {
        let message = state.bastille.config().messages.account_locked.clone();
        return LockoutHttpError::Locked(message).into_response();
    }

    next.run(request).await
}

/// Pull the login-field value out of the request, rebuilding the request so
/// downstream handlers still see the body.
///
/// Extraction is best-effort: unparseable queries or bodies, oversized
/// bodies, and unknown content types all yield `None` rather than an error.
async fn extract_identifier(request: Request, login_field: &str) -> (Request, Option<String>) {
    if let Some(identifier) = identifier_from_query(&request, login_field) {
        return (request, Some(identifier));
    }

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if !content_type.starts_with("application/json")
        && !content_type.starts_with("application/x-www-form-urlencoded")
    {
        return (request, None);
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer request body for lockout check");
            return (Request::from_parts(parts, Body::empty()), None);
        }
    };

    let identifier = if content_type.starts_with("application/json") {
        serde_json::from_slice::<serde_json::Value>(&bytes)
            .ok()
            .and_then(|value| {
                value
                    .get(login_field)
                    .and_then(|field| field.as_str())
                    .map(|field| field.to_string())
            })
    } else {
        serde_urlencoded::from_bytes::<HashMap<String, String>>(&bytes)
            .ok()
            .and_then(|params| params.get(login_field).cloned())
    };

    let request = Request::from_parts(parts, Body::from(bytes));
    (request, identifier.filter(|value| !value.is_empty()))
}

fn identifier_from_query(request: &Request, login_field: &str) -> Option<String> {
    let query = request.uri().query()?;
    let params: HashMap<String, String> = serde_urlencoded::from_str(query).ok()?;
    params
        .get(login_field)
        .filter(|value| !value.is_empty())
        .cloned()
}
