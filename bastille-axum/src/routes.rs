//! The two capability-gated lockout endpoints.
//!
//! Both endpoints are unauthenticated; possession of a valid, unexpired
//! signed URL is the only access control. Signature validation runs before
//! any engine work, and every outcome past that point is a redirect to the
//! configured route with a `status` or `error` flash parameter — an
//! unresolved identifier or an internal failure never leaks detail and never
//! surfaces as a raw 500.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use bastille::{
    Bastille, CapabilityAction, NewLock, RepositoryProvider, RequestContext, UnlockUpdate,
};

use crate::error::LockoutHttpError;
use crate::types::CapabilityParams;

/// Shared state for the lockout routes and middleware.
pub struct LockoutState<R: RepositoryProvider> {
    pub bastille: Arc<Bastille<R>>,
}

impl<R: RepositoryProvider> Clone for LockoutState<R> {
    fn clone(&self) -> Self {
        Self {
            bastille: self.bastille.clone(),
        }
    }
}

/// Build the router exposing `GET /lockout/lock` and `GET /lockout/unlock`.
pub fn create_router<R>(bastille: Arc<Bastille<R>>) -> Router
where
    R: RepositoryProvider,
{
    let state = LockoutState { bastille };

    Router::new()
        .route("/lockout/lock", get(lock_handler::<R>))
        .route("/lockout/unlock", get(unlock_handler::<R>))
        .with_state(state)
}

async fn lock_handler<R>(
    State(state): State<LockoutState<R>>,
    Query(params): Query<CapabilityParams>,
) -> Response
where
    R: RepositoryProvider,
{
    let claims = params.into_claims();
    if state
        .bastille
        .gateway()
        .validate(CapabilityAction::Lock, &claims)
        .is_err()
    {
        return LockoutHttpError::InvalidCapability.into_response();
    }

    let route = state.bastille.config().unlock_redirect_route.clone();
    let messages = state.bastille.config().messages.clone();

    match state.bastille.resolve(&claims.identifier).await {
        Ok(Some(subject)) => {
            match state.bastille.lock(&subject, NewLock::default()).await {
                Some(_) => {
                    state
                        .bastille
                        .send_lockout_notification(&claims.identifier)
                        .await;
                    redirect_with_status(&route, &messages.lock_confirmed)
                }
                None => redirect_with_error(&route, &messages.general_error),
            }
        }
        Ok(None) => redirect_with_error(&route, &messages.account_not_found),
        Err(e) => {
            tracing::warn!(error = %e, "Lock action failed to resolve identifier");
            redirect_with_error(&route, &messages.general_error)
        }
    }
    .into_response()
}

async fn unlock_handler<R>(
    State(state): State<LockoutState<R>>,
    headers: HeaderMap,
    Query(params): Query<CapabilityParams>,
) -> Response
where
    R: RepositoryProvider,
{
    let claims = params.into_claims();
    if state
        .bastille
        .gateway()
        .validate(CapabilityAction::Unlock, &claims)
        .is_err()
    {
        return LockoutHttpError::InvalidCapability.into_response();
    }

    let route = state.bastille.config().unlock_redirect_route.clone();
    let messages = state.bastille.config().messages.clone();
    let context = request_context(&headers);

    match state.bastille.resolve(&claims.identifier).await {
        Ok(Some(subject)) => {
            // Best-effort: an already-released lock still counts as unlocked,
            // and the throttle counter is always cleared.
            state
                .bastille
                .unlock(&subject, UnlockUpdate::default(), &context)
                .await;
            state.bastille.clear_attempts(&claims.identifier).await;
            redirect_with_status(&route, &messages.account_unlocked)
        }
        Ok(None) => redirect_with_error(&route, &messages.account_not_found),
        Err(e) => {
            tracing::warn!(error = %e, "Unlock action failed to resolve identifier");
            redirect_with_error(&route, &messages.general_error)
        }
    }
    .into_response()
}

fn redirect_with_status(route: &str, message: &str) -> Redirect {
    redirect_with("status", route, message)
}

fn redirect_with_error(route: &str, message: &str) -> Redirect {
    redirect_with("error", route, message)
}

fn redirect_with(key: &str, route: &str, message: &str) -> Redirect {
    let query = serde_urlencoded::to_string([(key, message)]).unwrap_or_default();
    Redirect::to(&format!("{route}?{query}"))
}

/// Request metadata forwarded into unlock events and the audit trail.
pub(crate) fn request_context(headers: &HeaderMap) -> RequestContext {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string());

    let user_agent = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    RequestContext::new(ip_address, user_agent)
}
