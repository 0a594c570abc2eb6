//! Authentication and request-context middleware.
//!
//! `authenticate` puts a [`CurrentUser`] into the request extensions when a
//! credential is present and valid. `attach_context` puts a [`LazyContext`]
//! there; nothing is looked up until a handler asks for it.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use iam_auth::AuthError;
use iam_core::errors::IamError;
use iam_core::{IamResult, LazyContext, User};
use tracing::debug;

use crate::params::{org_inputs, query_map, request_url};
use crate::{IamAxumError, IamState};

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

pub async fn authenticate(
    State(state): State<IamState>,
    mut req: Request,
    next: Next,
) -> Result<Response, IamAxumError> {
    if let Some(user) = identify(&state, req.headers(), req.uri()).await? {
        req.extensions_mut().insert(CurrentUser(user));
    }
    Ok(next.run(req).await)
}

pub async fn attach_context(State(state): State<IamState>, mut req: Request, next: Next) -> Response {
    let inputs = org_inputs(req.headers(), req.uri());
    req.extensions_mut()
        .insert(LazyContext::new(state.resolver.clone(), inputs));
    next.run(req).await
}

/// `Ok(None)` when the request carries no credential at all.
pub async fn identify(state: &IamState, headers: &HeaderMap, uri: &Uri) -> IamResult<Option<User>> {
    if let Some(key) = state.token_extractor.extract(headers) {
        let user_id = state
            .tokens
            .find_user(&key)
            .await?
            .ok_or_else(|| IamError::not_authenticated("Invalid token.").into_anyhow())?;
        let user = load_user(state, user_id).await?;
        debug!(user_id = user.id, "iam.authenticated.token");
        return Ok(Some(user));
    }

    let Some(token) = query_map(uri).remove(state.signer.query_param()) else {
        return Ok(None);
    };

    let url = request_url(state.settings.public_url.as_deref(), headers, uri).map_err(AuthError::into_anyhow)?;
    let claims = state.signer.unsign(&token, url.as_str())?;
    let user_id = claims.user_id().map_err(AuthError::into_anyhow)?;
    let user = load_user(state, user_id).await?;
    debug!(user_id = user.id, "iam.authenticated.signed_url");
    Ok(Some(user))
}

async fn load_user(state: &IamState, user_id: iam_core::UserId) -> IamResult<User> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| IamError::not_authenticated("User inactive or deleted.").into_anyhow())
}
