use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use iam_core::errors::IamError;
use iam_core::{RegisterRequest, RegistrationResponse, RequestContext};
use serde_json::Value;
use tracing::info;

use crate::error::map_json_rejection;
use crate::extract::IamContext;
use crate::middleware::CurrentUser;
use crate::params::resolve_url;
use crate::{IamAxumError, IamState};

/// `/signing`, `/register` and `/context`, meant to be nested under `/auth`.
pub fn auth_router() -> Router<IamState> {
    Router::new()
        .route("/signing", post(sign_url))
        .route("/register", post(register))
        .route("/context", get(context))
}

fn url_param(body: Result<Json<Value>, JsonRejection>) -> Result<Option<String>, IamAxumError> {
    let body = match body {
        Ok(Json(v)) => v,
        // No JSON body at all reads as "no url".
        Err(JsonRejection::MissingJsonContentType(_)) => return Ok(None),
        Err(other) => return Err(map_json_rejection(other)),
    };

    Ok(body
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string))
}

pub async fn sign_url(
    State(state): State<IamState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<String>, IamAxumError> {
    let url = url_param(body)?.ok_or_else(|| IamError::validation("Please provide `url` parameter"))?;

    let absolute =
        resolve_url(state.settings.public_url.as_deref(), &headers, &url).map_err(iam_auth::AuthError::into_anyhow)?;
    let signed = state.signer.sign_url(&user, absolute)?;

    info!(user_id = user.id, ttl_secs = state.signer.ttl().as_secs(), "iam.url.signed");
    Ok(Json(signed.to_string()))
}

pub async fn register(
    State(state): State<IamState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), IamAxumError> {
    let Json(request) = body.map_err(map_json_rejection)?;

    let user = state.registration.register(request).await?;
    let serialized = match serde_json::to_value(&user) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(IamError::general_error("user did not serialize to an object").into()),
        Err(e) => return Err(anyhow::Error::from(e).into()),
    };

    let policy = state.settings.email_verification;
    let tokens = state.tokens.clone();
    let user_id = user.id;
    let response =
        RegistrationResponse::for_policy(serialized, policy, || async move { tokens.get_or_create(user_id).await })
            .await?;

    info!(user_id, policy = %policy, "iam.registered");
    Ok((StatusCode::CREATED, Json(response.into_value())))
}

pub async fn context(IamContext(ctx): IamContext) -> Json<RequestContext> {
    Json(ctx.as_ref().clone())
}
