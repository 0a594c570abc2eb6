use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use iam_core::errors::IamError;
use iam_core::{LazyContext, RequestContext};

use crate::middleware::CurrentUser;
use crate::IamAxumError;

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = IamAxumError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| IamError::not_authenticated("Authentication credentials were not provided.").into())
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned())
    }
}

/// The resolved context of the request.
///
/// Resolution happens here, on first use, with whoever `authenticate`
/// identified; later extractions in the same request reuse the result.
pub struct IamContext(pub Arc<RequestContext>);

impl<S> FromRequestParts<S> for IamContext
where
    S: Send + Sync,
{
    type Rejection = IamAxumError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let lazy = parts
            .extensions
            .get::<LazyContext>()
            .cloned()
            .ok_or_else(|| IamError::general_error("request context layer is not installed"))?;
        let user = parts.extensions.get::<CurrentUser>().map(|u| &u.0);

        let ctx = lazy.get(user).await?;
        Ok(IamContext(ctx))
    }
}
