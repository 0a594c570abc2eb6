use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use iam_core::errors::IamError;
use serde_json::json;

#[derive(Debug)]
pub struct IamAxumError(pub anyhow::Error);

impl From<anyhow::Error> for IamAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<IamError> for IamAxumError {
    fn from(e: IamError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for IamAxumError {
    fn into_response(self) -> Response {
        // An IamError anywhere in the chain keeps its kind and payload.
        if let Some(iam) = IamError::from_anyhow(&self.0) {
            let safe = iam.sanitize_for_client();
            if !safe.kind.is_client_error() {
                tracing::error!(error = %self.0, "iam.request.failed");
            }
            let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, Json(safe.to_json())).into_response();
        }

        tracing::error!(error = %self.0, "iam.request.failed");
        let safe = IamError::general_error(self.0.to_string());
        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}

pub(crate) fn map_json_rejection(rejection: JsonRejection) -> IamAxumError {
    IamError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.to_string()]}))
        .into()
}
