//! # Errors
//!
//! IAM failures are structured values that travel inside `anyhow::Error`,
//! so stores, the resolver and HTTP handlers can all use `?` and the
//! transport layer recovers the kind at the edge.
//!
//! Every failure raised here is a caller defect (contradictory selectors,
//! unknown organization, missing field). Nothing is retried.

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::Value;

/// Result type used across the IAM crates.
pub type IamResult<T> = std::result::Result<T, AnyError>;

/// Error kinds with their HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    ValidationError,  // 400
    NotAuthenticated, // 401
    Conflict,         // 409
    GeneralError,     // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::ValidationError => 400,
            ErrorKind::NotAuthenticated => 401,
            ErrorKind::Conflict => 409,
            ErrorKind::GeneralError => 500,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::GeneralError => "GeneralError",
        }
    }

    /// Kebab-cased class name used in JSON payloads.
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::ValidationError => "validation-error",
            ErrorKind::NotAuthenticated => "not-authenticated",
            ErrorKind::Conflict => "conflict",
            ErrorKind::GeneralError => "general-error",
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

/// A structured IAM error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct IamError {
    pub kind: ErrorKind,
    pub message: String,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl IamError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: None,
            source: None,
        }
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Finds an `IamError` anywhere in the chain of an `anyhow::Error`,
    /// including behind `.context(...)` layers.
    pub fn from_anyhow(err: &AnyError) -> Option<&IamError> {
        err.chain().find_map(|e| e.downcast_ref::<IamError>())
    }

    /// Turn any error into an `IamError`, wrapping foreign errors as GeneralError.
    pub fn normalize(err: AnyError) -> IamError {
        match err.downcast::<IamError>() {
            Ok(iam) => iam,
            Err(other) => IamError::new(ErrorKind::GeneralError, other.to_string()).with_source(other),
        }
    }

    /// Copy without the inner `source`; safe to hand to clients and cheap to
    /// hand out repeatedly from a memoized failure.
    pub fn sanitize_for_client(&self) -> IamError {
        IamError {
            kind: self.kind,
            message: self.message.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    pub fn to_json(&self) -> Value {
        use serde_json::json;

        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
}

impl fmt::Display for IamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for IamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
