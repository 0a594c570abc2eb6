//! Registration flow interface and the response it produces.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{IamError, IamResult};
use crate::models::User;

/// Email verification policy of the deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailVerification {
    /// Users must confirm their address before they can log in.
    Mandatory,
    /// A confirmation mail is sent, login works without it.
    Optional,
    #[default]
    None,
}

impl EmailVerification {
    pub fn is_mandatory(&self) -> bool {
        matches!(self, EmailVerification::Mandatory)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmailVerification::Mandatory => "mandatory",
            EmailVerification::Optional => "optional",
            EmailVerification::None => "none",
        }
    }
}

impl fmt::Display for EmailVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailVerification {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mandatory" => Ok(EmailVerification::Mandatory),
            "optional" => Ok(EmailVerification::Optional),
            "none" => Ok(EmailVerification::None),
            other => Err(IamError::general_error(format!(
                "unknown email verification policy {other:?} (expected mandatory, optional or none)"
            ))
            .into_anyhow()),
        }
    }
}

/// Body of a registration request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Creates users. Email delivery and confirmation belong to the implementation.
#[async_trait]
pub trait RegistrationFlow: Send + Sync {
    async fn register(&self, request: RegisterRequest) -> IamResult<User>;
}

/// What the registration endpoint returns: the serialized user plus
/// `email_verification_required` and `key`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationResponse {
    #[serde(flatten)]
    pub user: Map<String, Value>,
    pub email_verification_required: bool,
    pub key: Option<String>,
}

impl RegistrationResponse {
    /// Verification required, no key.
    pub fn new(user: Map<String, Value>) -> Self {
        Self {
            user,
            email_verification_required: true,
            key: None,
        }
    }

    /// Unless verification is mandatory the caller is logged in right away
    /// and gets the key; `auth_key` is only awaited in that case.
    pub async fn for_policy<F, Fut>(user: Map<String, Value>, policy: EmailVerification, auth_key: F) -> IamResult<Self>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = IamResult<String>>,
    {
        let mut response = Self::new(user);
        if !policy.is_mandatory() {
            response.email_verification_required = false;
            response.key = Some(auth_key().await?);
        }
        Ok(response)
    }

    pub fn into_value(self) -> Value {
        let mut map = self.user;
        map.insert(
            "email_verification_required".to_string(),
            Value::Bool(self.email_verification_required),
        );
        map.insert(
            "key".to_string(),
            self.key.map(Value::String).unwrap_or(Value::Null),
        );
        Value::Object(map)
    }
}
