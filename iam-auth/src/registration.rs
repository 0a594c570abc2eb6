// Local (username/password) registration.

use std::sync::Arc;

use async_trait::async_trait;
use bcrypt::{hash, DEFAULT_COST};
use iam_core::errors::IamError;
use iam_core::{IamResult, NewUser, RegisterRequest, RegistrationFlow, User, UserStore};
use serde_json::{Map, Value};
use tracing::info;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::AuthError;

#[derive(Clone, Debug)]
pub struct LocalRegistrationOptions {
    /// Groups every new user starts in.
    pub default_groups: Vec<String>,
    pub hash_cost: u32,
}

impl Default for LocalRegistrationOptions {
    fn default() -> Self {
        Self {
            default_groups: vec!["user".to_string()],
            hash_cost: DEFAULT_COST,
        }
    }
}

pub struct LocalRegistration {
    users: Arc<dyn UserStore>,
    options: LocalRegistrationOptions,
}

impl LocalRegistration {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            users,
            options: LocalRegistrationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LocalRegistrationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        hash(password, self.options.hash_cost).map_err(|e| AuthError::Hash(e.to_string()))
    }

    async fn field_errors(&self, req: &RegisterRequest) -> IamResult<Map<String, Value>> {
        let form = RegistrationForm::from(req);
        let mut errors = Map::new();
        if let Err(errs) = form.validate() {
            push_validation_errors(&mut errors, "", &errs);
        }

        if !form.username.is_empty() && self.users.find_by_username(&form.username).await?.is_some() {
            push_field(&mut errors, "username", "A user with that username already exists.".to_string());
        }

        Ok(errors)
    }
}

#[derive(Debug, Validate)]
struct RegistrationForm {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    username: String,

    #[validate(email(message = "Enter a valid email address."))]
    email: String,

    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    password1: String,

    #[validate(must_match(other = "password1", message = "The two password fields didn't match."))]
    password2: String,
}

impl From<&RegisterRequest> for RegistrationForm {
    fn from(req: &RegisterRequest) -> Self {
        Self {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_string(),
            password1: req.password1.clone(),
            password2: req.password2.clone(),
        }
    }
}

fn push_field(out: &mut Map<String, Value>, key: &str, msg: String) {
    match out.entry(key.to_string()).or_insert_with(|| Value::Array(Vec::new())) {
        Value::Array(items) => items.push(Value::String(msg)),
        other => *other = Value::Array(vec![Value::String(msg)]),
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn push_validation_errors(out: &mut Map<String, Value>, prefix: &str, errs: &ValidationErrors) {
    for (field, kind) in errs.errors() {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let key = join_path(prefix, field);
                for e in field_errors {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    push_field(out, &key, msg);
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                push_validation_errors(out, &join_path(prefix, field), nested.as_ref());
            }
            ValidationErrorsKind::List(items) => {
                let base = join_path(prefix, field);
                for (idx, nested) in items {
                    push_validation_errors(out, &format!("{base}[{idx}]"), nested.as_ref());
                }
            }
        }
    }
}

#[async_trait]
impl RegistrationFlow for LocalRegistration {
    async fn register(&self, request: RegisterRequest) -> IamResult<User> {
        let errors = self.field_errors(&request).await?;
        if !errors.is_empty() {
            return Err(IamError::bad_request("Invalid registration data")
                .with_errors(Value::Object(errors))
                .into_anyhow());
        }

        let password_hash = self.hash_password(&request.password1).map_err(AuthError::into_anyhow)?;

        let user = self
            .users
            .create(NewUser {
                username: request.username.trim().to_string(),
                email: request.email.trim().to_lowercase(),
                first_name: request.first_name,
                last_name: request.last_name,
                password_hash,
                groups: self.options.default_groups.clone(),
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "iam.register");
        Ok(user)
    }
}
