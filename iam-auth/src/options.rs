// Signer options and configuration.

use std::time::Duration;

use iam_core::ConfigSnapshot;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Query parameter carrying the signature by default.
pub const DEFAULT_QUERY_PARAM: &str = "sign";

/// How long a signed URL stays valid by default.
pub const DEFAULT_SIGNATURE_TTL: Duration = Duration::from_secs(30);

/// Longest lifetime a signed URL may be configured with.
pub const MAX_SIGNATURE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// HMAC algorithms accepted for signed URLs
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256
    #[default]
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl std::str::FromStr for JwtAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            other => Err(AuthError::InvalidConfig(format!("unsupported algorithm {other}"))),
        }
    }
}

/// Configuration of the URL signer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignerOptions {
    /// Signing algorithm
    pub algorithm: JwtAlgorithm,
    /// HMAC secret
    pub secret: Option<String>,
    /// Token issuer (iss claim)
    pub issuer: String,
    /// Token audience (aud claim)
    pub audience: Vec<String>,
    /// Validity of a signature
    #[serde(with = "humantime_serde")]
    pub expires_in: Duration,
    /// Query parameter the signature is appended as
    pub query_param: String,
}

impl Default for SignerOptions {
    fn default() -> Self {
        Self {
            algorithm: JwtAlgorithm::default(),
            secret: None,
            issuer: "iam".to_string(),
            audience: vec!["iam-signed-url".to_string()],
            expires_in: DEFAULT_SIGNATURE_TTL,
            query_param: DEFAULT_QUERY_PARAM.to_string(),
        }
    }
}

impl SignerOptions {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            ..Self::default()
        }
    }

    /// Reads `signing.*` keys, falling back to defaults.
    pub fn from_snapshot(cfg: &ConfigSnapshot) -> Result<Self, AuthError> {
        let mut opts = Self::default();

        if let Some(secret) = cfg.get_string("signing.secret") {
            opts.secret = Some(secret);
        }
        if let Some(alg) = cfg.get("signing.algorithm") {
            opts.algorithm = alg.parse()?;
        }
        if let Some(issuer) = cfg.get_string("signing.issuer") {
            opts.issuer = issuer;
        }
        if let Some(audience) = cfg.get_list("signing.audience") {
            opts.audience = audience;
        }
        if let Some(raw) = cfg.get("signing.expires_in_secs") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| AuthError::InvalidConfig(format!("signing.expires_in_secs: {e}")))?;
            opts.expires_in = Duration::from_secs(secs);
        }
        if let Some(param) = cfg.get_string("signing.query_param") {
            opts.query_param = param;
        }

        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        match &self.secret {
            None => return Err(AuthError::MissingSecret),
            Some(s) if s.len() < 16 => {
                return Err(AuthError::InvalidConfig(
                    "signing secret must be at least 16 characters".to_string(),
                ))
            }
            Some(_) => {}
        }

        if self.issuer.is_empty() {
            return Err(AuthError::InvalidConfig("issuer cannot be empty".to_string()));
        }

        if self.audience.is_empty() {
            return Err(AuthError::InvalidConfig("audience cannot be empty".to_string()));
        }

        if self.expires_in.as_secs() == 0 {
            return Err(AuthError::InvalidConfig("signature lifetime must be greater than 0".to_string()));
        }

        if self.expires_in > MAX_SIGNATURE_TTL {
            return Err(AuthError::InvalidConfig(format!(
                "signature lifetime must not exceed {}s",
                MAX_SIGNATURE_TTL.as_secs()
            )));
        }

        if self.query_param.is_empty()
            || !self.query_param.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(AuthError::InvalidConfig(
                "query parameter must contain only alphanumeric characters and underscores".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iam_core::ConfigStore;

    #[test]
    fn secret_is_required() {
        assert!(matches!(SignerOptions::default().validate(), Err(AuthError::MissingSecret)));
        assert!(SignerOptions::with_secret("short").validate().is_err());
        assert!(SignerOptions::with_secret("a-long-enough-secret").validate().is_ok());
    }

    #[test]
    fn reads_signing_keys() {
        let mut cfg = ConfigStore::new();
        cfg.set("signing.secret", "a-long-enough-secret");
        cfg.set("signing.expires_in_secs", "45");
        cfg.set("signing.algorithm", "hs512");

        let opts = SignerOptions::from_snapshot(&cfg.snapshot()).unwrap();
        assert_eq!(opts.expires_in, Duration::from_secs(45));
        assert_eq!(opts.algorithm, JwtAlgorithm::HS512);
        assert_eq!(opts.query_param, "sign");
    }

    #[test]
    fn lifetime_is_bounded() {
        let mut opts = SignerOptions::with_secret("a-long-enough-secret");
        opts.expires_in = MAX_SIGNATURE_TTL;
        assert!(opts.validate().is_ok());

        opts.expires_in = Duration::from_secs(u64::MAX);
        assert!(matches!(opts.validate(), Err(AuthError::InvalidConfig(_))));

        let mut cfg = ConfigStore::new();
        cfg.set("signing.secret", "a-long-enough-secret");
        cfg.set("signing.expires_in_secs", "18446744073709551615");
        assert!(SignerOptions::from_snapshot(&cfg.snapshot()).is_err());
    }

    #[test]
    fn defaults_to_thirty_seconds() {
        assert_eq!(SignerOptions::default().expires_in.as_secs(), 30);
    }
}
