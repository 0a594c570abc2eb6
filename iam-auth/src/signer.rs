// URL signer.
//
// A signature is a JWT bound to one user and one absolute URL. It carries
// its own expiry; nothing is stored server side.

use std::time::Duration;

use chrono::Utc;
use iam_core::{IamResult, User, UserId};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::AuthError;
use crate::options::{JwtAlgorithm, SignerOptions};
use crate::urls;

#[cfg(not(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto")))]
compile_error!("enable one of the `jwt-aws-lc-rs` or `jwt-rust-crypto` features of iam-auth");

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedClaims {
    pub sub: String,
    pub username: String,
    pub url: String,
    pub iss: String,
    pub aud: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl SignedClaims {
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse()
            .map_err(|_| AuthError::InvalidSignature("subject is not a user id".to_string()))
    }
}

/// Signs URLs on behalf of a user and checks signatures.
pub trait Signer: Send + Sync {
    /// Name of the query parameter the signature travels in.
    fn query_param(&self) -> &str;

    fn ttl(&self) -> Duration;

    fn sign(&self, user: &User, url: &str) -> IamResult<String>;

    /// Checks signature and expiry only.
    fn verify(&self, token: &str) -> IamResult<SignedClaims>;

    /// Like [`Signer::verify`], and also requires the token to have been
    /// issued for `url` (compared with the signature parameter removed).
    fn unsign(&self, token: &str, url: &str) -> IamResult<SignedClaims> {
        let claims = self.verify(token)?;
        let issued_for = urls::canonical(&claims.url, self.query_param()).map_err(AuthError::into_anyhow)?;
        let presented = urls::canonical(url, self.query_param()).map_err(AuthError::into_anyhow)?;
        if issued_for != presented {
            return Err(AuthError::UrlMismatch(presented.to_string()).into_anyhow());
        }
        Ok(claims)
    }

    /// Sign `url` and append the signature as a query parameter.
    fn sign_url(&self, user: &User, url: Url) -> IamResult<Url> {
        let token = self.sign(user, url.as_str())?;
        Ok(urls::append_param(url, self.query_param(), &token))
    }
}

pub struct JwtSigner {
    options: SignerOptions,
    encoding: jsonwebtoken::EncodingKey,
    decoding: jsonwebtoken::DecodingKey,
    validation: jsonwebtoken::Validation,
}

impl JwtSigner {
    pub fn new(options: SignerOptions) -> Result<Self, AuthError> {
        options.validate()?;
        let secret = options.secret.as_deref().ok_or(AuthError::MissingSecret)?;

        let mut validation = jsonwebtoken::Validation::new(Self::algorithm(options.algorithm));
        // The lifetime is short; no clock leeway on top of it.
        validation.leeway = 0;
        validation.set_issuer(&[options.issuer.as_str()]);
        validation.set_audience(options.audience.as_slice());
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss", "aud"]);

        Ok(Self {
            encoding: jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
            decoding: jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
            validation,
            options,
        })
    }

    fn algorithm(alg: JwtAlgorithm) -> jsonwebtoken::Algorithm {
        match alg {
            JwtAlgorithm::HS256 => jsonwebtoken::Algorithm::HS256,
            JwtAlgorithm::HS384 => jsonwebtoken::Algorithm::HS384,
            JwtAlgorithm::HS512 => jsonwebtoken::Algorithm::HS512,
        }
    }

    fn sign_at(&self, user: &User, url: &str, now: i64) -> Result<String, AuthError> {
        let exp = i64::try_from(self.options.expires_in.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| AuthError::InvalidConfig("signature expiry is out of range".to_string()))?;

        let claims = SignedClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            url: url.to_string(),
            iss: self.options.issuer.clone(),
            aud: self.options.audience.clone(),
            iat: now,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        let mut header = jsonwebtoken::Header::new(Self::algorithm(self.options.algorithm));
        header.typ = Some("signed-url".to_string());

        jsonwebtoken::encode(&header, &claims, &self.encoding).map_err(|e| AuthError::InvalidConfig(e.to_string()))
    }
}

impl Signer for JwtSigner {
    fn query_param(&self) -> &str {
        &self.options.query_param
    }

    fn ttl(&self) -> Duration {
        self.options.expires_in
    }

    fn sign(&self, user: &User, url: &str) -> IamResult<String> {
        self.sign_at(user, url, Utc::now().timestamp())
            .map_err(AuthError::into_anyhow)
    }

    fn verify(&self, token: &str) -> IamResult<SignedClaims> {
        jsonwebtoken::decode::<SignedClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidSignature(e.to_string()).into_anyhow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iam_core::{ErrorKind, IamError};

    fn user() -> User {
        User {
            id: 42,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            groups: vec![],
        }
    }

    fn signer() -> JwtSigner {
        JwtSigner::new(SignerOptions::with_secret("unit-test-secret-0123456789")).unwrap()
    }

    fn kind(err: anyhow::Error) -> ErrorKind {
        IamError::from_anyhow(&err).unwrap().kind
    }

    #[test]
    fn token_binds_user_and_time() {
        let s = signer();
        let token = s.sign(&user(), "http://h/tasks/5").unwrap();
        let claims = s.verify(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.url, "http://h/tasks/5");
        let age = Utc::now().timestamp() - claims.iat;
        assert!((0..=30).contains(&age));
        assert_eq!(claims.exp - claims.iat, 30);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let s = signer();
        let now = Utc::now().timestamp();
        let token = s.sign_at(&user(), "http://h/x", now - 31).unwrap();
        assert_eq!(kind(s.verify(&token).unwrap_err()), ErrorKind::NotAuthenticated);
    }

    #[test]
    fn expiry_past_the_clock_range_is_an_error() {
        let s = signer();
        let err = s.sign_at(&user(), "http://h/x", i64::MAX - 5).unwrap_err();
        assert!(matches!(err, AuthError::InvalidConfig(_)));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let other = JwtSigner::new(SignerOptions::with_secret("some-other-secret-9876543210")).unwrap();
        let token = other.sign(&user(), "http://h/x").unwrap();
        assert!(signer().verify(&token).is_err());
    }

    #[test]
    fn unsign_checks_the_url() {
        let s = signer();
        let signed = s
            .sign_url(&user(), Url::parse("http://h/tasks/5?page=2").unwrap())
            .unwrap();
        let token = signed
            .query_pairs()
            .find(|(k, _)| k == "sign")
            .map(|(_, v)| v.into_owned())
            .unwrap();

        assert_eq!(s.unsign(&token, signed.as_str()).unwrap().user_id().unwrap(), 42);

        let err = s.unsign(&token, "http://h/tasks/6?page=2").unwrap_err();
        assert_eq!(kind(err), ErrorKind::NotAuthenticated);
    }
}
