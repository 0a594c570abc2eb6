//! iam-auth: signed URLs, API key extraction and local registration.

pub mod error;
pub mod options;
pub mod registration;
pub mod signer;
pub mod token;
pub mod urls;

pub use error::AuthError;
pub use options::{JwtAlgorithm, SignerOptions, DEFAULT_QUERY_PARAM, DEFAULT_SIGNATURE_TTL, MAX_SIGNATURE_TTL};
pub use registration::{LocalRegistration, LocalRegistrationOptions};
pub use signer::{JwtSigner, SignedClaims, Signer};
pub use token::{TokenExtractor, TokenExtractorOptions};
