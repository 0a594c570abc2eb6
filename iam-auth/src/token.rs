// Credential extraction from request headers.

use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderName};

#[derive(Clone, Debug)]
pub struct TokenExtractorOptions {
    pub header: HeaderName,
    pub schemes: Vec<String>,
}

impl Default for TokenExtractorOptions {
    fn default() -> Self {
        Self {
            header: AUTHORIZATION,
            schemes: vec!["Token".to_string(), "Bearer".to_string()],
        }
    }
}

/// Pulls an API key out of `Authorization: <scheme> <key>`.
#[derive(Clone, Debug, Default)]
pub struct TokenExtractor {
    options: TokenExtractorOptions,
}

impl TokenExtractor {
    pub fn new(options: TokenExtractorOptions) -> Self {
        Self { options }
    }

    /// `None` when the header is missing, empty, not UTF-8, or uses a
    /// scheme that is not accepted.
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        let hv = headers.get(&self.options.header)?.to_str().ok()?.trim();
        if hv.is_empty() {
            return None;
        }

        let (scheme, token) = hv.split_once(' ')?;
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        let allowed = self
            .options
            .schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(scheme.trim()));
        allowed.then(|| token.to_string())
    }
}
