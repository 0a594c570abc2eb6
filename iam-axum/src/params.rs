use std::collections::HashMap;

use axum::http::header::HOST;
use axum::http::{HeaderMap, Uri};
use iam_auth::{urls, AuthError};
use iam_core::context::{ORG_HEADER, ORG_ID_QUERY_PARAM, ORG_QUERY_PARAM};
use iam_core::OrgInputs;
use url::Url;

/// Query string as a map. The last occurrence of a repeated key wins.
pub fn query_map(uri: &Uri) -> HashMap<String, String> {
    let mut out = HashMap::new();
    if let Some(q) = uri.query() {
        out.extend(
            url::form_urlencoded::parse(q.as_bytes()).map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
    }
    out
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
}

/// Organization inputs carried by a request.
pub fn org_inputs(headers: &HeaderMap, uri: &Uri) -> OrgInputs {
    let mut query = query_map(uri);
    OrgInputs::new(
        query.remove(ORG_QUERY_PARAM),
        query.remove(ORG_ID_QUERY_PARAM),
        header_str(headers, ORG_HEADER),
    )
}

/// Scheme and authority this server is reached at.
///
/// `public_url` wins; otherwise `X-Forwarded-Proto` (default `http`) and
/// `Host` (default `localhost`) of the request.
pub fn base_url(public_url: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(url) = public_url {
        return url.trim_end_matches('/').to_string();
    }

    let scheme = header_str(headers, "x-forwarded-proto")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_ascii_lowercase()))
        .filter(|s| s == "http" || s == "https")
        .unwrap_or_else(|| "http".to_string());
    let host = header_str(headers, HOST.as_str())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string());

    format!("{scheme}://{host}")
}

/// `target` made absolute against [`base_url`]. Signing and signed-URL
/// checks both go through here so the two sides agree on the URL.
pub fn resolve_url(public_url: Option<&str>, headers: &HeaderMap, target: &str) -> Result<Url, AuthError> {
    urls::absolutize(&base_url(public_url, headers), target)
}

/// Absolute URL of the current request.
pub fn request_url(public_url: Option<&str>, headers: &HeaderMap, uri: &Uri) -> Result<Url, AuthError> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let target = format!("/{}", path_and_query.trim_start_matches('/'));
    resolve_url(public_url, headers, &target)
}
