// URL helpers shared by the signing endpoint and signed-URL authentication.

use url::Url;

use crate::error::AuthError;

fn invalid(url: &str, err: url::ParseError) -> AuthError {
    AuthError::InvalidUrl {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

/// Resolve `target` against `base`; absolute targets are returned as is.
///
/// A path-absolute `target` stays below the path of `base`: with a base of
/// `https://host/api`, `/tasks/5` becomes `https://host/api/tasks/5`.
pub fn absolutize(base: &str, target: &str) -> Result<Url, AuthError> {
    let relative = if target.starts_with("//") {
        target
    } else if let Some(rest) = target.strip_prefix('/') {
        rest
    } else {
        if let Ok(url) = Url::parse(target) {
            return Ok(url);
        }
        target
    };

    let mut base_url = Url::parse(base).map_err(|e| invalid(base, e))?;
    base_url.set_query(None);
    base_url.set_fragment(None);
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    base_url.join(relative).map_err(|e| invalid(target, e))
}

pub fn append_param(mut url: Url, name: &str, value: &str) -> Url {
    url.query_pairs_mut().append_pair(name, value);
    url
}

/// `url` without the `name` query parameter and without a fragment.
/// An emptied query is removed entirely.
pub fn strip_param(url: &Url, name: &str) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != name)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut out = url.clone();
    out.set_fragment(None);
    if kept.is_empty() {
        out.set_query(None);
    } else {
        out.query_pairs_mut().clear().extend_pairs(kept.iter());
    }
    out
}

/// Parse and normalize so that a signed URL and the URL it was issued for compare equal.
pub fn canonical(url: &str, param: &str) -> Result<Url, AuthError> {
    let parsed = Url::parse(url).map_err(|e| invalid(url, e))?;
    Ok(strip_param(&parsed, param))
}
