use iam_core::ConfigStore;

/// Environment variables starting with this map onto config keys:
/// `IAM__SIGNING__SECRET` sets `signing.secret`.
pub const ENV_PREFIX: &str = "IAM__";

/// Defaults, then the process environment on top.
pub fn load() -> ConfigStore {
    let mut cfg = defaults();
    let loaded = cfg.load_env(ENV_PREFIX);
    tracing::debug!(loaded, "config.env.loaded");
    cfg
}

pub fn defaults() -> ConfigStore {
    let mut cfg = ConfigStore::new();

    // HTTP server
    cfg.set("http.host", "127.0.0.1");
    cfg.set("http.port", "3000");

    // IAM
    cfg.set("iam.roles", "admin,business,user,worker");
    cfg.set("iam.email_verification", "none");

    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_defaults() {
        let mut cfg = defaults();
        cfg.load_vars(
            ENV_PREFIX,
            vec![
                ("IAM__HTTP__PORT".to_string(), "8080".to_string()),
                ("IAM__SIGNING__SECRET".to_string(), "s".to_string()),
                ("PATH".to_string(), "/bin".to_string()),
            ],
        );

        assert_eq!(cfg.get("http.port"), Some("8080"));
        assert_eq!(cfg.get("http.host"), Some("127.0.0.1"));
        assert_eq!(cfg.get("signing.secret"), Some("s"));
        assert!(!cfg.has("path"));
    }
}
