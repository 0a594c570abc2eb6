//! # Configuration
//!
//! A string key/value store, layered however the host application likes,
//! plus typed views read from an immutable snapshot.
//!
//! ```rust
//! use iam_core::ConfigStore;
//!
//! let mut cfg = ConfigStore::new();
//! cfg.set("iam.roles", "admin,user");
//! cfg.set("iam.email_verification", "mandatory");
//!
//! let settings = iam_core::IamSettings::from_snapshot(&cfg.snapshot()).unwrap();
//! assert_eq!(settings.roles.names(), ["admin", "user"]);
//! ```
//!
//! Environment variables map onto keys by stripping a prefix, lowercasing
//! and turning `__` into `.`: `IAM__IAM__ROLES=admin,user` sets `iam.roles`.

use std::collections::HashMap;

use crate::errors::{IamError, IamResult};
use crate::registration::EmailVerification;
use crate::roles::RoleSet;

/// Roles shipped by default, highest priority first.
pub const DEFAULT_ROLES: &[&str] = &["admin", "business", "user", "worker"];

#[derive(Debug, Default)]
pub struct ConfigStore {
    values: HashMap<String, String>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Copy every `PREFIX...` pair from `vars` into the store.
    ///
    /// `PREFIX__SIGNING__SECRET` becomes `signing.secret`.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut loaded = 0;
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped
                    .trim_start_matches("__")
                    .to_lowercase()
                    .replace("__", ".");
                if normalized.is_empty() {
                    continue;
                }
                self.set(normalized, value);
                loaded += 1;
            }
        }
        loaded
    }

    pub fn load_env(&mut self, prefix: &str) -> usize {
        self.load_vars(prefix, std::env::vars())
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    /// Comma separated list, blanks dropped.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

/// Typed IAM settings.
#[derive(Debug, Clone)]
pub struct IamSettings {
    pub roles: RoleSet,
    pub email_verification: EmailVerification,
    /// Base used to absolutize relative URLs. When unset the request's own
    /// scheme and host are used.
    pub public_url: Option<String>,
}

impl Default for IamSettings {
    fn default() -> Self {
        Self {
            roles: RoleSet::new(DEFAULT_ROLES.iter().copied()),
            email_verification: EmailVerification::default(),
            public_url: None,
        }
    }
}

impl IamSettings {
    pub fn from_snapshot(cfg: &ConfigSnapshot) -> IamResult<Self> {
        let defaults = Self::default();

        let roles = match cfg.get_list("iam.roles") {
            Some(names) if names.is_empty() => {
                return Err(IamError::general_error("iam.roles must name at least one role").into_anyhow());
            }
            Some(names) => RoleSet::new(names),
            None => defaults.roles,
        };

        let email_verification = match cfg.get("iam.email_verification") {
            Some(raw) => raw.parse::<EmailVerification>()?,
            None => defaults.email_verification,
        };

        let public_url = cfg
            .get_string("http.public_url")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            roles,
            email_verification,
            public_url,
        })
    }
}
