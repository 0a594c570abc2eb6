//! Per-request IAM context and organization selection.

use serde::{Deserialize, Serialize};

use crate::errors::{IamError, IamResult};
use crate::models::{Membership, Organization, OrganizationId};
use crate::roles::Role;

pub const ORG_QUERY_PARAM: &str = "org";
pub const ORG_ID_QUERY_PARAM: &str = "org_id";
pub const ORG_HEADER: &str = "X-Organization";

/// Derived authorization context of one request. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub privilege: Option<Role>,
    pub organization: Option<Organization>,
    pub membership: Option<Membership>,
}

impl RequestContext {
    pub fn privilege_name(&self) -> Option<&str> {
        self.privilege.as_ref().map(|r| r.name.as_str())
    }

    /// True when the caller holds an active membership in the selected organization.
    pub fn is_member(&self) -> bool {
        self.membership.is_some()
    }
}

/// Raw organization inputs as they arrived on the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgInputs {
    pub org: Option<String>,
    pub org_id: Option<String>,
    pub header: Option<String>,
}

impl OrgInputs {
    /// Empty strings count as absent.
    pub fn new(org: Option<String>, org_id: Option<String>, header: Option<String>) -> Self {
        fn present(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.is_empty())
        }
        Self {
            org: present(org),
            org_id: present(org_id),
            header: present(header),
        }
    }
}

/// How the request selects its organization, after conflict checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgSelector {
    None,
    Slug(String),
    Id { raw: String, id: OrganizationId },
}

impl OrgSelector {
    pub fn from_inputs(inputs: &OrgInputs) -> IamResult<Self> {
        let OrgInputs { org, org_id, header } = inputs;

        if org_id.is_some() && (org.is_some() || header.is_some()) {
            return Err(IamError::bad_request(
                "cannot specify org_id together with org/X-Organization",
            )
            .into_anyhow());
        }

        if let (Some(org), Some(header)) = (org, header) {
            if org != header {
                return Err(
                    IamError::bad_request("conflicting org and X-Organization values").into_anyhow()
                );
            }
        }

        if let Some(slug) = org.as_ref().or(header.as_ref()) {
            return Ok(OrgSelector::Slug(slug.clone()));
        }

        match org_id {
            Some(raw) => {
                let id = raw.trim().parse::<OrganizationId>().map_err(|e| {
                    IamError::bad_request(format!("org_id must be an integer, got {raw:?}"))
                        .with_source(e.into())
                        .into_anyhow()
                })?;
                Ok(OrgSelector::Id {
                    raw: raw.clone(),
                    id,
                })
            }
            None => Ok(OrgSelector::None),
        }
    }

    /// The value the caller used, for error messages.
    pub fn display_value(&self) -> Option<&str> {
        match self {
            OrgSelector::None => None,
            OrgSelector::Slug(s) => Some(s),
            OrgSelector::Id { raw, .. } => Some(raw),
        }
    }
}
