//! Computes the [`RequestContext`] of a request.

use std::sync::Arc;

use tracing::debug;

use crate::context::{OrgInputs, OrgSelector, RequestContext};
use crate::errors::{IamError, IamResult};
use crate::models::{Membership, Organization, User};
use crate::roles::RoleSet;
use crate::store::{MembershipStore, OrganizationStore};

/// Resolves privilege, organization and membership for a caller.
///
/// Performs at most two store lookups (organization, then membership) and
/// never writes.
#[derive(Clone)]
pub struct ContextResolver {
    roles: RoleSet,
    organizations: Arc<dyn OrganizationStore>,
    memberships: Arc<dyn MembershipStore>,
}

impl ContextResolver {
    pub fn new(
        roles: RoleSet,
        organizations: Arc<dyn OrganizationStore>,
        memberships: Arc<dyn MembershipStore>,
    ) -> Self {
        Self {
            roles,
            organizations,
            memberships,
        }
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub async fn resolve(&self, user: Option<&User>, inputs: &OrgInputs) -> IamResult<RequestContext> {
        let privilege = user.and_then(|u| self.roles.privilege(&u.groups));

        let selector = OrgSelector::from_inputs(inputs)?;
        let organization = self.find_organization(&selector).await?;

        let membership = match (&organization, user) {
            (Some(org), Some(user)) => self.find_active_membership(org, user).await?,
            _ => None,
        };

        debug!(
            user_id = user.map(|u| u.id),
            privilege = privilege.as_ref().map(|r| r.name.as_str()),
            org = organization.as_ref().map(|o| o.slug.as_str()),
            member = membership.is_some(),
            "iam.context.resolved"
        );

        Ok(RequestContext {
            privilege,
            organization,
            membership,
        })
    }

    async fn find_organization(&self, selector: &OrgSelector) -> IamResult<Option<Organization>> {
        let found = match selector {
            OrgSelector::None => return Ok(None),
            OrgSelector::Slug(slug) => self.organizations.find_by_slug(slug).await?,
            OrgSelector::Id { id, .. } => self.organizations.find_by_id(*id).await?,
        };

        match found {
            Some(org) => Ok(Some(org)),
            None => {
                let value = selector.display_value().unwrap_or_default();
                Err(IamError::bad_request(format!("{value} organization does not exist")).into_anyhow())
            }
        }
    }

    async fn find_active_membership(&self, org: &Organization, user: &User) -> IamResult<Option<Membership>> {
        let membership = self.memberships.find(org.id, user.id).await?;
        Ok(membership.filter(|m| m.is_active))
    }
}
