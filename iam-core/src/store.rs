//! Repository interfaces the resolver and handlers depend on.
//!
//! Implementations return `Ok(None)` for "not found"; errors are reserved
//! for the store itself failing.

use async_trait::async_trait;

use crate::errors::IamResult;
use crate::models::{Membership, NewUser, Organization, OrganizationId, User, UserId};

#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> IamResult<Option<Organization>>;

    async fn find_by_id(&self, id: OrganizationId) -> IamResult<Option<Organization>>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// First membership linking `user_id` to `organization_id`, active or not.
    async fn find(&self, organization_id: OrganizationId, user_id: UserId) -> IamResult<Option<Membership>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> IamResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> IamResult<Option<User>>;

    async fn create(&self, user: NewUser) -> IamResult<User>;
}

/// Long-lived per-user API keys (`Authorization: Token <key>`).
#[async_trait]
pub trait AuthTokenStore: Send + Sync {
    /// Existing key for the user, or a freshly issued one.
    async fn get_or_create(&self, user_id: UserId) -> IamResult<String>;

    async fn find_user(&self, key: &str) -> IamResult<Option<UserId>>;
}
