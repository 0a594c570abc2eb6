//! In-memory stores, used by the demo server and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::{IamError, IamResult};
use crate::models::{Membership, NewUser, Organization, OrganizationId, User, UserId};
use crate::store::{AuthTokenStore, MembershipStore, OrganizationStore, UserStore};

fn read<T>(lock: &RwLock<T>) -> IamResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| IamError::general_error("store lock poisoned").into_anyhow())
}

fn write<T>(lock: &RwLock<T>) -> IamResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| IamError::general_error("store lock poisoned").into_anyhow())
}

struct StoredUser {
    user: User,
    password_hash: String,
}

pub struct MemoryStore {
    users: RwLock<HashMap<UserId, StoredUser>>,
    organizations: RwLock<HashMap<OrganizationId, Organization>>,
    memberships: RwLock<Vec<Membership>>,
    tokens: RwLock<HashMap<String, UserId>>,
    next_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            organizations: RwLock::new(HashMap::new()),
            memberships: RwLock::new(Vec::new()),
            tokens: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn add_organization(&self, slug: &str, name: &str, owner_id: Option<UserId>) -> IamResult<Organization> {
        let mut orgs = write(&self.organizations)?;
        if orgs.values().any(|o| o.slug == slug) {
            return Err(IamError::conflict(format!("organization {slug} already exists")).into_anyhow());
        }
        let org = Organization {
            id: self.next_id(),
            slug: slug.to_string(),
            name: name.to_string(),
            owner_id,
        };
        orgs.insert(org.id, org.clone());
        Ok(org)
    }

    pub fn add_membership(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
        role: &str,
        is_active: bool,
    ) -> IamResult<Membership> {
        let membership = Membership {
            id: self.next_id(),
            user_id,
            organization_id,
            role: role.to_string(),
            is_active,
        };
        write(&self.memberships)?.push(membership.clone());
        Ok(membership)
    }

    /// Stored bcrypt hash for a user, if any.
    pub fn password_hash(&self, user_id: UserId) -> IamResult<Option<String>> {
        Ok(read(&self.users)?.get(&user_id).map(|u| u.password_hash.clone()))
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn find_by_slug(&self, slug: &str) -> IamResult<Option<Organization>> {
        Ok(read(&self.organizations)?.values().find(|o| o.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: OrganizationId) -> IamResult<Option<Organization>> {
        Ok(read(&self.organizations)?.get(&id).cloned())
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn find(&self, organization_id: OrganizationId, user_id: UserId) -> IamResult<Option<Membership>> {
        Ok(read(&self.memberships)?
            .iter()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> IamResult<Option<User>> {
        Ok(read(&self.users)?.get(&id).map(|u| u.user.clone()))
    }

    async fn find_by_username(&self, username: &str) -> IamResult<Option<User>> {
        Ok(read(&self.users)?
            .values()
            .find(|u| u.user.username == username)
            .map(|u| u.user.clone()))
    }

    async fn create(&self, new: NewUser) -> IamResult<User> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.user.username == new.username) {
            return Err(IamError::conflict(format!("user {} already exists", new.username)).into_anyhow());
        }
        let user = User {
            id: self.next_id(),
            username: new.username,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            groups: new.groups,
        };
        users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: new.password_hash,
            },
        );
        Ok(user)
    }
}

#[async_trait]
impl AuthTokenStore for MemoryStore {
    async fn get_or_create(&self, user_id: UserId) -> IamResult<String> {
        let mut tokens = write(&self.tokens)?;
        if let Some((key, _)) = tokens.iter().find(|(_, uid)| **uid == user_id) {
            return Ok(key.clone());
        }
        let key = Uuid::new_v4().simple().to_string();
        tokens.insert(key.clone(), user_id);
        Ok(key)
    }

    async fn find_user(&self, key: &str) -> IamResult<Option<UserId>> {
        Ok(read(&self.tokens)?.get(key).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "hash".to_string(),
            groups: vec!["user".to_string()],
        }
    }

    #[tokio::test]
    async fn token_is_stable_per_user() {
        let store = MemoryStore::new();
        let user = store.create(new_user("alice")).await.unwrap();

        let a = store.get_or_create(user.id).await.unwrap();
        let b = store.get_or_create(user.id).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.find_user(&a).await.unwrap(), Some(user.id));
        assert_eq!(store.find_user("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = MemoryStore::new();
        store.create(new_user("bob")).await.unwrap();
        assert!(store.create(new_user("bob")).await.is_err());
    }

    #[tokio::test]
    async fn ids_are_unique_across_records() {
        let store = MemoryStore::new();
        let user = store.create(new_user("carol")).await.unwrap();
        let org = store.add_organization("acme", "Acme", Some(user.id)).unwrap();
        let m = store.add_membership(org.id, user.id, "owner", true).unwrap();

        assert!(user.id >= 1);
        assert_ne!(user.id, org.id);
        assert_ne!(org.id, m.id);
        assert_eq!(MembershipStore::find(&store, org.id, user.id).await.unwrap(), Some(m));
    }
}
