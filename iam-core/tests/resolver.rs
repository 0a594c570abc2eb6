use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use iam_core::{
    ContextResolver, ErrorKind, IamError, IamResult, LazyContext, MemoryStore, MembershipStore, Organization,
    OrganizationId, OrganizationStore, OrgInputs, RoleSet, User,
};

/// Wraps the memory store and counts organization lookups.
struct CountingOrgs {
    inner: Arc<MemoryStore>,
    lookups: AtomicUsize,
}

#[async_trait]
impl OrganizationStore for CountingOrgs {
    async fn find_by_slug(&self, slug: &str) -> IamResult<Option<Organization>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        OrganizationStore::find_by_slug(self.inner.as_ref(), slug).await
    }

    async fn find_by_id(&self, id: OrganizationId) -> IamResult<Option<Organization>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        OrganizationStore::find_by_id(self.inner.as_ref(), id).await
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    orgs: Arc<CountingOrgs>,
    resolver: ContextResolver,
    alice: User,
    acme: Organization,
    dormant: Organization,
}

fn user(id: i64, groups: &[&str]) -> User {
    User {
        id,
        username: format!("user{id}"),
        email: format!("user{id}@example.com"),
        first_name: String::new(),
        last_name: String::new(),
        groups: groups.iter().map(|g| g.to_string()).collect(),
    }
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let acme = store.add_organization("acme", "Acme", None).unwrap();
    let dormant = store.add_organization("dormant", "Dormant", None).unwrap();

    let alice = user(100, &["worker", "user"]);
    store.add_membership(acme.id, alice.id, "maintainer", true).unwrap();
    store.add_membership(dormant.id, alice.id, "worker", false).unwrap();

    let orgs = Arc::new(CountingOrgs {
        inner: Arc::clone(&store),
        lookups: AtomicUsize::new(0),
    });
    let resolver = ContextResolver::new(
        RoleSet::new(["admin", "business", "user", "worker"]),
        orgs.clone(),
        store.clone() as Arc<dyn MembershipStore>,
    );

    Fixture {
        store,
        orgs,
        resolver,
        alice,
        acme,
        dormant,
    }
}

fn inputs(org: Option<&str>, org_id: Option<&str>, header: Option<&str>) -> OrgInputs {
    OrgInputs::new(org.map(String::from), org_id.map(String::from), header.map(String::from))
}

fn error_of(err: anyhow::Error) -> (ErrorKind, String) {
    let iam = IamError::from_anyhow(&err).expect("IamError");
    (iam.kind, iam.message.clone())
}

#[tokio::test]
async fn no_selector_yields_privilege_only() {
    let f = fixture();
    let ctx = f.resolver.resolve(Some(&f.alice), &OrgInputs::default()).await.unwrap();

    assert_eq!(ctx.privilege_name(), Some("user"));
    assert!(ctx.organization.is_none());
    assert!(ctx.membership.is_none());
    assert_eq!(f.orgs.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn slug_resolves_organization_and_membership() {
    let f = fixture();
    let ctx = f.resolver.resolve(Some(&f.alice), &inputs(Some("acme"), None, None)).await.unwrap();

    assert_eq!(ctx.organization.as_ref(), Some(&f.acme));
    let m = ctx.membership.unwrap();
    assert_eq!(m.role, "maintainer");
    assert_eq!(m.user_id, f.alice.id);
}

#[tokio::test]
async fn header_and_query_may_agree() {
    let f = fixture();
    let ctx = f
        .resolver
        .resolve(Some(&f.alice), &inputs(Some("acme"), None, Some("acme")))
        .await
        .unwrap();
    assert_eq!(ctx.organization.map(|o| o.slug), Some("acme".to_string()));
}

#[tokio::test]
async fn org_id_resolves_by_number() {
    let f = fixture();
    let raw = f.acme.id.to_string();
    let ctx = f.resolver.resolve(Some(&f.alice), &inputs(None, Some(&raw), None)).await.unwrap();
    assert_eq!(ctx.organization.as_ref(), Some(&f.acme));
    assert!(ctx.is_member());
}

#[tokio::test]
async fn conflicting_inputs_fail_before_any_lookup() {
    let f = fixture();

    let (kind, _) = error_of(
        f.resolver
            .resolve(Some(&f.alice), &inputs(Some("acme"), Some("1"), None))
            .await
            .unwrap_err(),
    );
    assert_eq!(kind, ErrorKind::BadRequest);

    let (kind, msg) = error_of(
        f.resolver
            .resolve(Some(&f.alice), &inputs(Some("a"), None, Some("b")))
            .await
            .unwrap_err(),
    );
    assert_eq!(kind, ErrorKind::BadRequest);
    assert!(msg.contains("conflicting"));

    assert_eq!(f.orgs.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_organization_is_bad_request_naming_the_value() {
    let f = fixture();

    let (kind, msg) = error_of(
        f.resolver
            .resolve(Some(&f.alice), &inputs(None, None, Some("ghost")))
            .await
            .unwrap_err(),
    );
    assert_eq!(kind, ErrorKind::BadRequest);
    assert_eq!(msg, "ghost organization does not exist");

    let (kind, msg) = error_of(
        f.resolver
            .resolve(Some(&f.alice), &inputs(None, Some("9999"), None))
            .await
            .unwrap_err(),
    );
    assert_eq!(kind, ErrorKind::BadRequest);
    assert!(msg.contains("9999"));
}

#[tokio::test]
async fn inactive_membership_keeps_organization() {
    let f = fixture();
    let ctx = f
        .resolver
        .resolve(Some(&f.alice), &inputs(Some("dormant"), None, None))
        .await
        .unwrap();

    assert_eq!(ctx.organization.as_ref(), Some(&f.dormant));
    assert!(ctx.membership.is_none());
}

#[tokio::test]
async fn anonymous_caller_gets_organization_without_membership() {
    let f = fixture();
    let ctx = f.resolver.resolve(None, &inputs(Some("acme"), None, None)).await.unwrap();

    assert!(ctx.privilege.is_none());
    assert_eq!(ctx.organization.as_ref(), Some(&f.acme));
    assert!(ctx.membership.is_none());
}

#[tokio::test]
async fn non_member_has_no_membership() {
    let f = fixture();
    let bob = user(200, &["admin", "worker"]);
    let ctx = f.resolver.resolve(Some(&bob), &inputs(Some("acme"), None, None)).await.unwrap();

    assert_eq!(ctx.privilege_name(), Some("admin"));
    assert!(ctx.membership.is_none());
    assert!(f.store.add_membership(f.acme.id, bob.id, "worker", true).is_ok());
}

#[tokio::test]
async fn lazy_context_resolves_once() {
    let f = fixture();
    let lazy = LazyContext::new(f.resolver.clone(), inputs(Some("acme"), None, None));
    assert!(!lazy.is_resolved());
    assert_eq!(f.orgs.lookups.load(Ordering::SeqCst), 0);

    let first = lazy.get(Some(&f.alice)).await.unwrap();
    let again = lazy.clone().get(Some(&f.alice)).await.unwrap();

    assert!(lazy.is_resolved());
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(f.orgs.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn lazy_context_replays_failures() {
    let f = fixture();
    let lazy = LazyContext::new(f.resolver.clone(), inputs(Some("ghost"), None, None));

    for _ in 0..3 {
        let (kind, msg) = error_of(lazy.get(Some(&f.alice)).await.unwrap_err());
        assert_eq!(kind, ErrorKind::BadRequest);
        assert_eq!(msg, "ghost organization does not exist");
    }
    assert_eq!(f.orgs.lookups.load(Ordering::SeqCst), 1);
}
