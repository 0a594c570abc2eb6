//! iam-core: framework-agnostic IAM request context.
//!
//! Derives, per request, the caller's highest-priority role, the selected
//! organization and the caller's membership in it, and builds registration
//! responses. Transport adapters (see `iam-axum`) feed it request inputs.

pub mod config;
pub mod context;
pub mod errors;
pub mod lazy;
pub mod memory;
pub mod models;
pub mod registration;
pub mod resolver;
pub mod roles;
pub mod store;

pub use config::{ConfigSnapshot, ConfigStore, IamSettings};
pub use context::{OrgInputs, OrgSelector, RequestContext};
pub use errors::{ErrorKind, IamError, IamResult};
pub use lazy::LazyContext;
pub use memory::MemoryStore;
pub use models::{Membership, NewUser, Organization, OrganizationId, User, UserId};
pub use registration::{EmailVerification, RegisterRequest, RegistrationFlow, RegistrationResponse};
pub use resolver::ContextResolver;
pub use roles::{Role, RoleSet};
pub use store::{AuthTokenStore, MembershipStore, OrganizationStore, UserStore};
