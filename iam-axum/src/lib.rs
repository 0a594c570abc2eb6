//! iam-axum: Axum adapter for the IAM crates.
//!
//! Authentication and lazy request-context middleware, the `CurrentUser`
//! and `IamContext` extractors, and the `/auth` endpoints for URL signing,
//! registration and context inspection.

pub mod app;
pub mod extract;
pub mod middleware;
pub mod params;
pub mod rest;
pub mod state;
mod error;
pub use error::IamAxumError;
pub use state::IamState;

pub use app::{axum, AxumApp};
pub use extract::IamContext;
pub use middleware::CurrentUser;
