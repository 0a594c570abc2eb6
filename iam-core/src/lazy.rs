//! Request-scoped, memoized context.
//!
//! A [`LazyContext`] is created when a request enters the stack but does no
//! work until something reads it. The first read resolves the context with
//! the caller known *at that moment*; the outcome, success or failure, is
//! kept for every later read of the same request.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::context::{OrgInputs, RequestContext};
use crate::errors::{IamError, IamResult};
use crate::models::User;
use crate::resolver::ContextResolver;

type Outcome = Result<Arc<RequestContext>, IamError>;

struct LazyInner {
    resolver: ContextResolver,
    inputs: OrgInputs,
    cell: OnceCell<Outcome>,
}

/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct LazyContext {
    inner: Arc<LazyInner>,
}

impl LazyContext {
    pub fn new(resolver: ContextResolver, inputs: OrgInputs) -> Self {
        Self {
            inner: Arc::new(LazyInner {
                resolver,
                inputs,
                cell: OnceCell::new(),
            }),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.cell.initialized()
    }

    /// Resolve on first call, then replay the stored outcome.
    ///
    /// `user` is only consulted by the first call.
    pub async fn get(&self, user: Option<&User>) -> IamResult<Arc<RequestContext>> {
        let outcome = self
            .inner
            .cell
            .get_or_init(|| async {
                self.inner
                    .resolver
                    .resolve(user, &self.inner.inputs)
                    .await
                    .map(Arc::new)
                    .map_err(IamError::normalize)
            })
            .await;

        match outcome {
            Ok(ctx) => Ok(Arc::clone(ctx)),
            Err(err) => Err(err.sanitize_for_client().into_anyhow()),
        }
    }
}

impl std::fmt::Debug for LazyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyContext")
            .field("inputs", &self.inner.inputs)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
