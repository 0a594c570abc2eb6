use axum::middleware;
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::{attach_context, authenticate};
use crate::rest::auth_router;
use crate::IamState;

/// Router with the IAM endpoints under `/auth` and the IAM middleware
/// applied to everything registered on it.
pub struct AxumApp {
    pub state: IamState,
    router: Router<IamState>,
}

impl AxumApp {
    pub fn new(state: IamState) -> Self {
        Self {
            state,
            router: Router::new().nest("/auth", auth_router()),
        }
    }

    /// Mount additional routes; they see `CurrentUser` and the request context too.
    pub fn merge(mut self, router: Router<IamState>) -> Self {
        self.router = self.router.merge(router);
        self
    }

    pub fn into_router(self) -> Router {
        let state = self.state;
        self.router
            .layer(middleware::from_fn_with_state(state.clone(), attach_context))
            .layer(middleware::from_fn_with_state(state.clone(), authenticate))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
            .with_state(state)
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "iam.listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}

pub fn axum(state: IamState) -> AxumApp {
    AxumApp::new(state)
}
