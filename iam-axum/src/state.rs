use std::sync::Arc;

use iam_auth::{Signer, TokenExtractor};
use iam_core::{AuthTokenStore, ContextResolver, IamSettings, RegistrationFlow, UserStore};

/// Shared state of the IAM routes and middleware.
#[derive(Clone)]
pub struct IamState {
    pub settings: Arc<IamSettings>,
    pub resolver: ContextResolver,
    pub signer: Arc<dyn Signer>,
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn AuthTokenStore>,
    pub registration: Arc<dyn RegistrationFlow>,
    pub token_extractor: TokenExtractor,
}

impl IamState {
    pub fn new(
        settings: IamSettings,
        resolver: ContextResolver,
        signer: Arc<dyn Signer>,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn AuthTokenStore>,
        registration: Arc<dyn RegistrationFlow>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            resolver,
            signer,
            users,
            tokens,
            registration,
            token_extractor: TokenExtractor::default(),
        }
    }
}
