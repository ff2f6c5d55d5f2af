use std::sync::Arc;

use crate::auth::{JwtService, RateLimiter};
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::UserRepository;
use crate::services::{
    AccountService, BlobStore, CartService, CatalogService, DiscountService, LocalBlobStore,
    OrderService, OrderStateMachine, UploadService,
};

/// Shared server state
///
/// Cheap to clone: every field is a handle.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub db: DbService,
    pub jwt_service: JwtService,
    /// Applied to every route
    pub rate_limiter: RateLimiter,
    /// Applied to the login route only
    pub login_limiter: RateLimiter,
    pub catalog: CatalogService,
    pub carts: CartService,
    pub orders: OrderService,
    pub state_machine: OrderStateMachine,
    pub discounts: DiscountService,
    pub accounts: AccountService,
    pub uploads: UploadService,
}

impl ServerState {
    /// Wire services over `db`, storing uploads under `config.upload_dir`
    pub fn new(config: Config, db: DbService) -> Self {
        let blobs = Arc::new(LocalBlobStore::new(&config.upload_dir, config.uploads_url()));
        Self::with_blob_store(config, db, blobs)
    }

    pub fn with_blob_store(config: Config, db: DbService, blobs: Arc<dyn BlobStore>) -> Self {
        let jwt_service = JwtService::new(config.jwt.clone());
        let discounts = DiscountService::new(db.clone());

        Self {
            rate_limiter: RateLimiter::new(
                "global",
                config.rate_limit_requests,
                config.rate_limit_window,
            ),
            login_limiter: RateLimiter::login(),
            catalog: CatalogService::new(db.clone()),
            carts: CartService::new(db.clone()),
            orders: OrderService::new(db.clone(), discounts.clone()),
            state_machine: OrderStateMachine::new(db.clone()),
            accounts: AccountService::new(UserRepository::new(&db), jwt_service.clone()),
            uploads: UploadService::new(blobs),
            discounts,
            jwt_service,
            config: Arc::new(config),
            db,
        }
    }

    /// Create the bootstrap admin when configured
    pub async fn bootstrap(&self) -> shared::AppResult<()> {
        if let (Some(email), Some(password)) =
            (&self.config.admin_email, &self.config.admin_password)
        {
            self.accounts.ensure_admin(email, password).await?;
        }
        Ok(())
    }

    /// Stop background tasks
    pub fn shutdown(&self) {
        self.rate_limiter.shutdown();
        self.login_limiter.shutdown();
    }
}
