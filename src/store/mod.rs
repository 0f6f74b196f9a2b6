use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Analytics, ContactSubmission, FoodClaim, FoodListing, ListingStatus, NewContactSubmission,
    NewFoodClaim, NewFoodListing, NewReview, NewSession, NewUser, PickupStatus, Review, Session,
    User, UserRole,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("food listing not available")]
    ListingUnavailable,
    #[error("{0}")]
    Conflict(String),
    #[error("cannot change pickup status from {from} to {to}")]
    InvalidTransition {
        from: PickupStatus,
        to: PickupStatus,
    },
    #[error("resource not found")]
    NotFound,
    #[error("{0}")]
    Unsupported(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("database pool error: {0}")]
    Pool(String),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn users_by_role(&self, role: UserRole) -> StoreResult<Vec<User>>;

    async fn create_listing(&self, new_listing: NewFoodListing) -> StoreResult<FoodListing>;

    async fn listings(&self, status: Option<ListingStatus>) -> StoreResult<Vec<FoodListing>>;

    async fn listings_by_restaurant(&self, restaurant_id: Uuid) -> StoreResult<Vec<FoodListing>>;

    // The listing's available -> claimed transition and the claim insert
    // succeed or fail together; two racing claims never both win.
    async fn claim_listing(&self, new_claim: NewFoodClaim) -> StoreResult<FoodClaim>;

    async fn claims_by_user(&self, user_id: Uuid) -> StoreResult<Vec<FoodClaim>>;

    async fn claims_by_listing(&self, listing_id: Uuid) -> StoreResult<Vec<FoodClaim>>;

    async fn advance_claim(&self, claim_id: Uuid, next: PickupStatus) -> StoreResult<FoodClaim>;

    async fn create_contact(
        &self,
        new_contact: NewContactSubmission,
    ) -> StoreResult<ContactSubmission>;

    async fn reviews(&self) -> StoreResult<Vec<Review>>;

    async fn add_review(&self, new_review: NewReview) -> StoreResult<Review>;

    async fn create_session(&self, new_session: NewSession) -> StoreResult<Session>;

    async fn session_user(&self, token_hash: &str) -> StoreResult<Option<(Session, User)>>;

    async fn delete_session(&self, token_hash: &str) -> StoreResult<()>;

    async fn delete_expired_sessions(&self) -> StoreResult<usize>;

    async fn analytics(&self) -> StoreResult<Analytics>;
}
