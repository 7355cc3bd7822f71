pub mod filter;
pub mod memory;
pub mod models;
pub mod mongo;
pub mod seed;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use filter::AdvocateFilter;
pub use memory::MemoryStorage;
pub use models::*;
pub use mongo::MongoStorage;

/// Shared handle injected into every handler; resolved once at startup.
pub type DynStorage = Arc<dyn Storage>;

#[derive(Error, Debug)]
pub enum StorageError {
    /// A uniqueness invariant (username, email, userId, specialty pair)
    /// would be violated.
    #[error("duplicate {field}")]
    Duplicate { field: &'static str },

    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// The repository contract both backends implement. Lookups return
/// `Ok(None)` for missing or malformed ids — absence is a value here,
/// not an error; callers decide how to surface it.
#[async_trait]
pub trait Storage: Send + Sync {
    // Users
    async fn create_user(&self, user: NewUser) -> StorageResult<User>;
    async fn get_user(&self, id: &str) -> StorageResult<Option<User>>;
    /// Case-insensitive exact match.
    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;
    /// Case-insensitive exact match.
    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;
    async fn user_count(&self) -> StorageResult<u64>;

    // Locations
    async fn create_location(&self, location: NewLocation) -> StorageResult<Location>;
    async fn get_location(&self, id: &str) -> StorageResult<Option<Location>>;
    async fn all_locations(&self) -> StorageResult<Vec<Location>>;

    // Practice areas
    async fn create_practice_area(&self, name: &str) -> StorageResult<PracticeArea>;
    async fn get_practice_area(&self, id: &str) -> StorageResult<Option<PracticeArea>>;
    async fn all_practice_areas(&self) -> StorageResult<Vec<PracticeArea>>;

    // Advocates
    async fn create_advocate(&self, advocate: NewAdvocate) -> StorageResult<Advocate>;
    async fn get_advocate(&self, id: &str) -> StorageResult<Option<Advocate>>;
    async fn get_advocate_by_user(&self, user_id: &str) -> StorageResult<Option<Advocate>>;
    /// The derived view: advocate + user contact card + location +
    /// specialties. A dangling user or location reference yields `None`.
    async fn advocate_details(&self, id: &str) -> StorageResult<Option<AdvocateDetails>>;
    async fn all_advocate_details(&self) -> StorageResult<Vec<AdvocateDetails>>;
    async fn advocates_by_filter(
        &self,
        filter: &AdvocateFilter,
    ) -> StorageResult<Vec<AdvocateDetails>>;

    // Specialties
    /// Idempotent: re-adding an existing (advocate, practice area) pair
    /// returns the existing join record.
    async fn add_specialty(
        &self,
        advocate_id: &str,
        practice_area_id: &str,
    ) -> StorageResult<AdvocateSpecialty>;
    async fn advocate_specialties(&self, advocate_id: &str) -> StorageResult<Vec<PracticeArea>>;

    // Reviews
    /// Creates the review and synchronously recomputes the advocate's
    /// rating and review count.
    async fn create_review(&self, review: NewReview) -> StorageResult<Review>;
    async fn reviews_for_advocate(&self, advocate_id: &str) -> StorageResult<Vec<Review>>;

    // Connections
    async fn create_connection(&self, connection: NewConnection) -> StorageResult<Connection>;
    async fn get_connection(&self, id: &str) -> StorageResult<Option<Connection>>;
    async fn connections_by_client(&self, client_id: &str) -> StorageResult<Vec<Connection>>;
    async fn connections_by_advocate(&self, advocate_id: &str) -> StorageResult<Vec<Connection>>;
    async fn update_connection_status(
        &self,
        id: &str,
        status: ConnectionStatus,
        payment_id: Option<String>,
    ) -> StorageResult<Option<Connection>>;

    // Chat
    async fn create_chat_message(&self, message: NewChatMessage) -> StorageResult<ChatMessage>;
    /// Chronological transcript; `limit` keeps the most recent messages.
    async fn chat_history(&self, user_id: &str, limit: usize) -> StorageResult<Vec<ChatMessage>>;
}

/// Rating aggregation used by both backends: mean of all ratings rounded
/// to one decimal place, 0.0 for an empty set.
pub(crate) fn aggregate_rating(ratings: &[i32]) -> (f64, i64) {
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    let mean = sum as f64 / ratings.len() as f64;
    ((mean * 10.0).round() / 10.0, ratings.len() as i64)
}
