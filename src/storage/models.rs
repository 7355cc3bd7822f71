use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of days a paid connection stays visible.
pub const CONNECTION_VALIDITY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Advocate,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// User shape returned to clients. The password never leaves the storage
/// layer through this type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub city: String,
    pub state: String,
    pub pincode: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewLocation {
    pub city: String,
    pub state: String,
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeArea {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advocate {
    pub id: String,
    pub user_id: String,
    pub location_id: String,
    pub bio: String,
    pub experience: u32,
    pub bar_council_number: String,
    pub image_url: Option<String>,
    /// Derived: average review rating, 1 decimal place, 0 when unreviewed.
    pub rating: f64,
    /// Derived: number of reviews.
    pub review_count: i64,
    pub verified: bool,
}

#[derive(Debug, Clone)]
pub struct NewAdvocate {
    pub user_id: String,
    pub location_id: String,
    pub bio: String,
    pub experience: u32,
    pub bar_council_number: String,
    pub image_url: Option<String>,
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvocateSpecialty {
    pub id: String,
    pub advocate_id: String,
    pub practice_area_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub advocate_id: String,
    pub user_id: String,
    pub rating: i32,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub advocate_id: String,
    pub user_id: String,
    pub rating: i32,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub advocate_id: String,
    pub client_id: String,
    pub status: ConnectionStatus,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewConnection {
    pub advocate_id: String,
    pub client_id: String,
    pub status: ConnectionStatus,
    pub payment_id: Option<String>,
    /// Overrides the default createdAt + 30 days expiry when set.
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub user_id: String,
    pub is_user_message: bool,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub user_id: String,
    pub is_user_message: bool,
    pub content: String,
}

/// Contact fields projected from the advocate's owning user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactCard {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// The read model behind every advocate list/detail endpoint: the advocate
/// joined with its user contact card, location and specialty names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvocateDetails {
    #[serde(flatten)]
    pub advocate: Advocate,
    pub user: ContactCard,
    pub location: Location,
    pub specialties: Vec<PracticeArea>,
}
