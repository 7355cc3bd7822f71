use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Bson};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{
    Collation, CollationStrength, FindOneAndUpdateOptions, IndexOptions, ReturnDocument,
};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;

use super::filter::AdvocateFilter;
use super::models::*;
use super::{aggregate_rating, Storage, StorageError, StorageResult};

/// Document-store backend. Identifiers are ObjectId hex at the API
/// boundary; the internal `*Doc` structs keep the native `_id` and
/// reference fields, converted at the edges of each call.
pub struct MongoStorage {
    users: Collection<UserDoc>,
    locations: Collection<LocationDoc>,
    practice_areas: Collection<PracticeAreaDoc>,
    advocates: Collection<AdvocateDoc>,
    specialties: Collection<SpecialtyDoc>,
    reviews: Collection<ReviewDoc>,
    connections: Collection<ConnectionDoc>,
    chat_messages: Collection<ChatMessageDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    username: String,
    password: String,
    email: String,
    full_name: String,
    phone: Option<String>,
    role: Role,
    created_at: bson::DateTime,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    city: String,
    state: String,
    pincode: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PracticeAreaDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdvocateDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    user_id: ObjectId,
    location_id: ObjectId,
    bio: String,
    experience: u32,
    bar_council_number: String,
    image_url: Option<String>,
    rating: f64,
    review_count: i64,
    verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpecialtyDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    advocate_id: ObjectId,
    practice_area_id: ObjectId,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    advocate_id: ObjectId,
    user_id: ObjectId,
    rating: i32,
    content: Option<String>,
    created_at: bson::DateTime,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    advocate_id: ObjectId,
    client_id: ObjectId,
    status: ConnectionStatus,
    payment_id: Option<String>,
    created_at: bson::DateTime,
    expires_at: bson::DateTime,
}

/// Chat participants include unauthenticated guests, so userId stays a
/// plain string rather than an ObjectId reference.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatMessageDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    user_id: String,
    is_user_message: bool,
    content: String,
    created_at: bson::DateTime,
}

fn to_chrono(dt: bson::DateTime) -> DateTime<Utc> {
    dt.to_chrono()
}

fn to_bson_date(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_chrono(dt)
}

/// Maps a write error: duplicate-key violations (E11000) become
/// `StorageError::Duplicate` with the offending field read from the
/// index name in the server message.
fn write_err(err: mongodb::error::Error) -> StorageError {
    if let ErrorKind::Write(WriteFailure::WriteError(ref we)) = *err.kind {
        if we.code == 11000 {
            let field = if we.message.contains("username") {
                "username"
            } else if we.message.contains("email") {
                "email"
            } else if we.message.contains("userId") {
                "userId"
            } else if we.message.contains("practiceAreaId") {
                "specialty"
            } else {
                "record"
            };
            return StorageError::Duplicate { field };
        }
    }
    StorageError::Backend(err.into())
}

fn db_err(err: mongodb::error::Error) -> StorageError {
    StorageError::Backend(err.into())
}

/// Case-insensitive collation for username/email uniqueness and lookups.
fn ci_collation() -> Collation {
    Collation::builder()
        .locale("en")
        .strength(CollationStrength::Secondary)
        .build()
}

impl UserDoc {
    fn into_model(self) -> User {
        User {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            username: self.username,
            password: self.password,
            email: self.email,
            full_name: self.full_name,
            phone: self.phone,
            role: self.role,
            created_at: to_chrono(self.created_at),
        }
    }
}

impl LocationDoc {
    fn into_model(self) -> Location {
        Location {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            city: self.city,
            state: self.state,
            pincode: self.pincode,
        }
    }
}

impl PracticeAreaDoc {
    fn into_model(self) -> PracticeArea {
        PracticeArea {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: self.name,
        }
    }
}

impl AdvocateDoc {
    fn into_model(self) -> Advocate {
        Advocate {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: self.user_id.to_hex(),
            location_id: self.location_id.to_hex(),
            bio: self.bio,
            experience: self.experience,
            bar_council_number: self.bar_council_number,
            image_url: self.image_url,
            rating: self.rating,
            review_count: self.review_count,
            verified: self.verified,
        }
    }
}

impl SpecialtyDoc {
    fn into_model(self) -> AdvocateSpecialty {
        AdvocateSpecialty {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            advocate_id: self.advocate_id.to_hex(),
            practice_area_id: self.practice_area_id.to_hex(),
        }
    }
}

impl ReviewDoc {
    fn into_model(self) -> Review {
        Review {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            advocate_id: self.advocate_id.to_hex(),
            user_id: self.user_id.to_hex(),
            rating: self.rating,
            content: self.content,
            created_at: to_chrono(self.created_at),
        }
    }
}

impl ConnectionDoc {
    fn into_model(self) -> Connection {
        Connection {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            advocate_id: self.advocate_id.to_hex(),
            client_id: self.client_id.to_hex(),
            status: self.status,
            payment_id: self.payment_id,
            created_at: to_chrono(self.created_at),
            expires_at: to_chrono(self.expires_at),
        }
    }
}

impl ChatMessageDoc {
    fn into_model(self) -> ChatMessage {
        ChatMessage {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: self.user_id,
            is_user_message: self.is_user_message,
            content: self.content,
            created_at: to_chrono(self.created_at),
        }
    }
}

impl MongoStorage {
    /// Connects, pings the server so a dead backend fails startup
    /// immediately, and ensures the uniqueness indexes exist.
    pub async fn connect(cfg: &StorageConfig) -> StorageResult<Self> {
        let client = Client::with_uri_str(&cfg.mongodb_uri).await.map_err(db_err)?;
        let db = client.database(&cfg.database);
        db.run_command(doc! { "ping": 1 }).await.map_err(db_err)?;

        let storage = Self::from_database(&db);
        storage.ensure_indexes().await?;
        tracing::info!(database = %cfg.database, "connected to MongoDB");
        Ok(storage)
    }

    fn from_database(db: &Database) -> Self {
        Self {
            users: db.collection("users"),
            locations: db.collection("locations"),
            practice_areas: db.collection("practiceAreas"),
            advocates: db.collection("advocates"),
            specialties: db.collection("advocateSpecialties"),
            reviews: db.collection("reviews"),
            connections: db.collection("connections"),
            chat_messages: db.collection("chatMessages"),
        }
    }

    async fn ensure_indexes(&self) -> StorageResult<()> {
        let unique_ci = |keys| {
            IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .collation(ci_collation())
                        .build(),
                )
                .build()
        };
        let unique = |keys| {
            IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build()
        };
        let plain = |keys| IndexModel::builder().keys(keys).build();

        self.users
            .create_indexes(vec![
                unique_ci(doc! { "username": 1 }),
                unique_ci(doc! { "email": 1 }),
            ])
            .await
            .map_err(db_err)?;

        self.advocates
            .create_indexes(vec![
                unique(doc! { "userId": 1 }),
                plain(doc! { "locationId": 1 }),
            ])
            .await
            .map_err(db_err)?;

        self.specialties
            .create_indexes(vec![unique(doc! { "advocateId": 1, "practiceAreaId": 1 })])
            .await
            .map_err(db_err)?;

        self.reviews
            .create_indexes(vec![plain(doc! { "advocateId": 1 })])
            .await
            .map_err(db_err)?;

        self.chat_messages
            .create_indexes(vec![plain(doc! { "userId": 1, "createdAt": 1 })])
            .await
            .map_err(db_err)?;

        Ok(())
    }

    async fn find_user(&self, field: &str, value: &str) -> StorageResult<Option<User>> {
        let found = self
            .users
            .find_one(doc! { field: value })
            .collation(ci_collation())
            .await
            .map_err(db_err)?;
        Ok(found.map(UserDoc::into_model))
    }

    async fn details_for(&self, advocate: Advocate) -> StorageResult<Option<AdvocateDetails>> {
        let Some(user) = self.get_user(&advocate.user_id).await? else {
            return Ok(None);
        };
        let Some(location) = self.get_location(&advocate.location_id).await? else {
            return Ok(None);
        };
        let specialties = self.advocate_specialties(&advocate.id).await?;

        Ok(Some(AdvocateDetails {
            user: ContactCard {
                full_name: user.full_name,
                email: user.email,
                phone: user.phone,
            },
            location,
            specialties,
            advocate,
        }))
    }

    async fn recompute_rating(&self, advocate_id: ObjectId) -> StorageResult<()> {
        let docs: Vec<ReviewDoc> = self
            .reviews
            .find(doc! { "advocateId": advocate_id })
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;
        let ratings: Vec<i32> = docs.iter().map(|r| r.rating).collect();
        let (rating, count) = aggregate_rating(&ratings);

        self.advocates
            .update_one(
                doc! { "_id": advocate_id },
                doc! { "$set": { "rating": rating, "reviewCount": count } },
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl Storage for MongoStorage {
    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let mut doc = UserDoc {
            id: None,
            username: user.username,
            password: user.password,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            role: user.role,
            created_at: to_bson_date(Utc::now()),
        };
        let result = self.users.insert_one(&doc).await.map_err(write_err)?;
        doc.id = result.inserted_id.as_object_id();
        Ok(doc.into_model())
    }

    async fn get_user(&self, id: &str) -> StorageResult<Option<User>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        let found = self
            .users
            .find_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?;
        Ok(found.map(UserDoc::into_model))
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        self.find_user("username", username).await
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        self.find_user("email", email).await
    }

    async fn user_count(&self) -> StorageResult<u64> {
        self.users.estimated_document_count().await.map_err(db_err)
    }

    async fn create_location(&self, location: NewLocation) -> StorageResult<Location> {
        let mut doc = LocationDoc {
            id: None,
            city: location.city,
            state: location.state,
            pincode: location.pincode,
        };
        let result = self.locations.insert_one(&doc).await.map_err(db_err)?;
        doc.id = result.inserted_id.as_object_id();
        Ok(doc.into_model())
    }

    async fn get_location(&self, id: &str) -> StorageResult<Option<Location>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        let found = self
            .locations
            .find_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?;
        Ok(found.map(LocationDoc::into_model))
    }

    async fn all_locations(&self) -> StorageResult<Vec<Location>> {
        let docs: Vec<LocationDoc> = self
            .locations
            .find(doc! {})
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;
        Ok(docs.into_iter().map(LocationDoc::into_model).collect())
    }

    async fn create_practice_area(&self, name: &str) -> StorageResult<PracticeArea> {
        let mut doc = PracticeAreaDoc {
            id: None,
            name: name.to_string(),
        };
        let result = self.practice_areas.insert_one(&doc).await.map_err(db_err)?;
        doc.id = result.inserted_id.as_object_id();
        Ok(doc.into_model())
    }

    async fn get_practice_area(&self, id: &str) -> StorageResult<Option<PracticeArea>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        let found = self
            .practice_areas
            .find_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?;
        Ok(found.map(PracticeAreaDoc::into_model))
    }

    async fn all_practice_areas(&self) -> StorageResult<Vec<PracticeArea>> {
        let docs: Vec<PracticeAreaDoc> = self
            .practice_areas
            .find(doc! {})
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;
        Ok(docs.into_iter().map(PracticeAreaDoc::into_model).collect())
    }

    async fn create_advocate(&self, advocate: NewAdvocate) -> StorageResult<Advocate> {
        let user_id = ObjectId::parse_str(&advocate.user_id)
            .map_err(|e| StorageError::Backend(e.into()))?;
        let location_id = ObjectId::parse_str(&advocate.location_id)
            .map_err(|e| StorageError::Backend(e.into()))?;

        let mut doc = AdvocateDoc {
            id: None,
            user_id,
            location_id,
            bio: advocate.bio,
            experience: advocate.experience,
            bar_council_number: advocate.bar_council_number,
            image_url: advocate.image_url,
            rating: 0.0,
            review_count: 0,
            verified: advocate.verified,
        };
        let result = self.advocates.insert_one(&doc).await.map_err(write_err)?;
        doc.id = result.inserted_id.as_object_id();
        Ok(doc.into_model())
    }

    async fn get_advocate(&self, id: &str) -> StorageResult<Option<Advocate>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        let found = self
            .advocates
            .find_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?;
        Ok(found.map(AdvocateDoc::into_model))
    }

    async fn get_advocate_by_user(&self, user_id: &str) -> StorageResult<Option<Advocate>> {
        let Ok(oid) = ObjectId::parse_str(user_id) else {
            return Ok(None);
        };
        let found = self
            .advocates
            .find_one(doc! { "userId": oid })
            .await
            .map_err(db_err)?;
        Ok(found.map(AdvocateDoc::into_model))
    }

    async fn advocate_details(&self, id: &str) -> StorageResult<Option<AdvocateDetails>> {
        match self.get_advocate(id).await? {
            Some(advocate) => self.details_for(advocate).await,
            None => Ok(None),
        }
    }

    async fn all_advocate_details(&self) -> StorageResult<Vec<AdvocateDetails>> {
        let docs: Vec<AdvocateDoc> = self
            .advocates
            .find(doc! {})
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;

        let mut details = Vec::with_capacity(docs.len());
        for doc in docs {
            if let Some(d) = self.details_for(doc.into_model()).await? {
                details.push(d);
            }
        }
        Ok(details)
    }

    async fn advocates_by_filter(
        &self,
        filter: &AdvocateFilter,
    ) -> StorageResult<Vec<AdvocateDetails>> {
        // Filtering runs over the joined view, same semantics as the
        // in-memory backend.
        Ok(filter.apply(self.all_advocate_details().await?))
    }

    async fn add_specialty(
        &self,
        advocate_id: &str,
        practice_area_id: &str,
    ) -> StorageResult<AdvocateSpecialty> {
        let advocate_oid = ObjectId::parse_str(advocate_id)
            .map_err(|e| StorageError::Backend(e.into()))?;
        let area_oid = ObjectId::parse_str(practice_area_id)
            .map_err(|e| StorageError::Backend(e.into()))?;
        let pair = doc! { "advocateId": advocate_oid, "practiceAreaId": area_oid };

        if let Some(existing) = self
            .specialties
            .find_one(pair.clone())
            .await
            .map_err(db_err)?
        {
            return Ok(existing.into_model());
        }

        let mut doc = SpecialtyDoc {
            id: None,
            advocate_id: advocate_oid,
            practice_area_id: area_oid,
        };
        match self.specialties.insert_one(&doc).await {
            Ok(result) => {
                doc.id = result.inserted_id.as_object_id();
                Ok(doc.into_model())
            }
            // A concurrent insert won the race; the unique index holds.
            Err(err) => match write_err(err) {
                StorageError::Duplicate { .. } => {
                    let existing = self
                        .specialties
                        .find_one(pair)
                        .await
                        .map_err(db_err)?
                        .ok_or_else(|| {
                            StorageError::Backend(anyhow::anyhow!(
                                "specialty vanished after duplicate-key insert"
                            ))
                        })?;
                    Ok(existing.into_model())
                }
                other => Err(other),
            },
        }
    }

    async fn advocate_specialties(&self, advocate_id: &str) -> StorageResult<Vec<PracticeArea>> {
        let Ok(oid) = ObjectId::parse_str(advocate_id) else {
            return Ok(Vec::new());
        };
        let links: Vec<SpecialtyDoc> = self
            .specialties
            .find(doc! { "advocateId": oid })
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;

        let mut areas = Vec::with_capacity(links.len());
        for link in links {
            if let Some(area) = self
                .practice_areas
                .find_one(doc! { "_id": link.practice_area_id })
                .await
                .map_err(db_err)?
            {
                areas.push(area.into_model());
            }
        }
        Ok(areas)
    }

    async fn create_review(&self, review: NewReview) -> StorageResult<Review> {
        let advocate_oid = ObjectId::parse_str(&review.advocate_id)
            .map_err(|e| StorageError::Backend(e.into()))?;
        let user_oid = ObjectId::parse_str(&review.user_id)
            .map_err(|e| StorageError::Backend(e.into()))?;

        let mut doc = ReviewDoc {
            id: None,
            advocate_id: advocate_oid,
            user_id: user_oid,
            rating: review.rating,
            content: review.content,
            created_at: to_bson_date(Utc::now()),
        };
        let result = self.reviews.insert_one(&doc).await.map_err(db_err)?;
        doc.id = result.inserted_id.as_object_id();

        self.recompute_rating(advocate_oid).await?;
        Ok(doc.into_model())
    }

    async fn reviews_for_advocate(&self, advocate_id: &str) -> StorageResult<Vec<Review>> {
        let Ok(oid) = ObjectId::parse_str(advocate_id) else {
            return Ok(Vec::new());
        };
        let docs: Vec<ReviewDoc> = self
            .reviews
            .find(doc! { "advocateId": oid })
            .sort(doc! { "createdAt": -1 })
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;
        Ok(docs.into_iter().map(ReviewDoc::into_model).collect())
    }

    async fn create_connection(&self, connection: NewConnection) -> StorageResult<Connection> {
        let advocate_oid = ObjectId::parse_str(&connection.advocate_id)
            .map_err(|e| StorageError::Backend(e.into()))?;
        let client_oid = ObjectId::parse_str(&connection.client_id)
            .map_err(|e| StorageError::Backend(e.into()))?;

        let created_at = Utc::now();
        let expires_at = connection
            .expires_at
            .unwrap_or(created_at + Duration::days(CONNECTION_VALIDITY_DAYS));

        let mut doc = ConnectionDoc {
            id: None,
            advocate_id: advocate_oid,
            client_id: client_oid,
            status: connection.status,
            payment_id: connection.payment_id,
            created_at: to_bson_date(created_at),
            expires_at: to_bson_date(expires_at),
        };
        let result = self.connections.insert_one(&doc).await.map_err(db_err)?;
        doc.id = result.inserted_id.as_object_id();
        Ok(doc.into_model())
    }

    async fn get_connection(&self, id: &str) -> StorageResult<Option<Connection>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        let found = self
            .connections
            .find_one(doc! { "_id": oid })
            .await
            .map_err(db_err)?;
        Ok(found.map(ConnectionDoc::into_model))
    }

    async fn connections_by_client(&self, client_id: &str) -> StorageResult<Vec<Connection>> {
        let Ok(oid) = ObjectId::parse_str(client_id) else {
            return Ok(Vec::new());
        };
        let docs: Vec<ConnectionDoc> = self
            .connections
            .find(doc! { "clientId": oid })
            .sort(doc! { "createdAt": -1 })
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;
        Ok(docs.into_iter().map(ConnectionDoc::into_model).collect())
    }

    async fn connections_by_advocate(&self, advocate_id: &str) -> StorageResult<Vec<Connection>> {
        let Ok(oid) = ObjectId::parse_str(advocate_id) else {
            return Ok(Vec::new());
        };
        let docs: Vec<ConnectionDoc> = self
            .connections
            .find(doc! { "advocateId": oid })
            .sort(doc! { "createdAt": -1 })
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;
        Ok(docs.into_iter().map(ConnectionDoc::into_model).collect())
    }

    async fn update_connection_status(
        &self,
        id: &str,
        status: ConnectionStatus,
        payment_id: Option<String>,
    ) -> StorageResult<Option<Connection>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let status_bson = bson::to_bson(&status)
            .map_err(|e| StorageError::Backend(e.into()))?;
        let mut set = doc! { "status": status_bson };
        if let Some(payment_id) = payment_id {
            set.insert("paymentId", Bson::String(payment_id));
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .connections
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
            .with_options(options)
            .await
            .map_err(db_err)?;
        Ok(updated.map(ConnectionDoc::into_model))
    }

    async fn create_chat_message(&self, message: NewChatMessage) -> StorageResult<ChatMessage> {
        let mut doc = ChatMessageDoc {
            id: None,
            user_id: message.user_id,
            is_user_message: message.is_user_message,
            content: message.content,
            created_at: to_bson_date(Utc::now()),
        };
        let result = self.chat_messages.insert_one(&doc).await.map_err(db_err)?;
        doc.id = result.inserted_id.as_object_id();
        Ok(doc.into_model())
    }

    async fn chat_history(&self, user_id: &str, limit: usize) -> StorageResult<Vec<ChatMessage>> {
        // Newest-first page from the index, then flipped back to
        // chronological order for the transcript.
        let mut find = self
            .chat_messages
            .find(doc! { "userId": user_id })
            .sort(doc! { "createdAt": -1, "_id": -1 });
        if limit > 0 {
            find = find.limit(limit as i64);
        }
        let mut docs: Vec<ChatMessageDoc> = find
            .await
            .map_err(db_err)?
            .try_collect()
            .await
            .map_err(db_err)?;
        docs.reverse();
        Ok(docs.into_iter().map(ChatMessageDoc::into_model).collect())
    }
}
