use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;

use super::filter::AdvocateFilter;
use super::models::*;
use super::{aggregate_rating, Storage, StorageError, StorageResult};

/// Volatile map-backed backend with integer-counter identifiers. Each
/// entity map carries its own lock so a read observes a complete write
/// on the multi-threaded runtime.
#[derive(Default)]
pub struct MemoryStorage {
    users: RwLock<HashMap<String, User>>,
    locations: RwLock<HashMap<String, Location>>,
    practice_areas: RwLock<HashMap<String, PracticeArea>>,
    advocates: RwLock<HashMap<String, Advocate>>,
    specialties: RwLock<HashMap<String, AdvocateSpecialty>>,
    reviews: RwLock<HashMap<String, Review>>,
    connections: RwLock<HashMap<String, Connection>>,
    chat_messages: RwLock<HashMap<String, ChatMessage>>,

    user_seq: AtomicU64,
    location_seq: AtomicU64,
    practice_area_seq: AtomicU64,
    advocate_seq: AtomicU64,
    specialty_seq: AtomicU64,
    review_seq: AtomicU64,
    connection_seq: AtomicU64,
    chat_message_seq: AtomicU64,
}

fn next_id(seq: &AtomicU64) -> String {
    (seq.fetch_add(1, Ordering::Relaxed) + 1).to_string()
}

/// Numeric sort key; ids are decimal counter strings.
fn id_key(id: &str) -> u64 {
    id.parse().unwrap_or(u64::MAX)
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_details(&self, advocate: &Advocate) -> Option<AdvocateDetails> {
        let users = self.users.read();
        let user = users.get(&advocate.user_id)?;
        let locations = self.locations.read();
        let location = locations.get(&advocate.location_id)?;

        Some(AdvocateDetails {
            advocate: advocate.clone(),
            user: ContactCard {
                full_name: user.full_name.clone(),
                email: user.email.clone(),
                phone: user.phone.clone(),
            },
            location: location.clone(),
            specialties: self.specialty_names(&advocate.id),
        })
    }

    fn specialty_names(&self, advocate_id: &str) -> Vec<PracticeArea> {
        let specialties = self.specialties.read();
        let areas = self.practice_areas.read();
        let mut linked: Vec<&AdvocateSpecialty> = specialties
            .values()
            .filter(|s| s.advocate_id == advocate_id)
            .collect();
        linked.sort_by_key(|s| id_key(&s.id));
        linked
            .iter()
            .filter_map(|s| areas.get(&s.practice_area_id).cloned())
            .collect()
    }

    fn recompute_rating(&self, advocate_id: &str) {
        let ratings: Vec<i32> = {
            let reviews = self.reviews.read();
            reviews
                .values()
                .filter(|r| r.advocate_id == advocate_id)
                .map(|r| r.rating)
                .collect()
        };
        let (rating, count) = aggregate_rating(&ratings);

        let mut advocates = self.advocates.write();
        if let Some(advocate) = advocates.get_mut(advocate_id) {
            advocate.rating = rating;
            advocate.review_count = count;
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let mut users = self.users.write();
        let username = user.username.to_lowercase();
        let email = user.email.to_lowercase();
        if users.values().any(|u| u.username.to_lowercase() == username) {
            return Err(StorageError::Duplicate { field: "username" });
        }
        if users.values().any(|u| u.email.to_lowercase() == email) {
            return Err(StorageError::Duplicate { field: "email" });
        }

        let record = User {
            id: next_id(&self.user_seq),
            username: user.username,
            password: user.password,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            role: user.role,
            created_at: Utc::now(),
        };
        users.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_user(&self, id: &str) -> StorageResult<Option<User>> {
        Ok(self.users.read().get(id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let username = username.to_lowercase();
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.username.to_lowercase() == username)
            .cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn user_count(&self) -> StorageResult<u64> {
        Ok(self.users.read().len() as u64)
    }

    async fn create_location(&self, location: NewLocation) -> StorageResult<Location> {
        let record = Location {
            id: next_id(&self.location_seq),
            city: location.city,
            state: location.state,
            pincode: location.pincode,
        };
        self.locations
            .write()
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_location(&self, id: &str) -> StorageResult<Option<Location>> {
        Ok(self.locations.read().get(id).cloned())
    }

    async fn all_locations(&self) -> StorageResult<Vec<Location>> {
        let mut locations: Vec<Location> = self.locations.read().values().cloned().collect();
        locations.sort_by_key(|l| id_key(&l.id));
        Ok(locations)
    }

    async fn create_practice_area(&self, name: &str) -> StorageResult<PracticeArea> {
        let record = PracticeArea {
            id: next_id(&self.practice_area_seq),
            name: name.to_string(),
        };
        self.practice_areas
            .write()
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_practice_area(&self, id: &str) -> StorageResult<Option<PracticeArea>> {
        Ok(self.practice_areas.read().get(id).cloned())
    }

    async fn all_practice_areas(&self) -> StorageResult<Vec<PracticeArea>> {
        let mut areas: Vec<PracticeArea> =
            self.practice_areas.read().values().cloned().collect();
        areas.sort_by_key(|a| id_key(&a.id));
        Ok(areas)
    }

    async fn create_advocate(&self, advocate: NewAdvocate) -> StorageResult<Advocate> {
        let mut advocates = self.advocates.write();
        if advocates.values().any(|a| a.user_id == advocate.user_id) {
            return Err(StorageError::Duplicate { field: "userId" });
        }

        let record = Advocate {
            id: next_id(&self.advocate_seq),
            user_id: advocate.user_id,
            location_id: advocate.location_id,
            bio: advocate.bio,
            experience: advocate.experience,
            bar_council_number: advocate.bar_council_number,
            image_url: advocate.image_url,
            rating: 0.0,
            review_count: 0,
            verified: advocate.verified,
        };
        advocates.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_advocate(&self, id: &str) -> StorageResult<Option<Advocate>> {
        Ok(self.advocates.read().get(id).cloned())
    }

    async fn get_advocate_by_user(&self, user_id: &str) -> StorageResult<Option<Advocate>> {
        Ok(self
            .advocates
            .read()
            .values()
            .find(|a| a.user_id == user_id)
            .cloned())
    }

    async fn advocate_details(&self, id: &str) -> StorageResult<Option<AdvocateDetails>> {
        let advocate = match self.advocates.read().get(id).cloned() {
            Some(advocate) => advocate,
            None => return Ok(None),
        };
        Ok(self.build_details(&advocate))
    }

    async fn all_advocate_details(&self) -> StorageResult<Vec<AdvocateDetails>> {
        let mut advocates: Vec<Advocate> = self.advocates.read().values().cloned().collect();
        advocates.sort_by_key(|a| id_key(&a.id));
        Ok(advocates
            .iter()
            .filter_map(|a| self.build_details(a))
            .collect())
    }

    async fn advocates_by_filter(
        &self,
        filter: &AdvocateFilter,
    ) -> StorageResult<Vec<AdvocateDetails>> {
        Ok(filter.apply(self.all_advocate_details().await?))
    }

    async fn add_specialty(
        &self,
        advocate_id: &str,
        practice_area_id: &str,
    ) -> StorageResult<AdvocateSpecialty> {
        let mut specialties = self.specialties.write();
        if let Some(existing) = specialties
            .values()
            .find(|s| s.advocate_id == advocate_id && s.practice_area_id == practice_area_id)
        {
            return Ok(existing.clone());
        }

        let record = AdvocateSpecialty {
            id: next_id(&self.specialty_seq),
            advocate_id: advocate_id.to_string(),
            practice_area_id: practice_area_id.to_string(),
        };
        specialties.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn advocate_specialties(&self, advocate_id: &str) -> StorageResult<Vec<PracticeArea>> {
        Ok(self.specialty_names(advocate_id))
    }

    async fn create_review(&self, review: NewReview) -> StorageResult<Review> {
        let record = Review {
            id: next_id(&self.review_seq),
            advocate_id: review.advocate_id,
            user_id: review.user_id,
            rating: review.rating,
            content: review.content,
            created_at: Utc::now(),
        };
        self.reviews
            .write()
            .insert(record.id.clone(), record.clone());

        self.recompute_rating(&record.advocate_id);
        Ok(record)
    }

    async fn reviews_for_advocate(&self, advocate_id: &str) -> StorageResult<Vec<Review>> {
        let mut reviews: Vec<Review> = self
            .reviews
            .read()
            .values()
            .filter(|r| r.advocate_id == advocate_id)
            .cloned()
            .collect();
        // Newest first, matching the document backend's sort.
        reviews.sort_by_key(|r| std::cmp::Reverse(id_key(&r.id)));
        Ok(reviews)
    }

    async fn create_connection(&self, connection: NewConnection) -> StorageResult<Connection> {
        let created_at = Utc::now();
        let record = Connection {
            id: next_id(&self.connection_seq),
            advocate_id: connection.advocate_id,
            client_id: connection.client_id,
            status: connection.status,
            payment_id: connection.payment_id,
            created_at,
            expires_at: connection
                .expires_at
                .unwrap_or(created_at + Duration::days(CONNECTION_VALIDITY_DAYS)),
        };
        self.connections
            .write()
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_connection(&self, id: &str) -> StorageResult<Option<Connection>> {
        Ok(self.connections.read().get(id).cloned())
    }

    async fn connections_by_client(&self, client_id: &str) -> StorageResult<Vec<Connection>> {
        let mut connections: Vec<Connection> = self
            .connections
            .read()
            .values()
            .filter(|c| c.client_id == client_id)
            .cloned()
            .collect();
        connections.sort_by_key(|c| std::cmp::Reverse(id_key(&c.id)));
        Ok(connections)
    }

    async fn connections_by_advocate(&self, advocate_id: &str) -> StorageResult<Vec<Connection>> {
        let mut connections: Vec<Connection> = self
            .connections
            .read()
            .values()
            .filter(|c| c.advocate_id == advocate_id)
            .cloned()
            .collect();
        connections.sort_by_key(|c| std::cmp::Reverse(id_key(&c.id)));
        Ok(connections)
    }

    async fn update_connection_status(
        &self,
        id: &str,
        status: ConnectionStatus,
        payment_id: Option<String>,
    ) -> StorageResult<Option<Connection>> {
        let mut connections = self.connections.write();
        let Some(connection) = connections.get_mut(id) else {
            return Ok(None);
        };
        connection.status = status;
        if payment_id.is_some() {
            connection.payment_id = payment_id;
        }
        Ok(Some(connection.clone()))
    }

    async fn create_chat_message(&self, message: NewChatMessage) -> StorageResult<ChatMessage> {
        let record = ChatMessage {
            id: next_id(&self.chat_message_seq),
            user_id: message.user_id,
            is_user_message: message.is_user_message,
            content: message.content,
            created_at: Utc::now(),
        };
        self.chat_messages
            .write()
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn chat_history(&self, user_id: &str, limit: usize) -> StorageResult<Vec<ChatMessage>> {
        let mut messages: Vec<ChatMessage> = self
            .chat_messages
            .read()
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        // Insertion order; timestamps alone can collide within a millisecond.
        messages.sort_by_key(|m| id_key(&m.id));
        if limit > 0 && messages.len() > limit {
            messages.drain(..messages.len() - limit);
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "hashed".to_string(),
            email: email.to_string(),
            full_name: format!("User {}", username),
            phone: None,
            role: Role::Client,
        }
    }

    async fn seed_advocate(storage: &MemoryStorage, username: &str) -> Advocate {
        let user = storage
            .create_user(NewUser {
                role: Role::Advocate,
                ..new_user(username, &format!("{}@example.com", username))
            })
            .await
            .unwrap();
        let location = storage
            .create_location(NewLocation {
                city: "New Delhi".into(),
                state: "Delhi".into(),
                pincode: Some("110001".into()),
            })
            .await
            .unwrap();
        storage
            .create_advocate(NewAdvocate {
                user_id: user.id,
                location_id: location.id,
                bio: "Criminal defense".into(),
                experience: 10,
                bar_council_number: "DL/123/2010".into(),
                image_url: None,
                verified: true,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn verified_flag_is_taken_from_the_insert() {
        let storage = MemoryStorage::new();
        let advocate = seed_advocate(&storage, "adv").await;
        assert!(advocate.verified);

        let details = storage
            .advocate_details(&advocate.id)
            .await
            .unwrap()
            .unwrap();
        assert!(details.advocate.verified);
    }

    #[tokio::test]
    async fn username_and_email_lookups_are_case_insensitive() {
        let storage = MemoryStorage::new();
        let created = storage
            .create_user(new_user("Alice", "Alice@X.com"))
            .await
            .unwrap();

        let by_username = storage.get_user_by_username("aLiCe").await.unwrap().unwrap();
        let by_email = storage.get_user_by_email("alice@x.COM").await.unwrap().unwrap();
        assert_eq!(by_username.id, created.id);
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_without_a_second_record() {
        let storage = MemoryStorage::new();
        storage
            .create_user(new_user("alice", "alice@x.com"))
            .await
            .unwrap();

        let err = storage
            .create_user(new_user("ALICE", "other@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { field: "username" }));
        assert_eq!(storage.user_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn new_advocate_has_zero_rating_and_count() {
        let storage = MemoryStorage::new();
        let advocate = seed_advocate(&storage, "adv").await;

        let details = storage
            .advocate_details(&advocate.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.advocate.rating, 0.0);
        assert_eq!(details.advocate.review_count, 0);
    }

    #[tokio::test]
    async fn rating_recomputes_after_each_review() {
        let storage = MemoryStorage::new();
        let advocate = seed_advocate(&storage, "adv").await;
        let client = storage
            .create_user(new_user("client", "client@x.com"))
            .await
            .unwrap();

        storage
            .create_review(NewReview {
                advocate_id: advocate.id.clone(),
                user_id: client.id.clone(),
                rating: 4,
                content: None,
            })
            .await
            .unwrap();
        let after_first = storage.get_advocate(&advocate.id).await.unwrap().unwrap();
        assert_eq!(after_first.rating, 4.0);
        assert_eq!(after_first.review_count, 1);

        storage
            .create_review(NewReview {
                advocate_id: advocate.id.clone(),
                user_id: client.id,
                rating: 2,
                content: Some("Average".into()),
            })
            .await
            .unwrap();
        let after_second = storage.get_advocate(&advocate.id).await.unwrap().unwrap();
        assert_eq!(after_second.rating, 3.0);
        assert_eq!(after_second.review_count, 2);
    }

    #[tokio::test]
    async fn specialty_join_is_idempotent() {
        let storage = MemoryStorage::new();
        let advocate = seed_advocate(&storage, "adv").await;
        let area = storage.create_practice_area("Family Law").await.unwrap();

        let first = storage.add_specialty(&advocate.id, &area.id).await.unwrap();
        let second = storage.add_specialty(&advocate.id, &area.id).await.unwrap();
        assert_eq!(first.id, second.id);

        let specialties = storage.advocate_specialties(&advocate.id).await.unwrap();
        assert_eq!(specialties.len(), 1);
        assert_eq!(specialties[0].name, "Family Law");
    }

    #[tokio::test]
    async fn connection_expires_thirty_days_after_creation() {
        let storage = MemoryStorage::new();
        let connection = storage
            .create_connection(NewConnection {
                advocate_id: "5".into(),
                client_id: "9".into(),
                status: ConnectionStatus::Pending,
                payment_id: None,
                expires_at: None,
            })
            .await
            .unwrap();

        assert_eq!(
            connection.expires_at - connection.created_at,
            Duration::days(30)
        );
    }

    #[tokio::test]
    async fn explicit_expiry_override_is_kept() {
        let storage = MemoryStorage::new();
        let expires_at = Utc::now() + Duration::days(7);
        let connection = storage
            .create_connection(NewConnection {
                advocate_id: "1".into(),
                client_id: "2".into(),
                status: ConnectionStatus::Pending,
                payment_id: None,
                expires_at: Some(expires_at),
            })
            .await
            .unwrap();
        assert_eq!(connection.expires_at, expires_at);
    }

    #[tokio::test]
    async fn connection_activation_records_payment_id() {
        let storage = MemoryStorage::new();
        let connection = storage
            .create_connection(NewConnection {
                advocate_id: "1".into(),
                client_id: "2".into(),
                status: ConnectionStatus::Pending,
                payment_id: None,
                expires_at: None,
            })
            .await
            .unwrap();

        let updated = storage
            .update_connection_status(
                &connection.id,
                ConnectionStatus::Active,
                Some("pay_123".into()),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ConnectionStatus::Active);
        assert_eq!(updated.payment_id.as_deref(), Some("pay_123"));
    }

    #[tokio::test]
    async fn dangling_user_reference_yields_absence_not_error() {
        let storage = MemoryStorage::new();
        let location = storage
            .create_location(NewLocation {
                city: "Mumbai".into(),
                state: "Maharashtra".into(),
                pincode: None,
            })
            .await
            .unwrap();
        storage
            .create_advocate(NewAdvocate {
                user_id: "404".into(),
                location_id: location.id,
                bio: "orphan".into(),
                experience: 1,
                bar_council_number: "MH/1/2020".into(),
                image_url: None,
                verified: false,
            })
            .await
            .unwrap();

        assert!(storage.advocate_details("1").await.unwrap().is_none());
        assert!(storage.all_advocate_details().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_advocate_lookup_returns_none() {
        let storage = MemoryStorage::new();
        assert!(storage.advocate_details("12345").await.unwrap().is_none());
        assert!(storage.get_advocate("not-a-number").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn chat_history_is_chronological_with_tail_limit() {
        let storage = MemoryStorage::new();
        for i in 0..5 {
            storage
                .create_chat_message(NewChatMessage {
                    user_id: "7".into(),
                    is_user_message: i % 2 == 0,
                    content: format!("msg-{}", i),
                })
                .await
                .unwrap();
        }
        storage
            .create_chat_message(NewChatMessage {
                user_id: "8".into(),
                is_user_message: true,
                content: "other user".into(),
            })
            .await
            .unwrap();

        let full = storage.chat_history("7", 50).await.unwrap();
        assert_eq!(full.len(), 5);
        assert_eq!(full[0].content, "msg-0");
        assert_eq!(full[4].content, "msg-4");

        let tail = storage.chat_history("7", 2).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].content, "msg-3");
        assert_eq!(tail[1].content, "msg-4");
    }
}
