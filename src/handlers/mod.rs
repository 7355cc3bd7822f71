pub mod advocates;
pub mod auth;
pub mod chat;
pub mod connections;
pub mod health;
pub mod payments;
pub mod practice_areas;
pub mod reviews;
