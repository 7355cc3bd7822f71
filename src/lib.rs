pub mod app;
pub mod auth;
pub mod chatbot;
pub mod config;
pub mod handlers;
pub mod payments;
pub mod storage;
pub mod utils;
