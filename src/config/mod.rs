pub mod settings;

pub use settings::{PaymentConfig, ServerConfig, SessionConfig, Settings, StorageBackend, StorageConfig};
