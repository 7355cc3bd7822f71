use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nyayasetu_api::app;
use nyayasetu_api::auth::SessionStore;
use nyayasetu_api::config::{Settings, StorageBackend};
use nyayasetu_api::payments::RazorpayClient;
use nyayasetu_api::storage::{seed, DynStorage, MemoryStorage, MongoStorage};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,nyayasetu_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    tracing::info!(backend = ?settings.storage.backend, "starting NyayaSetu API");

    let storage: DynStorage = match settings.storage.backend {
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::Mongodb => Arc::new(MongoStorage::connect(&settings.storage).await?),
    };

    if settings.storage.seed_demo_data {
        seed::populate(storage.as_ref()).await?;
    }

    let sessions = Arc::new(SessionStore::new(
        &settings.session,
        settings.server.production,
    ));
    let gateway = Arc::new(RazorpayClient::new(&settings.payment));

    let router = app::router(storage, sessions, gateway, settings.clone());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, router).await?;

    Ok(())
}
