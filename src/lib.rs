pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

pub use api::routes::create_router;
pub use client::{
    AuthStore, Backend, BusinessInfo, BusinessRequests, Businesses, History, HttpBackend,
    ListRequest, LogNotifier, MemoryAuthStore, MemoryNotifier, Notifier, Receipts, Redeems,
    Resource, Rewards, Users,
};
pub use config::{AppConfig, ListSettings};
pub use error::AdminError;
pub use logic::{EmptyState, FetchOutcome, ListContext, ListController, ListView, MutationReceipt};
pub use model::*;
pub use store::{MemoryStore, Store};

/// Serve a seeded mock backend on the configured address until the process stops
pub async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    use axum::serve;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    let store = MemoryStore::new();
    seed::load_seed_data(&store, &config.admin).await?;

    let app = create_router().with_state(Arc::new(store));

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("mock loyalty backend listening on http://{}/api", bind_address);

    serve(listener, app).await?;

    Ok(())
}
