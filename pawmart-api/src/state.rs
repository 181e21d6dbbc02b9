use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use pawmart_order::CheckoutProcessor;
use pawmart_store::{save_snapshot, EventBus, SharedStore, SnapshotRepository, Storefront};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub events: EventBus,
    pub checkout: Arc<CheckoutProcessor>,
    /// `None` keeps everything in memory
    pub snapshots: Option<Arc<dyn SnapshotRepository>>,
    pub auth: AuthConfig,
    /// Held from snapshot to save so a stale snapshot never lands last
    persist_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        storefront: Storefront,
        checkout: CheckoutProcessor,
        snapshots: Option<Arc<dyn SnapshotRepository>>,
        auth: AuthConfig,
    ) -> Self {
        let events = storefront.events().clone();
        Self {
            store: Arc::new(RwLock::new(storefront)),
            events,
            checkout: Arc::new(checkout),
            snapshots,
            auth,
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Write a snapshot after a mutation; failures are logged, not returned
    pub async fn persist(&self) {
        if let Some(repository) = &self.snapshots {
            let _guard = self.persist_lock.lock().await;
            if let Err(e) = save_snapshot(&self.store, repository.as_ref()).await {
                tracing::error!("Failed to save snapshot: {}", e);
            }
        }
    }
}
