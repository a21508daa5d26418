use std::sync::Arc;

use wareflow_entitlements::EntitlementSource;
use wareflow_infra::{
    DirectoryStore, InMemoryDirectoryStore, InMemoryEntitlementStore, InMemoryInventoryStore,
    InventoryStore,
};

#[cfg(feature = "postgres")]
use sqlx::PgPool;
#[cfg(feature = "postgres")]
use wareflow_infra::stores::{
    PostgresDirectoryStore, PostgresEntitlementSource, PostgresInventoryStore,
};

/// Store backend wiring for the HTTP layer.
pub enum AppServices {
    InMemory {
        directory: Arc<InMemoryDirectoryStore>,
        inventory: Arc<InMemoryInventoryStore>,
        entitlements: Arc<InMemoryEntitlementStore>,
    },
    #[cfg(feature = "postgres")]
    Postgres {
        directory: Arc<PostgresDirectoryStore>,
        inventory: Arc<PostgresInventoryStore>,
        entitlements: Arc<PostgresEntitlementSource>,
    },
}

impl AppServices {
    pub fn in_memory() -> Self {
        let directory = Arc::new(InMemoryDirectoryStore::new());
        let inventory = Arc::new(InMemoryInventoryStore::new());
        let entitlements = Arc::new(InMemoryEntitlementStore::new(
            directory.clone(),
            inventory.clone(),
        ));

        AppServices::InMemory {
            directory,
            inventory,
            entitlements,
        }
    }

    #[cfg(feature = "postgres")]
    pub async fn postgres(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPool::connect(database_url).await?;

        Ok(AppServices::Postgres {
            directory: Arc::new(PostgresDirectoryStore::new(pool.clone())),
            inventory: Arc::new(PostgresInventoryStore::new(pool.clone())),
            entitlements: Arc::new(PostgresEntitlementSource::new(pool)),
        })
    }

    pub fn directory(&self) -> &dyn DirectoryStore {
        match self {
            AppServices::InMemory { directory, .. } => directory.as_ref(),
            #[cfg(feature = "postgres")]
            AppServices::Postgres { directory, .. } => directory.as_ref(),
        }
    }

    pub fn inventory(&self) -> &dyn InventoryStore {
        match self {
            AppServices::InMemory { inventory, .. } => inventory.as_ref(),
            #[cfg(feature = "postgres")]
            AppServices::Postgres { inventory, .. } => inventory.as_ref(),
        }
    }

    pub fn entitlements(&self) -> &dyn EntitlementSource {
        match self {
            AppServices::InMemory { entitlements, .. } => entitlements.as_ref(),
            #[cfg(feature = "postgres")]
            AppServices::Postgres { entitlements, .. } => entitlements.as_ref(),
        }
    }
}

/// Build services from the environment.
pub async fn build_services() -> AppServices {
    #[cfg(feature = "postgres")]
    if let Ok(url) = std::env::var("DATABASE_URL") {
        match AppServices::postgres(&url).await {
            Ok(services) => return services,
            Err(err) => {
                tracing::error!(error = %err, "failed to connect to postgres; falling back to in-memory stores");
            }
        }
    }

    tracing::warn!("using in-memory stores; data does not survive restarts");
    AppServices::in_memory()
}
