use super::database::MongoDb;
use super::repository::{MemoryRepository, MongoRepository, Repository};
use nexus_core::error::AppError;
use nexus_core::models::{
    Client, FbrApiSettings, FbrSubmission, Invoice, SellerSettings, ServiceItem, Task, User,
};
use std::sync::Arc;

/// One repository per collection, all on the same backend.
#[derive(Clone)]
pub struct Store {
    pub clients: Arc<dyn Repository<Client>>,
    pub sellers: Arc<dyn Repository<SellerSettings>>,
    pub invoices: Arc<dyn Repository<Invoice>>,
    pub fbr_invoices: Arc<dyn Repository<FbrSubmission>>,
    pub fbr_settings: Arc<dyn Repository<FbrApiSettings>>,
    pub services: Arc<dyn Repository<ServiceItem>>,
    pub tasks: Arc<dyn Repository<Task>>,
    pub users: Arc<dyn Repository<User>>,
    db: Option<MongoDb>,
}

impl Store {
    pub fn in_memory() -> Self {
        Self {
            clients: Arc::new(MemoryRepository::new()),
            sellers: Arc::new(MemoryRepository::new()),
            invoices: Arc::new(MemoryRepository::new()),
            fbr_invoices: Arc::new(MemoryRepository::new()),
            fbr_settings: Arc::new(MemoryRepository::new()),
            services: Arc::new(MemoryRepository::new()),
            tasks: Arc::new(MemoryRepository::new()),
            users: Arc::new(MemoryRepository::new()),
            db: None,
        }
    }

    pub fn mongo(db: MongoDb) -> Self {
        Self {
            clients: Arc::new(MongoRepository::new(&db)),
            sellers: Arc::new(MongoRepository::new(&db)),
            invoices: Arc::new(MongoRepository::new(&db)),
            fbr_invoices: Arc::new(MongoRepository::new(&db)),
            fbr_settings: Arc::new(MongoRepository::new(&db)),
            services: Arc::new(MongoRepository::new(&db)),
            tasks: Arc::new(MongoRepository::new(&db)),
            users: Arc::new(MongoRepository::new(&db)),
            db: Some(db),
        }
    }

    pub fn backend(&self) -> &'static str {
        if self.db.is_some() {
            "mongo"
        } else {
            "memory"
        }
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        match &self.db {
            Some(db) => db.health_check().await,
            None => Ok(()),
        }
    }

    /// The seller's profile, or `SELLER_SETTINGS_MISSING`.
    pub async fn seller_settings(&self, seller_id: &str) -> Result<SellerSettings, AppError> {
        self.sellers
            .get(seller_id, seller_id)
            .await?
            .ok_or_else(|| AppError::SellerSettingsMissing(seller_id.to_string()))
    }
}
