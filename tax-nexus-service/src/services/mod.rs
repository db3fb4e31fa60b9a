pub mod bulk;
pub mod database;
pub mod invoicing;
pub mod metrics;
pub mod repository;
pub mod store;

pub use bulk::BulkJobRegistry;
pub use database::MongoDb;
pub use invoicing::create_invoice;
pub use repository::{Entity, MemoryRepository, MongoRepository, Repository};
pub use store::Store;
