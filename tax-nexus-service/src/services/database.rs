use mongodb::{bson::doc, options::IndexOptions, Client as MongoClient, Database, IndexModel};
use nexus_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for tax-nexus-service");

        for collection in ["clients", "invoices", "fbrinvoices", "tasks", "users", "services"] {
            self.create_index(collection, doc! { "sellerId": 1 }, "seller_lookup", false)
                .await?;
        }

        self.create_index(
            "invoices",
            doc! { "sellerId": 1, "invoiceNumber": 1 },
            "seller_invoice_number_unique",
            true,
        )
        .await?;
        self.create_index(
            "fbrinvoices",
            doc! { "sellerId": 1, "invoiceId": 1 },
            "seller_invoice_lookup",
            false,
        )
        .await?;
        self.create_index("users", doc! { "email": 1 }, "email_unique", true)
            .await?;

        Ok(())
    }

    async fn create_index(
        &self,
        collection: &str,
        keys: mongodb::bson::Document,
        name: &str,
        unique: bool,
    ) -> Result<(), AppError> {
        let index = IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .name(name.to_string())
                    .unique(unique)
                    .build(),
            )
            .build();

        self.db
            .collection::<mongodb::bson::Document>(collection)
            .create_index(index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create {} index on {}: {}", name, collection, e);
                AppError::from(e)
            })?;
        tracing::info!(collection = %collection, index = %name, "Created index");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
