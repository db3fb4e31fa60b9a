//! Pluggable record storage.
//!
//! Handlers talk to [`Repository`]; the backend is either MongoDB or an
//! in-process map used for tests and local development.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::FindOptions;
use mongodb::Collection;
use nexus_core::error::AppError;
use nexus_core::models::{
    Client, FbrApiSettings, FbrSubmission, Invoice, SellerSettings, ServiceItem, Task, User,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use super::database::MongoDb;

/// A stored record type and where it lives.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;
    /// Document field holding the owning seller.
    const SELLER_FIELD: &'static str = "sellerId";
    /// Document field lists are sorted on, newest first.
    const SORT_FIELD: &'static str = "createdAt";

    fn id(&self) -> &str;
    fn seller_id(&self) -> &str;

    /// Keys no two records may share, mirroring the unique indexes created
    /// in MongoDB.
    fn unique_keys(&self) -> Vec<String> {
        Vec::new()
    }
}

macro_rules! seller_owned {
    ($ty:ty, $collection:literal) => {
        impl Entity for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> &str {
                &self.id
            }

            fn seller_id(&self) -> &str {
                &self.seller_id
            }
        }
    };
}

seller_owned!(Client, "clients");
seller_owned!(FbrSubmission, "fbrinvoices");
seller_owned!(ServiceItem, "services");
seller_owned!(Task, "tasks");

impl Entity for Invoice {
    const COLLECTION: &'static str = "invoices";

    fn id(&self) -> &str {
        &self.id
    }

    fn seller_id(&self) -> &str {
        &self.seller_id
    }

    /// `(sellerId, invoiceNumber)`.
    fn unique_keys(&self) -> Vec<String> {
        self.invoice_number
            .iter()
            .map(|number| format!("invoiceNumber:{}:{}", self.seller_id, number))
            .collect()
    }
}

impl Entity for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }

    fn seller_id(&self) -> &str {
        &self.seller_id
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![format!("email:{}", self.email)]
    }
}

impl Entity for SellerSettings {
    const COLLECTION: &'static str = "sellersettings";
    const SELLER_FIELD: &'static str = "_id";

    fn id(&self) -> &str {
        &self.id
    }

    fn seller_id(&self) -> &str {
        &self.id
    }
}

impl Entity for FbrApiSettings {
    const COLLECTION: &'static str = "fbrapisettings";
    const SELLER_FIELD: &'static str = "_id";
    const SORT_FIELD: &'static str = "updatedAt";

    fn id(&self) -> &str {
        &self.id
    }

    fn seller_id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Fails with `Conflict` when the id (or a unique key) is taken.
    async fn insert(&self, item: &T) -> Result<(), AppError>;
    async fn get(&self, seller_id: &str, id: &str) -> Result<Option<T>, AppError>;
    async fn list(&self, seller_id: &str) -> Result<Vec<T>, AppError>;
    /// Every record regardless of seller.
    async fn list_all(&self) -> Result<Vec<T>, AppError>;
    /// Replace by id within the item's seller. `false` when nothing matched.
    async fn replace(&self, item: &T) -> Result<bool, AppError>;
    async fn delete(&self, seller_id: &str, id: &str) -> Result<bool, AppError>;
    /// First record whose string `field` equals `value`, optionally within
    /// one seller.
    async fn find_one(
        &self,
        seller_id: Option<&str>,
        field: &str,
        value: &str,
    ) -> Result<Option<T>, AppError>;
}

pub struct MemoryRepository<T> {
    items: DashMap<String, (u64, T)>,
    /// Unique key -> id of the record holding it.
    keys: DashMap<String, String>,
    seq: AtomicU64,
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            items: DashMap::new(),
            keys: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }
}

fn conflict(collection: &str) -> AppError {
    AppError::Conflict(anyhow::anyhow!(
        "A {} record with the same key already exists",
        collection
    ))
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn field_matches(item: &T, field: &str, value: &str) -> bool {
        serde_json::to_value(item)
            .ok()
            .and_then(|v| v.get(field).and_then(|f| f.as_str()).map(|f| f == value))
            .unwrap_or(false)
    }

    /// Claim every key for `id`. Keys already held by `id` count as claimed.
    /// On conflict the keys taken by this call are released again.
    fn claim_keys(&self, id: &str, keys: &[String]) -> Result<Vec<String>, AppError> {
        use dashmap::mapref::entry::Entry;

        let mut claimed = Vec::new();
        for key in keys {
            // The entry guard must be gone before releasing, which locks the
            // same map.
            let taken = match self.keys.entry(key.clone()) {
                Entry::Occupied(holder) => holder.get() != id,
                Entry::Vacant(slot) => {
                    slot.insert(id.to_string());
                    claimed.push(key.clone());
                    false
                }
            };
            if taken {
                self.release_keys(id, &claimed);
                return Err(conflict(T::COLLECTION));
            }
        }
        Ok(claimed)
    }

    fn release_keys(&self, id: &str, keys: &[String]) {
        for key in keys {
            self.keys.remove_if(key, |_, holder| holder == id);
        }
    }

    fn collect<F>(&self, keep: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        let mut rows: Vec<(u64, T)> = self
            .items
            .iter()
            .filter(|entry| keep(&entry.value().1))
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.into_iter().map(|(_, item)| item).collect()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn insert(&self, item: &T) -> Result<(), AppError> {
        use dashmap::mapref::entry::Entry;

        if self.items.contains_key(item.id()) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Record {} already exists",
                item.id()
            )));
        }
        let claimed = self.claim_keys(item.id(), &item.unique_keys())?;

        match self.items.entry(item.id().to_string()) {
            Entry::Occupied(_) => {
                self.release_keys(item.id(), &claimed);
                Err(AppError::Conflict(anyhow::anyhow!(
                    "Record {} already exists",
                    item.id()
                )))
            }
            Entry::Vacant(slot) => {
                let seq = self.seq.fetch_add(1, Ordering::SeqCst);
                slot.insert((seq, item.clone()));
                Ok(())
            }
        }
    }

    async fn get(&self, seller_id: &str, id: &str) -> Result<Option<T>, AppError> {
        Ok(self
            .items
            .get(id)
            .filter(|entry| entry.value().1.seller_id() == seller_id)
            .map(|entry| entry.value().1.clone()))
    }

    async fn list(&self, seller_id: &str) -> Result<Vec<T>, AppError> {
        Ok(self.collect(|item| item.seller_id() == seller_id))
    }

    async fn list_all(&self) -> Result<Vec<T>, AppError> {
        Ok(self.collect(|_| true))
    }

    async fn replace(&self, item: &T) -> Result<bool, AppError> {
        let old_keys = match self.items.get(item.id()) {
            Some(entry) if entry.value().1.seller_id() == item.seller_id() => {
                entry.value().1.unique_keys()
            }
            _ => return Ok(false),
        };

        let new_keys = item.unique_keys();
        let claimed = self.claim_keys(item.id(), &new_keys)?;

        match self.items.get_mut(item.id()) {
            Some(mut entry) if entry.value().1.seller_id() == item.seller_id() => {
                entry.value_mut().1 = item.clone();
            }
            _ => {
                self.release_keys(item.id(), &claimed);
                return Ok(false);
            }
        }

        let stale: Vec<String> = old_keys
            .into_iter()
            .filter(|key| !new_keys.contains(key))
            .collect();
        self.release_keys(item.id(), &stale);
        Ok(true)
    }

    async fn delete(&self, seller_id: &str, id: &str) -> Result<bool, AppError> {
        match self
            .items
            .remove_if(id, |_, (_, item)| item.seller_id() == seller_id)
        {
            Some((_, (_, item))) => {
                self.release_keys(id, &item.unique_keys());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_one(
        &self,
        seller_id: Option<&str>,
        field: &str,
        value: &str,
    ) -> Result<Option<T>, AppError> {
        Ok(self
            .collect(|item| {
                seller_id.map_or(true, |s| item.seller_id() == s)
                    && Self::field_matches(item, field, value)
            })
            .into_iter()
            .next())
    }
}

pub struct MongoRepository<T: Entity> {
    collection: Collection<T>,
}

impl<T: Entity> MongoRepository<T> {
    pub fn new(db: &MongoDb) -> Self {
        Self {
            collection: db.database().collection(T::COLLECTION),
        }
    }

    fn scoped(seller_id: &str, id: &str) -> Document {
        let mut filter = doc! { "_id": id };
        filter.insert(T::SELLER_FIELD, seller_id);
        filter
    }

    fn newest_first() -> FindOptions {
        let mut sort = Document::new();
        sort.insert(T::SORT_FIELD, -1);
        FindOptions::builder().sort(sort).build()
    }

    async fn find_many(&self, filter: Document) -> Result<Vec<T>, AppError> {
        let cursor = self
            .collection
            .find(filter, Self::newest_first())
            .await
            .map_err(AppError::from)?;
        cursor.try_collect().await.map_err(AppError::from)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == 11000
    )
}

#[async_trait]
impl<T: Entity> Repository<T> for MongoRepository<T> {
    async fn insert(&self, item: &T) -> Result<(), AppError> {
        match self.collection.insert_one(item, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(conflict(T::COLLECTION)),
            Err(e) => Err(AppError::from(e)),
        }
    }

    async fn get(&self, seller_id: &str, id: &str) -> Result<Option<T>, AppError> {
        self.collection
            .find_one(Self::scoped(seller_id, id), None)
            .await
            .map_err(AppError::from)
    }

    async fn list(&self, seller_id: &str) -> Result<Vec<T>, AppError> {
        let mut filter = Document::new();
        filter.insert(T::SELLER_FIELD, seller_id);
        self.find_many(filter).await
    }

    async fn list_all(&self) -> Result<Vec<T>, AppError> {
        self.find_many(Document::new()).await
    }

    async fn replace(&self, item: &T) -> Result<bool, AppError> {
        let result = self
            .collection
            .replace_one(Self::scoped(item.seller_id(), item.id()), item, None)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    conflict(T::COLLECTION)
                } else {
                    AppError::from(e)
                }
            })?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, seller_id: &str, id: &str) -> Result<bool, AppError> {
        let result = self
            .collection
            .delete_one(Self::scoped(seller_id, id), None)
            .await
            .map_err(AppError::from)?;
        Ok(result.deleted_count > 0)
    }

    async fn find_one(
        &self,
        seller_id: Option<&str>,
        field: &str,
        value: &str,
    ) -> Result<Option<T>, AppError> {
        let mut filter = Document::new();
        filter.insert(field, value);
        if let Some(seller_id) = seller_id {
            filter.insert(T::SELLER_FIELD, seller_id);
        }
        self.collection
            .find_one(filter, None)
            .await
            .map_err(AppError::from)
    }
}
