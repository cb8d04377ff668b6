use crate::{
    database::{MongoDB, SCRAPES_COLLECTION},
    models::{ScrapeDocument, StudentRecord},
    utils::AppError,
};
use async_trait::async_trait;
use mongodb::bson::doc;

/// Persistent tier of the record cache.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First stored scrape for `username`, if any.
    async fn find_by_username(&self, username: &str) -> Result<Option<StudentRecord>, AppError>;

    async fn insert(&self, username: &str, record: &StudentRecord) -> Result<(), AppError>;
}

pub struct MongoRecordStore {
    db: MongoDB,
}

impl MongoRecordStore {
    pub fn new(db: MongoDB) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for MongoRecordStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<StudentRecord>, AppError> {
        let collection = self.db.collection::<ScrapeDocument>(SCRAPES_COLLECTION);

        let document = collection
            .find_one(doc! { "username": username })
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to look up {}: {}", username, e)))?;

        Ok(document.map(|d| d.data))
    }

    async fn insert(&self, username: &str, record: &StudentRecord) -> Result<(), AppError> {
        let collection = self.db.collection::<ScrapeDocument>(SCRAPES_COLLECTION);
        let document = ScrapeDocument::new(username, record.clone());

        let result = collection
            .insert_one(document)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to save {}: {}", username, e)))?;

        log::info!("💾 Saved scrape for {} ({})", username, result.inserted_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_insert_then_find_by_username() {
        let uri = std::env::var("DATABASE")
            .unwrap_or_else(|_| "mongodb://localhost:27017/scraping_test".to_string());
        let store = MongoRecordStore::new(MongoDB::new(&uri).await.unwrap());

        let username = format!("test-{}", chrono::Utc::now().timestamp_millis());
        assert_eq!(store.find_by_username(&username).await.unwrap(), None);

        let record = crate::services::testing::sample_record(&username);
        store.insert(&username, &record).await.unwrap();

        assert_eq!(store.find_by_username(&username).await.unwrap(), Some(record));
    }
}
