use crate::{
    api::metrics,
    models::StudentRecord,
    scraper::RecordScraper,
    services::record_store::RecordStore,
    utils::{AppError, TtlCache},
};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

type PendingScrape = Shared<BoxFuture<'static, Result<StudentRecord, AppError>>>;
type InFlight = Arc<Mutex<HashMap<String, PendingScrape>>>;

/// Read-through access to student records.
///
/// Lookup order is memory cache, then MongoDB, then a fresh portal scrape.
/// Concurrent misses for the same username share one scrape.
pub struct RecordService {
    memory: TtlCache<StudentRecord>,
    store: Arc<dyn RecordStore>,
    scraper: Arc<dyn RecordScraper>,
    in_flight: InFlight,
}

impl RecordService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        scraper: Arc<dyn RecordScraper>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            memory: TtlCache::new(cache_ttl),
            store,
            scraper,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.memory.len()
    }

    pub fn purge_expired(&self) -> usize {
        self.memory.purge_expired()
    }

    pub async fn get_record(&self, username: &str) -> Result<StudentRecord, AppError> {
        if let Some(record) = self.memory.get(username) {
            log::debug!("📦 Memory cache hit for {}", username);
            metrics::increment_memory_hits();
            return Ok(record);
        }

        if let Some(record) = self.store.find_by_username(username).await? {
            log::info!("🗄️  Loaded {} from MongoDB", username);
            metrics::increment_store_hits();
            self.memory.insert(username.to_string(), record.clone());
            return Ok(record);
        }

        self.scrape_once(username).await
    }

    /// Joins the scrape already running for `username` or starts one.
    async fn scrape_once(&self, username: &str) -> Result<StudentRecord, AppError> {
        let pending = {
            let mut in_flight = lock(&self.in_flight);

            // A scrape may have finished between the store miss and here
            if let Some(record) = self.memory.get(username) {
                metrics::increment_memory_hits();
                return Ok(record);
            }

            match in_flight.get(username) {
                Some(pending) => {
                    log::info!("🔗 Joining scrape already running for {}", username);
                    pending.clone()
                }
                None => {
                    let entry = InFlightEntry {
                        in_flight: Arc::clone(&self.in_flight),
                        username: username.to_string(),
                    };
                    // Spawned so the scrape finishes even if every waiter disconnects
                    let task = tokio::spawn(scrape_and_persist(
                        Arc::clone(&self.store),
                        Arc::clone(&self.scraper),
                        self.memory.clone(),
                        entry,
                    ));
                    let owner = username.to_string();
                    let pending = async move {
                        task.await.unwrap_or_else(|e| {
                            log::error!("❌ Scrape task for {} did not finish: {}", owner, e);
                            metrics::increment_scrape_failures();
                            Err(AppError::scrape_failed(&owner, e))
                        })
                    }
                    .boxed()
                    .shared();

                    in_flight.insert(username.to_string(), pending.clone());
                    pending
                }
            }
        };

        pending.await
    }
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, PendingScrape>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registration of one running scrape. Dropping it removes the entry, so the
/// map is cleared however the task ends: success, error, panic or abort.
struct InFlightEntry {
    in_flight: InFlight,
    username: String,
}

impl Drop for InFlightEntry {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.username);
    }
}

async fn scrape_and_persist(
    store: Arc<dyn RecordStore>,
    scraper: Arc<dyn RecordScraper>,
    memory: TtlCache<StudentRecord>,
    entry: InFlightEntry,
) -> Result<StudentRecord, AppError> {
    metrics::increment_scrape_count();
    let username = entry.username.as_str();

    let result = fetch_fresh(store.as_ref(), scraper.as_ref(), username).await;
    match &result {
        // Cached before the entry is dropped so later requests hit memory
        Ok(record) => memory.insert(username.to_string(), record.clone()),
        Err(_) => metrics::increment_scrape_failures(),
    }

    drop(entry);
    result
}

async fn fetch_fresh(
    store: &dyn RecordStore,
    scraper: &dyn RecordScraper,
    username: &str,
) -> Result<StudentRecord, AppError> {
    let record = scraper.scrape(username).await?;
    store.insert(username, &record).await?;
    Ok(record)
}
