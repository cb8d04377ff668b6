//! In-memory doubles for the record store and the portal scraper.

use crate::{
    models::StudentRecord, scraper::RecordScraper, services::record_store::RecordStore,
    utils::AppError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn sample_record(name: &str) -> StudentRecord {
    StudentRecord {
        name: name.to_string(),
        total_percentage: "87.50".to_string(),
        table_data: vec![
            vec![],
            vec!["1".to_string(), "DATA STRUCTURES".to_string(), "90".to_string()],
        ],
        tracking_table_data: vec![vec!["Date".to_string(), "Period 1".to_string()]],
        student_status: "Regular".to_string(),
        current_date: "17-Oct-2026".to_string(),
        last_login: "16-Oct-2026 09:12".to_string(),
    }
}

#[derive(Default)]
pub struct FakeStore {
    records: Mutex<HashMap<String, StudentRecord>>,
    inserted: Mutex<Vec<String>>,
    find_calls: AtomicUsize,
    fail: bool,
    fail_insert: bool,
}

impl FakeStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Lookups succeed, every save is rejected.
    pub fn failing_inserts() -> Self {
        Self {
            fail_insert: true,
            ..Self::default()
        }
    }

    pub fn seed(&self, username: &str, record: StudentRecord) {
        self.records.lock().unwrap().insert(username.to_string(), record);
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn inserted(&self) -> Vec<String> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<StudentRecord>, AppError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::DatabaseError(format!(
                "Failed to look up {}: connection refused",
                username
            )));
        }
        Ok(self.records.lock().unwrap().get(username).cloned())
    }

    async fn insert(&self, username: &str, record: &StudentRecord) -> Result<(), AppError> {
        if self.fail_insert {
            return Err(AppError::DatabaseError(format!(
                "Failed to save {}: write concern timeout",
                username
            )));
        }
        self.inserted.lock().unwrap().push(username.to_string());
        self.seed(username, record.clone());
        Ok(())
    }
}

/// Scraper that returns `sample_record(username)` after an optional delay.
#[derive(Default)]
pub struct FakeScraper {
    calls: AtomicUsize,
    delay: Option<Duration>,
    fail: bool,
    panic_pending: AtomicBool,
}

impl FakeScraper {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Panics on the first call, behaves normally afterwards.
    pub fn panicking_once() -> Self {
        Self {
            panic_pending: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordScraper for FakeScraper {
    async fn scrape(&self, username: &str) -> Result<StudentRecord, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_pending.swap(false, Ordering::SeqCst) {
            panic!("portal page crashed the scraper");
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(AppError::scrape_failed(
                username,
                "Waiting for selector `#txtPassword` failed: 30000ms exceeded",
            ));
        }
        Ok(sample_record(username))
    }
}
