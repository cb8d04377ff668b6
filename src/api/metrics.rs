use crate::services::RecordService;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static MEMORY_HITS: AtomicU64 = AtomicU64::new(0);
static STORE_HITS: AtomicU64 = AtomicU64::new(0);
static SCRAPE_COUNT: AtomicU64 = AtomicU64::new(0);
static SCRAPE_FAILURES: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_error_count() {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_memory_hits() {
    MEMORY_HITS.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_store_hits() {
    STORE_HITS.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_scrape_count() {
    SCRAPE_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_scrape_failures() {
    SCRAPE_FAILURES.fetch_add(1, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub http_errors_total: u64,
    pub record_memory_hits_total: u64,
    pub record_store_hits_total: u64,
    pub record_scrapes_total: u64,
    pub record_scrape_failures_total: u64,
    pub record_memory_entries: u64,
}

impl MetricsResponse {
    pub fn snapshot(memory_entries: usize) -> Self {
        Self {
            http_requests_total: REQUEST_COUNT.load(Ordering::Relaxed),
            http_errors_total: ERROR_COUNT.load(Ordering::Relaxed),
            record_memory_hits_total: MEMORY_HITS.load(Ordering::Relaxed),
            record_store_hits_total: STORE_HITS.load(Ordering::Relaxed),
            record_scrapes_total: SCRAPE_COUNT.load(Ordering::Relaxed),
            record_scrape_failures_total: SCRAPE_FAILURES.load(Ordering::Relaxed),
            record_memory_entries: memory_entries as u64,
        }
    }

    fn to_prometheus(&self) -> String {
        let counters = [
            ("http_requests_total", "Total number of HTTP requests", "counter", self.http_requests_total),
            ("http_errors_total", "Total number of HTTP 5xx responses", "counter", self.http_errors_total),
            ("record_memory_hits_total", "Records served from the memory cache", "counter", self.record_memory_hits_total),
            ("record_store_hits_total", "Records served from MongoDB", "counter", self.record_store_hits_total),
            ("record_scrapes_total", "Portal scrapes started", "counter", self.record_scrapes_total),
            ("record_scrape_failures_total", "Portal scrapes that failed", "counter", self.record_scrape_failures_total),
            ("record_memory_entries", "Live entries in the memory cache", "gauge", self.record_memory_entries),
        ];

        counters
            .iter()
            .map(|(name, help, kind, value)| {
                format!("# HELP {name} {help}\n# TYPE {name} {kind}\n{name} {value}\n")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus text exposition of MetricsResponse", body = String, content_type = "text/plain")
    )
)]
pub async fn get_metrics(service: web::Data<RecordService>) -> HttpResponse {
    let metrics = MetricsResponse::snapshot(service.cached_entries());

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics.to_prometheus())
}
