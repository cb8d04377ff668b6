// Background job that drops expired memory-cache entries so usernames that
// are never requested again do not stay resident

use crate::services::RecordService;
use actix_web::web;
use tokio::time::{interval, Duration, MissedTickBehavior};

pub fn start_cache_janitor(service: web::Data<RecordService>, every: Duration) {
    // `interval` panics on a zero period
    let every = every.max(Duration::from_secs(1));
    log::info!("🧹 Starting cache janitor (runs every {}s)", every.as_secs());

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let purged = service.purge_expired();
            if purged > 0 {
                log::debug!("🧹 Purged {} expired cache entries", purged);
            }
        }
    });
}
