use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Student Record Service API",
        version = "0.1.0",
        description = "Scrapes a student's academic record from the college portal and caches it.\n\n**Lookup order:** in-memory cache (10 min TTL), MongoDB, then a fresh headless-browser scrape."
    ),
    paths(
        crate::api::records::scrape,
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::models::StudentRecord,
            crate::api::records::ErrorResponse,
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Records", description = "Student record lookup backed by the portal scraper."),
        (name = "Health", description = "Health check and system metrics endpoints for monitoring service status."),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_scrape_endpoint() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/scrape"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
