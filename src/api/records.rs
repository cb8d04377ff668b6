use crate::services::RecordService;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScrapeQuery {
    /// Student roll number; the configured default account when omitted
    pub username: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request-level settings for `/scrape`.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub default_username: String,
}

/// GET /scrape?username=21B91A05U4
/// Returns the student's record from cache, MongoDB or a fresh portal scrape
#[utoipa::path(
    get,
    path = "/scrape",
    tag = "Records",
    params(ScrapeQuery),
    responses(
        (status = 200, description = "Student record", body = crate::models::StudentRecord),
        (status = 400, description = "Empty username", body = ErrorResponse),
        (status = 500, description = "Lookup or scrape failed", body = ErrorResponse)
    )
)]
pub async fn scrape(
    query: web::Query<ScrapeQuery>,
    settings: web::Data<ScrapeSettings>,
    service: web::Data<RecordService>,
) -> HttpResponse {
    let username = query
        .into_inner()
        .username
        .unwrap_or_else(|| settings.default_username.clone());

    if username.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Missing username".to_string(),
        });
    }

    log::info!("🎓 GET /scrape?username={}", username);

    match service.get_record(&username).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => {
            log::error!("❌ Failed to handle /scrape for {}: {}", username, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            })
        }
    }
}
