use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

/// Academic record scraped from the student portal.
///
/// Field names match the stored documents and the JSON returned by `/scrape`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct StudentRecord {
    pub name: String,
    pub total_percentage: String,
    /// Subject table rows, one list of cell texts per row
    #[serde(rename = "tableData")]
    pub table_data: Vec<Vec<String>>,
    /// Day-wise attendance table rows, headers included
    #[serde(rename = "trackingtableData")]
    pub tracking_table_data: Vec<Vec<String>>,
    #[serde(rename = "studentStatus")]
    pub student_status: String,
    #[serde(rename = "currentDate")]
    pub current_date: String,
    #[serde(rename = "lastLogin")]
    pub last_login: String,
}

/// Persisted scrape (collection: scrapes)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScrapeDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub data: StudentRecord,
    #[serde(rename = "lastScraped")]
    pub last_scraped: BsonDateTime,
}

impl ScrapeDocument {
    pub fn new(username: &str, data: StudentRecord) -> Self {
        Self {
            id: None,
            username: username.to_string(),
            data,
            last_scraped: BsonDateTime::now(),
        }
    }
}
