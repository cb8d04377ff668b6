use crate::utils::AppError;
use mongodb::{Client, Collection, Database};

pub const SCRAPES_COLLECTION: &str = "scrapes";
const FALLBACK_DB_NAME: &str = "scraping";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, AppError> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(10);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        // Database named in the URI path, e.g. `.../scraping?authSource=admin`
        let db_name = client_options
            .default_database
            .clone()
            .unwrap_or_else(|| FALLBACK_DB_NAME.to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&db_name);

        // Test connection
        db.list_collection_names().await?;
        log::info!("✅ Connected to MongoDB database: {}", db_name);

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Lookup index on `scrapes(username)`. Not unique: duplicates written by
    /// older deployments must not block startup.
    async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let scrapes = self.collection::<mongodb::bson::Document>(SCRAPES_COLLECTION);
        let username_index = IndexModel::builder().keys(doc! { "username": 1 }).build();

        match scrapes.create_index(username_index).await {
            Ok(_) => log::info!("   ✅ Index created: {}(username)", SCRAPES_COLLECTION),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}
