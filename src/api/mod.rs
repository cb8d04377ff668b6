pub mod health;
pub mod metrics;
pub mod records;
pub mod swagger;
