pub mod record_service;
pub mod record_store;

#[cfg(test)]
pub mod testing;

pub use record_service::*;
pub use record_store::*;
