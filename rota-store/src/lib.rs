pub mod app_config;
pub mod database;
pub mod error;
pub mod memory;
pub mod pg_commit;
pub mod pg_source;

pub use app_config::Config;
pub use database::DbClient;
pub use error::StoreError;
pub use memory::InMemoryStore;
pub use pg_commit::PgBookingCommitter;
pub use pg_source::PgAttractionSource;
