use rota_core::{CommitError, DataSourceError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Malformed row: {0}")]
    Decode(String),
}

impl From<StoreError> for DataSourceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(sqlx::Error::RowNotFound) => {
                DataSourceError::NotFound("row".to_string())
            }
            StoreError::Decode(msg) => DataSourceError::Decode(msg),
            other => DataSourceError::Backend(other.to_string()),
        }
    }
}

impl From<StoreError> for CommitError {
    fn from(err: StoreError) -> Self {
        CommitError::Backend(err.to_string())
    }
}
