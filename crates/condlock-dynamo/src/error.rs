// Error types for the DynamoDB store

/// Errors raised while configuring or connecting the store
#[derive(Debug, thiserror::Error)]
pub enum DynamoError {
    #[error("table name must not be empty")]
    EmptyTableName,

    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}
