// condlock-dynamo: DynamoDB-backed Store for condlock

pub mod config;
pub mod error;
pub mod store;

pub use config::DynamoStoreConfig;
pub use error::DynamoError;
pub use store::DynamoStore;
