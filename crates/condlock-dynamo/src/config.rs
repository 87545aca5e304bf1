// Configuration for DynamoStore

use serde::{Deserialize, Serialize};

use crate::error::DynamoError;

/// Connection settings for the DynamoDB lock table
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamoStoreConfig {
    /// Table holding one item per lock, keyed by the `Name` string attribute
    pub table_name: String,
    /// AWS region (default: resolved from the environment)
    pub region: Option<String>,
    /// Endpoint override, e.g. "localhost:8000" for DynamoDB Local
    pub endpoint: Option<String>,
    /// Use plain HTTP for a scheme-less endpoint
    pub disable_ssl: bool,
}

impl DynamoStoreConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), DynamoError> {
        if self.table_name.trim().is_empty() {
            return Err(DynamoError::EmptyTableName);
        }
        self.endpoint_url().map(|_| ())
    }

    /// Endpoint URL passed to the SDK, if any.
    ///
    /// An endpoint without a scheme gets `http://` when `disable_ssl` is set
    /// and `https://` otherwise. An explicit scheme is kept as given.
    pub fn endpoint_url(&self) -> Result<Option<String>, DynamoError> {
        let Some(endpoint) = self.endpoint.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if endpoint.is_empty() {
            return Ok(None);
        }

        if let Some((scheme, rest)) = endpoint.split_once("://") {
            if rest.is_empty() || !matches!(scheme, "http" | "https") {
                return Err(DynamoError::InvalidEndpoint(endpoint.to_string()));
            }
            return Ok(Some(endpoint.to_string()));
        }

        let scheme = if self.disable_ssl { "http" } else { "https" };
        Ok(Some(format!("{}://{}", scheme, endpoint)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_endpoint(endpoint: &str, disable_ssl: bool) -> DynamoStoreConfig {
        DynamoStoreConfig {
            table_name: "TestLockTable".to_string(),
            region: Some("us-east-1".to_string()),
            endpoint: Some(endpoint.to_string()),
            disable_ssl,
        }
    }

    #[test]
    fn test_no_endpoint() {
        let config = DynamoStoreConfig::new("TestLockTable");
        assert_eq!(config.endpoint_url().unwrap(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_endpoint_is_ignored() {
        assert_eq!(with_endpoint("  ", false).endpoint_url().unwrap(), None);
    }

    #[test]
    fn test_scheme_from_disable_ssl() {
        assert_eq!(
            with_endpoint("localhost:8000", true).endpoint_url().unwrap(),
            Some("http://localhost:8000".to_string())
        );
        assert_eq!(
            with_endpoint("dynamodb.internal:443", false)
                .endpoint_url()
                .unwrap(),
            Some("https://dynamodb.internal:443".to_string())
        );
    }

    #[test]
    fn test_explicit_scheme_is_kept() {
        assert_eq!(
            with_endpoint("https://localhost:8000", true)
                .endpoint_url()
                .unwrap(),
            Some("https://localhost:8000".to_string())
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            with_endpoint("ftp://localhost", false).endpoint_url(),
            Err(DynamoError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            with_endpoint("http://", false).endpoint_url(),
            Err(DynamoError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_empty_table_name() {
        let config = DynamoStoreConfig::new(" ");
        assert!(matches!(config.validate(), Err(DynamoError::EmptyTableName)));
    }
}
