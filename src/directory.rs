//! Client for the external connection-directory REST service.
//!
//! The directory owns connection profiles and feature flags; this client only
//! consumes them. Credentials are write-only: the list endpoint never returns
//! them, and this client never stores them.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A named connection profile, as returned by `GET /api/connections`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub user: String,
}

impl ConnectionProfile {
    /// Label shown in the directory list and on the tab.
    pub fn label(&self) -> String {
        format!("{} ({}@{})", self.name, self.user, self.host)
    }
}

/// Server-side feature switches gating UI affordances.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct Features {
    pub download: bool,
    #[serde(rename = "fileBrowser")]
    pub file_browser: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            download: true,
            file_browser: true,
        }
    }
}

/// Payload for creating a new profile. Password and key go to the server
/// once and are never read back.
#[derive(Debug, Clone, Serialize, Default)]
pub struct NewConnection {
    pub name: String,
    pub host: String,
    pub user: String,
    pub password: String,
    pub key: String,
}

impl NewConnection {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }
        if self.host.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Host cannot be empty".to_string(),
            ));
        }
        if self.user.trim().is_empty() {
            return Err(AppError::ValidationError(
                "User cannot be empty".to_string(),
            ));
        }
        if self.password.trim().is_empty() && self.key.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Provide a password or a private key".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct DirectoryClient {
    base_url: String,
    http: reqwest::Client,
}

impl DirectoryClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::ConfigError(format!(
                "Gateway URL must start with http:// or https://: {base_url}"
            )));
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    /// Socket endpoint for one profile. The socket scheme mirrors the
    /// gateway's transport security.
    pub fn ws_url(&self, connection_id: i64) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else {
            let rest = self.base_url.strip_prefix("http://").unwrap_or(&self.base_url);
            format!("ws://{rest}")
        };
        format!("{ws_base}/ws?id={connection_id}")
    }

    pub async fn features(&self) -> Result<Features> {
        let url = format!("{}/api/features", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::DirectoryError(format!("Failed to load features: {e}")))?;
        response
            .json::<Features>()
            .await
            .map_err(|e| AppError::DirectoryError(format!("Invalid features response: {e}")))
    }

    pub async fn connections(&self) -> Result<Vec<ConnectionProfile>> {
        let url = format!("{}/api/connections", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::DirectoryError(format!("Failed to load connections: {e}")))?;
        // The directory returns a JSON null when the list is empty.
        let profiles = response
            .json::<Option<Vec<ConnectionProfile>>>()
            .await
            .map_err(|e| AppError::DirectoryError(format!("Invalid connections response: {e}")))?;
        Ok(profiles.unwrap_or_default())
    }

    pub async fn create_connection(&self, connection: &NewConnection) -> Result<()> {
        connection.validate()?;
        let url = format!("{}/api/connections", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(connection)
            .send()
            .await
            .map_err(|e| AppError::DirectoryError(format!("Failed to save connection: {e}")))?;
        if !response.status().is_success() {
            return Err(AppError::DirectoryError(format!(
                "Saving connection failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    pub async fn delete_connection(&self, id: i64) -> Result<()> {
        let url = format!("{}/api/connections?id={id}", self.base_url);
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| AppError::DirectoryError(format!("Failed to delete connection: {e}")))?;
        if !response.status().is_success() {
            return Err(AppError::DirectoryError(format!(
                "Deleting connection failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_mirrors_transport_security() {
        let plain = DirectoryClient::new("http://gateway:8080/").unwrap();
        assert_eq!(plain.ws_url(7), "ws://gateway:8080/ws?id=7");

        let secure = DirectoryClient::new("https://gateway.example.com").unwrap();
        assert_eq!(secure.ws_url(1), "wss://gateway.example.com/ws?id=1");
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        assert!(DirectoryClient::new("ftp://gateway").is_err());
    }

    #[test]
    fn test_profile_deserialization() {
        let json = r#"[{"id":3,"name":"build box","host":"10.0.0.2","user":"ci"}]"#;
        let profiles: Vec<ConnectionProfile> = serde_json::from_str(json).unwrap();
        assert_eq!(profiles[0].id, 3);
        assert_eq!(profiles[0].label(), "build box (ci@10.0.0.2)");
    }

    #[test]
    fn test_features_deserialization_uses_wire_names() {
        let features: Features =
            serde_json::from_str(r#"{"download":false,"fileBrowser":true}"#).unwrap();
        assert!(!features.download);
        assert!(features.file_browser);
    }

    #[test]
    fn test_new_connection_requires_credential() {
        let mut connection = NewConnection {
            name: "n".to_string(),
            host: "h".to_string(),
            user: "u".to_string(),
            ..Default::default()
        };
        assert!(connection.validate().is_err());
        connection.password = "secret".to_string();
        assert!(connection.validate().is_ok());
    }
}
