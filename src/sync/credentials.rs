//! Time-limited object store credentials from the instance metadata service.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

const CREDENTIALS_PATH: &str = "/latest/meta-data/iam/security-credentials/";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub role: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Hands out fresh credentials. Called once per tick, never cached.
#[async_trait]
pub trait CredentialSupplier: Send + Sync {
    async fn fetch(&self) -> Result<Credentials>;
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SecurityCredentials {
    access_key_id: String,
    secret_access_key: String,
    token: String,
}

pub struct ImdsCredentialSupplier {
    client: reqwest::Client,
    base_url: String,
}

impl ImdsCredentialSupplier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: format!("{}{}", endpoint.trim_end_matches('/'), CREDENTIALS_PATH),
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::CredentialStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CredentialSupplier for ImdsCredentialSupplier {
    async fn fetch(&self) -> Result<Credentials> {
        // Role listing is one name per line; the instance profile has one.
        let body = self.get(&self.base_url).await?.text().await?;
        let role = body
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or_else(|| SyncError::MalformedCredentials("no instance role".to_string()))?
            .to_string();

        let url = format!("{}{}", self.base_url, role);
        let creds: SecurityCredentials = self
            .get(&url)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::MalformedCredentials(e.to_string()))?;

        debug!("Fetched credentials for role {}", role);

        Ok(Credentials {
            access_key_id: creds.access_key_id,
            secret_access_key: creds.secret_access_key,
            session_token: creds.token,
            role,
        })
    }
}
