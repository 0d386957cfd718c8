//! Registry credentials for image pulls.
//!
//! The Docker Engine API takes registry credentials as a JSON auth config
//! encoded with URL-safe base64 in the `X-Registry-Auth` header. A
//! [`RegistryCredential`] is built from the operator's username and token and
//! encoded once into a [`RegistryAuth`] blob that travels with the pull.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE as BASE64};
use serde::{Deserialize, Serialize};
use tugboat_common::{TugboatError, TugboatResult};

/// Username and registry token for a single pull.
///
/// Field names follow Docker's auth config so the JSON matches what the
/// daemon expects. Empty fields are omitted from the payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCredential {
    /// Registry identity.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    /// Bearer token presented to the registry.
    #[serde(
        default,
        rename = "registrytoken",
        skip_serializing_if = "String::is_empty"
    )]
    pub registry_token: String,
}

impl RegistryCredential {
    /// Create a credential from a username and registry token.
    pub fn new(username: impl Into<String>, registry_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            registry_token: registry_token.into(),
        }
    }

    /// Serialize and encode the credential into an auth blob.
    ///
    /// # Errors
    ///
    /// Returns [`TugboatError::Credentials`] if the credential cannot be
    /// serialized.
    pub fn encode(&self) -> TugboatResult<RegistryAuth> {
        let json = serde_json::to_vec(self).map_err(|e| TugboatError::Credentials {
            message: e.to_string(),
        })?;

        tracing::debug!(username = %self.username, "Encoded registry credentials");
        Ok(RegistryAuth(BASE64.encode(json)))
    }
}

// The token never reaches log output.
impl fmt::Debug for RegistryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredential")
            .field("username", &self.username)
            .field("registry_token", &"<redacted>")
            .finish()
    }
}

/// Encoded credential blob attached to a pull request.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryAuth(String);

impl RegistryAuth {
    /// The header value as sent to the daemon.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the blob back into a credential.
    ///
    /// # Errors
    ///
    /// Returns [`TugboatError::Credentials`] if the blob is not valid base64
    /// or does not contain an auth config.
    pub fn decode(&self) -> TugboatResult<RegistryCredential> {
        let json = BASE64
            .decode(&self.0)
            .map_err(|e| TugboatError::Credentials {
                message: format!("invalid base64 auth: {e}"),
            })?;

        serde_json::from_slice(&json).map_err(|e| TugboatError::Credentials {
            message: format!("invalid auth config: {e}"),
        })
    }
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegistryAuth(<{} bytes>)", self.0.len())
    }
}
