// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Inbound request body: the adapter instance configuration
//!
//! Wire fields are camelCase. Secrets (credential fields and the
//! internal-service password) are redacted from `Debug` output and from
//! [`AdapterConfig::redacted`].

use crate::error::{AdapterError, Result};
use crate::model::Key;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Message answered when a request that needs a body arrives without one
pub const NO_BODY: &str = "No body in request";

const REDACTED: &str = "REDACTED";

/// Adapter instance configuration posted by the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    pub adapter_key: Key,
    #[serde(default, alias = "internalRestCredential", skip_serializing_if = "Option::is_none")]
    pub cluster_connection_info: Option<ClusterConnectionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_config: Option<CredentialConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_config: Option<CertificateConfig>,
}

/// Connection details for the platform's internal REST API
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConnectionInfo {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub host_name: String,
}

impl fmt::Debug for ClusterConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConnectionInfo")
            .field("user_name", &self.user_name)
            .field("password", &REDACTED)
            .field("host_name", &self.host_name)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialConfig {
    #[serde(default)]
    pub credential_key: Option<String>,
    #[serde(default)]
    pub credential_fields: Vec<CredentialField>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialField {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub is_password: bool,
}

impl fmt::Debug for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialField")
            .field("key", &self.key)
            .field("value", &REDACTED)
            .field("is_password", &self.is_password)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateConfig {
    #[serde(default)]
    pub certificates: Vec<Value>,
}

impl AdapterConfig {
    /// Parse a request body.
    ///
    /// An empty body or one that does not match the contract is a
    /// [`AdapterError::ClientInput`].
    pub fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AdapterError::ClientInput(NO_BODY.to_string()));
        }
        serde_json::from_slice(body)
            .map_err(|e| AdapterError::ClientInput(format!("Invalid request body: {}", e)))
    }

    /// JSON form safe for the log: secret sections replaced wholesale
    pub fn redacted(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(map) = value.as_object_mut() {
            for section in ["credentialConfig", "clusterConnectionInfo"] {
                if map.contains_key(section) {
                    map.insert(section.to_string(), Value::String(REDACTED.to_string()));
                }
            }
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "adapterKey": {
            "name": "inst",
            "adapterKind": "X",
            "objectKind": "X_instance",
            "identifiers": [
                {"key": "host", "value": "10.0.0.1", "isPartOfUniqueness": true},
                {"key": "port", "value": "443", "isPartOfUniqueness": false}
            ]
        },
        "clusterConnectionInfo": {"userName": "svc", "password": "s3cret", "hostName": "ops"},
        "credentialConfig": {
            "credentialKey": "basic",
            "credentialFields": [
                {"key": "user", "value": "admin", "isPassword": false},
                {"key": "pass", "value": "hunter2", "isPassword": true}
            ]
        },
        "certificateConfig": {"certificates": []}
    }"#;

    #[test]
    fn test_parse_full_body() {
        let config = AdapterConfig::from_body(BODY.as_bytes()).unwrap();
        assert_eq!(config.adapter_key.adapter_kind(), "X");
        assert_eq!(config.adapter_key.get_identifier("port"), Some("443"));
        let cluster = config.cluster_connection_info.as_ref().unwrap();
        assert_eq!(cluster.user_name, "svc");
        let creds = config.credential_config.as_ref().unwrap();
        assert_eq!(creds.credential_key.as_deref(), Some("basic"));
        assert!(creds.credential_fields[1].is_password);
    }

    #[test]
    fn test_internal_rest_credential_alias() {
        let body = r#"{"adapterKey": {"adapterKind": "X", "objectKind": "Y"},
                       "internalRestCredential": {"userName": "u", "password": "p"}}"#;
        let config = AdapterConfig::from_body(body.as_bytes()).unwrap();
        assert_eq!(config.cluster_connection_info.unwrap().password, "p");
    }

    #[test]
    fn test_empty_body_is_client_error() {
        for body in ["", "  \n"] {
            let err = AdapterError::ClientInput(NO_BODY.to_string()).to_string();
            assert_eq!(
                AdapterConfig::from_body(body.as_bytes()).unwrap_err().to_string(),
                err
            );
        }
    }

    #[test]
    fn test_missing_adapter_key_is_client_error() {
        let err = AdapterConfig::from_body(br#"{"credentialConfig": null}"#).unwrap_err();
        assert_eq!(err.status_code(), 400);
        let err = AdapterConfig::from_body(br#"{"adapterKey": {"name": "x"}}"#).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_secrets_never_printed() {
        let config = AdapterConfig::from_body(BODY.as_bytes()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("hunter2"));

        let redacted = config.redacted().to_string();
        assert!(!redacted.contains("s3cret"));
        assert!(!redacted.contains("hunter2"));
        assert!(redacted.contains("10.0.0.1"));
    }
}
