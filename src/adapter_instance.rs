// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Adapter side of the environment contract
//!
//! The bridge hands identifying and secret data to the adapter through
//! environment variables only. [`AdapterInstance`] decodes them back.

use crate::error::{AdapterError, Result};
use crate::model::{Identifier, Key};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;

pub const ADAPTER_KIND: &str = "ADAPTER_KIND";
pub const ADAPTER_INSTANCE_OBJECT_KIND: &str = "ADAPTER_INSTANCE_OBJECT_KIND";
pub const SUITE_API_USER: &str = "SUITE_API_USER";
pub const SUITE_API_PASSWORD: &str = "SUITE_API_PASSWORD";
pub const CREDENTIAL_PREFIX: &str = "CREDENTIAL_";

/// Variable name an identifier key is exported under
pub fn identifier_var(key: &str) -> String {
    key.to_uppercase()
}

/// Variable name a credential field is exported under
pub fn credential_var(key: &str) -> String {
    format!("{}{}", CREDENTIAL_PREFIX, key.to_uppercase())
}

/// Credentials for the platform's internal REST API
#[derive(Clone, PartialEq, Eq)]
pub struct SuiteApiCredentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for SuiteApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteApiCredentials")
            .field("user", &self.user)
            .field("password", &"REDACTED")
            .finish()
    }
}

/// The adapter instance an invocation runs for
#[derive(Clone)]
pub struct AdapterInstance {
    key: Key,
    credentials: BTreeMap<String, String>,
    suite_api: Option<SuiteApiCredentials>,
}

impl fmt::Debug for AdapterInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterInstance")
            .field("key", &self.key)
            .field("credentials", &self.credentials.keys().collect::<Vec<_>>())
            .field("suite_api", &self.suite_api)
            .finish()
    }
}

impl AdapterInstance {
    /// Decode the current process environment.
    ///
    /// `identifier_keys` are the identifier keys the adapter declares for its
    /// instance kind; environment names are case-insensitive copies of them.
    pub fn from_env(identifier_keys: &[&str]) -> Result<Self> {
        Self::from_vars(utf8_vars(std::env::vars_os()), identifier_keys)
    }

    pub fn from_vars<I, K, V>(vars: I, identifier_keys: &[&str]) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: BTreeMap<String, String> =
            vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

        let required = |name: &str| {
            vars.get(name)
                .cloned()
                .ok_or_else(|| AdapterError::Configuration(format!("{} is not set", name)))
        };
        let adapter_kind = required(ADAPTER_KIND)?;
        let object_kind = required(ADAPTER_INSTANCE_OBJECT_KIND)?;

        let identifiers: Vec<Identifier> = identifier_keys
            .iter()
            .filter_map(|key| {
                vars.get(&identifier_var(key))
                    .map(|value| Identifier::new(*key, value.clone()))
            })
            .collect();

        let credentials = vars
            .iter()
            .filter_map(|(name, value)| {
                name.strip_prefix(CREDENTIAL_PREFIX)
                    .map(|field| (field.to_string(), value.clone()))
            })
            .collect();

        let user = vars.get(SUITE_API_USER).cloned().unwrap_or_default();
        let password = vars.get(SUITE_API_PASSWORD).cloned().unwrap_or_default();
        let suite_api = if user.is_empty() && password.is_empty() {
            None
        } else {
            Some(SuiteApiCredentials { user, password })
        };

        Ok(Self {
            key: Key::new(adapter_kind, object_kind, "", identifiers),
            credentials,
            suite_api,
        })
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn get_identifier_value(&self, key: &str) -> Option<&str> {
        self.key.get_identifier(key)
    }

    /// Value of a credential field (case-insensitive key)
    pub fn get_credential_value(&self, key: &str) -> Option<&str> {
        self.credentials.get(&key.to_uppercase()).map(String::as_str)
    }

    pub fn has_credentials(&self) -> bool {
        !self.credentials.is_empty()
    }

    pub fn suite_api(&self) -> Option<&SuiteApiCredentials> {
        self.suite_api.as_ref()
    }
}

/// Keep only the variables whose name and value are both UTF-8
fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
            (Ok(name), Ok(value)) => Some((name, value)),
            (Ok(name), Err(_)) => {
                log::debug!("Ignoring {}: value is not UTF-8", name);
                None
            }
            _ => None,
        })
}
