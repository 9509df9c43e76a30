// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Subprocess environment construction
//!
//! The environment is the only channel for identifying and secret data.
//! It starts empty; only the names listed in `inherit_env` are copied from
//! the front end's own environment. Inherited values that are not UTF-8 are
//! dropped.

use crate::adapter_instance::{
    credential_var, identifier_var, ADAPTER_INSTANCE_OBJECT_KIND, ADAPTER_KIND,
    SUITE_API_PASSWORD, SUITE_API_USER,
};
use crate::request::AdapterConfig;
use std::collections::BTreeMap;
use std::ffi::OsString;

/// Build the adapter environment from the front end's variables and the request
pub fn build_environment<I, K, V>(
    inherited: I,
    inherit_env: &[String],
    request: Option<&AdapterConfig>,
) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
{
    let mut env = BTreeMap::new();
    for (name, value) in inherited {
        let name = name.into();
        let Some(name) = name.to_str().filter(|n| inherit_env.iter().any(|i| i == n)) else {
            continue;
        };
        match value.into().into_string() {
            Ok(value) => {
                env.insert(name.to_string(), value);
            }
            Err(_) => log::warn!("Not passing {} to adapter: value is not UTF-8", name),
        }
    }

    let Some(request) = request else {
        return env;
    };

    let key = &request.adapter_key;
    env.insert(ADAPTER_KIND.into(), key.adapter_kind().to_string());
    env.insert(ADAPTER_INSTANCE_OBJECT_KIND.into(), key.object_kind().to_string());

    let (user, password) = match &request.cluster_connection_info {
        Some(info) => (info.user_name.clone(), info.password.clone()),
        None => (String::new(), String::new()),
    };
    env.insert(SUITE_API_USER.into(), user);
    env.insert(SUITE_API_PASSWORD.into(), password);

    for identifier in key.identifiers() {
        env.insert(identifier_var(&identifier.key), identifier.value.clone());
    }

    if let Some(credentials) = &request.credential_config {
        for field in &credentials.credential_fields {
            env.insert(credential_var(&field.key), field.value.clone());
        }
    }

    log::debug!(
        "Adapter environment: {:?}",
        env.keys().collect::<Vec<_>>()
    );
    env
}
