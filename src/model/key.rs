// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Object keys and the identity derived from them
//!
//! An object is identified by its adapter kind, object kind and either:
//! - the set of identifiers flagged `is_part_of_uniqueness`, or
//! - its name, when no identifier is part of uniqueness.
//!
//! All objects sharing an (adapter kind, object kind) pair must use the same
//! identity basis. Mixing name-based and identifier-based identity within one
//! kind pair is a collector bug that the model does not detect.

use super::identifier::Identifier;
use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// What an identity is based on
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentityBasis {
    /// No unique identifiers: the name identifies the object
    Name(String),
    /// Unique identifiers as (key, value), sorted by key
    Identifiers(Vec<(String, String)>),
}

/// The value two keys are compared on
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectIdentity {
    pub adapter_kind: String,
    pub object_kind: String,
    pub basis: IdentityBasis,
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:", self.adapter_kind, self.object_kind)?;
        match &self.basis {
            IdentityBasis::Name(name) => write!(f, "{}", name),
            IdentityBasis::Identifiers(ids) => {
                let parts: Vec<String> = ids.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "[{}]", parts.join(","))
            }
        }
    }
}

/// Immutable compound key of a monitored object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "KeyRepr", into = "KeyRepr")]
pub struct Key {
    adapter_kind: String,
    object_kind: String,
    name: String,
    identifiers: Vec<Identifier>,
    identity: ObjectIdentity,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyRepr {
    #[serde(default)]
    name: String,
    adapter_kind: String,
    object_kind: String,
    #[serde(default)]
    identifiers: Vec<Identifier>,
}

impl From<KeyRepr> for Key {
    fn from(repr: KeyRepr) -> Self {
        Key::new(repr.adapter_kind, repr.object_kind, repr.name, repr.identifiers)
    }
}

impl From<Key> for KeyRepr {
    fn from(key: Key) -> Self {
        KeyRepr {
            name: key.name,
            adapter_kind: key.adapter_kind,
            object_kind: key.object_kind,
            identifiers: key.identifiers,
        }
    }
}

impl Key {
    /// Create a key.
    ///
    /// Identifiers are keyed by their `key`; a later identifier replaces an
    /// earlier one with the same key, keeping the original position.
    pub fn new(
        adapter_kind: impl Into<String>,
        object_kind: impl Into<String>,
        name: impl Into<String>,
        identifiers: impl IntoIterator<Item = Identifier>,
    ) -> Self {
        let mut deduped: Vec<Identifier> = Vec::new();
        for identifier in identifiers {
            match deduped.iter_mut().find(|i| i.key == identifier.key) {
                Some(existing) => *existing = identifier,
                None => deduped.push(identifier),
            }
        }

        let adapter_kind = adapter_kind.into();
        let object_kind = object_kind.into();
        let name = name.into();
        let identity = Self::compute_identity(&adapter_kind, &object_kind, &name, &deduped);

        Self {
            adapter_kind,
            object_kind,
            name,
            identifiers: deduped,
            identity,
        }
    }

    fn compute_identity(
        adapter_kind: &str,
        object_kind: &str,
        name: &str,
        identifiers: &[Identifier],
    ) -> ObjectIdentity {
        let mut unique: Vec<(String, String)> = identifiers
            .iter()
            .filter(|i| i.is_part_of_uniqueness)
            .map(|i| (i.key.clone(), i.value.clone()))
            .collect();
        unique.sort();

        let basis = if unique.is_empty() {
            IdentityBasis::Name(name.to_string())
        } else {
            IdentityBasis::Identifiers(unique)
        };

        ObjectIdentity {
            adapter_kind: adapter_kind.to_string(),
            object_kind: object_kind.to_string(),
            basis,
        }
    }

    pub fn adapter_kind(&self) -> &str {
        &self.adapter_kind
    }

    pub fn object_kind(&self) -> &str {
        &self.object_kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn identity(&self) -> &ObjectIdentity {
        &self.identity
    }

    /// Value of the identifier with the given key (case-sensitive)
    pub fn get_identifier(&self, key: &str) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|i| i.key == key)
            .map(|i| i.value.as_str())
    }

    /// Value of the identifier with the given key, or `default` if absent
    pub fn get_identifier_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_identifier(key).unwrap_or(default)
    }

    /// Compare two keys, failing if any identifier key appears in both with
    /// different uniqueness flags.
    pub fn try_eq(&self, other: &Key) -> Result<bool> {
        for mine in &self.identifiers {
            if let Some(theirs) = other.identifiers.iter().find(|i| i.key == mine.key) {
                if mine.is_part_of_uniqueness != theirs.is_part_of_uniqueness {
                    return Err(AdapterError::IdentifierUniqueness(mine.key.clone()));
                }
            }
        }
        Ok(self.identity == other.identity)
    }

    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "adapterKind": self.adapter_kind,
            "objectKind": self.object_kind,
            "identifiers": self.identifiers,
        })
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.identifiers.iter().map(|i| i.to_string()).collect();
        write!(
            f,
            "{}:{}:{}:[{}]",
            self.adapter_kind,
            self.object_kind,
            self.name,
            ids.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_name_based_identity() {
        let a = Key::new("X", "host", "h1", vec![]);
        let b = Key::new("X", "host", "h1", vec![]);
        assert_eq!(a, b);
        assert!(a.try_eq(&b).unwrap());
    }

    #[test]
    fn test_identifier_based_identity_ignores_name() {
        let a = Key::new("X", "host", "h1", vec![Identifier::new("ip", "1.1.1.1")]);
        let b = Key::new("X", "host", "h2", vec![Identifier::new("ip", "1.1.1.1")]);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_kinds_scope_identity() {
        let a = Key::new("X", "host", "h1", vec![]);
        let b = Key::new("X", "vm", "h1", vec![]);
        let c = Key::new("Y", "host", "h1", vec![]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_non_unique_identifiers_fall_back_to_name() {
        let a = Key::new("X", "host", "h1", vec![Identifier::non_unique("label", "a")]);
        let b = Key::new("X", "host", "h1", vec![Identifier::non_unique("label", "b")]);
        let c = Key::new("X", "host", "h2", vec![Identifier::non_unique("label", "a")]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(matches!(a.identity().basis, IdentityBasis::Name(ref n) if n == "h1"));
    }

    #[test]
    fn test_identifier_order_does_not_matter() {
        let a = Key::new(
            "X",
            "disk",
            "d",
            vec![Identifier::new("host", "h1"), Identifier::new("dev", "sda")],
        );
        let b = Key::new(
            "X",
            "disk",
            "d",
            vec![Identifier::new("dev", "sda"), Identifier::new("host", "h1")],
        );
        assert_eq!(a, b);
        // serialization keeps insertion order
        assert_eq!(a.identifiers()[0].key, "host");
        assert_eq!(b.identifiers()[0].key, "dev");
    }

    #[test]
    fn test_try_eq_uniqueness_conflict() {
        let a = Key::new("X", "host", "h1", vec![Identifier::new("ip", "1.1.1.1")]);
        let b = Key::new("X", "host", "h1", vec![Identifier::non_unique("ip", "1.1.1.1")]);
        assert!(matches!(
            a.try_eq(&b),
            Err(AdapterError::IdentifierUniqueness(_))
        ));
    }

    #[test]
    fn test_duplicate_identifier_key_replaced() {
        let key = Key::new(
            "X",
            "host",
            "h1",
            vec![Identifier::new("ip", "1.1.1.1"), Identifier::new("ip", "2.2.2.2")],
        );
        assert_eq!(key.identifiers().len(), 1);
        assert_eq!(key.get_identifier("ip"), Some("2.2.2.2"));
    }

    #[test]
    fn test_get_identifier() {
        let key = Key::new("X", "host", "h1", vec![Identifier::new("ip", "1.1.1.1")]);
        assert_eq!(key.get_identifier("ip"), Some("1.1.1.1"));
        assert_eq!(key.get_identifier("IP"), None);
        assert_eq!(key.get_identifier_or("port", "443"), "443");
    }

    #[test]
    fn test_wire_format() {
        let key = Key::new(
            "X",
            "host",
            "h1",
            vec![Identifier::with_uniqueness("ip", "1.1.1.1", true)],
        );
        assert_eq!(
            key.to_wire(),
            serde_json::json!({
                "name": "h1",
                "adapterKind": "X",
                "objectKind": "host",
                "identifiers": [{"key": "ip", "value": "1.1.1.1", "isPartOfUniqueness": true}]
            })
        );
        assert_eq!(serde_json::to_value(&key).unwrap(), key.to_wire());
    }

    #[test]
    fn test_deserialize_adapter_key() {
        let key: Key = serde_json::from_str(
            r#"{"adapterKind":"X","objectKind":"X_instance","identifiers":[{"key":"host","value":"h","isPartOfUniqueness":true}]}"#,
        )
        .unwrap();
        assert_eq!(key.name(), "");
        assert_eq!(key.adapter_kind(), "X");
        assert_eq!(key.get_identifier("host"), Some("h"));
    }
}
