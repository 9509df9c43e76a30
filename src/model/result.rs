// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Results an adapter hands back to the front end
//!
//! A [`CollectResult`] is the deduplicating store for one collection pass:
//! every identity maps to exactly one [`Object`] instance. Each result is an
//! independent identity namespace; nothing is shared between results.

use super::identifier::Identifier;
use super::key::{Key, ObjectIdentity};
use super::object::Object;
use crate::error::{AdapterError, Result};
use crate::pipe::OutputPipe;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Objects, relationships and error state of one collection
#[derive(Debug, Default)]
pub struct CollectResult {
    objects: HashMap<ObjectIdentity, Object>,
    order: Vec<ObjectIdentity>,
    /// (adapter kind, object kind) -> identifier key -> is_part_of_uniqueness
    uniqueness: HashMap<(String, String), HashMap<String, bool>>,
    error_message: Option<String>,
}

impl CollectResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the object with the given key.
    ///
    /// All calls that resolve to the same identity return handles to the same
    /// instance. Fails if an identifier key disagrees on uniqueness with an
    /// earlier object of the same kind pair.
    pub fn object(
        &mut self,
        adapter_kind: impl Into<String>,
        object_kind: impl Into<String>,
        name: impl Into<String>,
        identifiers: impl IntoIterator<Item = Identifier>,
    ) -> Result<Object> {
        let key = Key::new(adapter_kind, object_kind, name, identifiers);
        if let Some(existing) = self.objects.get(key.identity()) {
            self.check_uniqueness(&key)?;
            return Ok(existing.clone());
        }
        self.insert(Object::new(key))
    }

    /// Add an existing object.
    ///
    /// Re-adding the same instance is a no-op; a different instance with the
    /// same identity fails with [`AdapterError::DuplicateIdentity`].
    pub fn add_object(&mut self, obj: Object) -> Result<Object> {
        if let Some(existing) = self.objects.get(obj.key().identity()) {
            if existing.same_instance(&obj) {
                return Ok(obj);
            }
            return Err(AdapterError::DuplicateIdentity(obj.key().to_string()));
        }
        self.insert(obj)
    }

    /// Add several objects; every conflicting key is reported in one error.
    pub fn add_objects(&mut self, objects: impl IntoIterator<Item = Object>) -> Result<()> {
        let mut conflicts = Vec::new();
        for obj in objects {
            match self.add_object(obj) {
                Ok(_) => {}
                Err(AdapterError::DuplicateIdentity(key)) => conflicts.push(key),
                Err(e) => return Err(e),
            }
        }
        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(AdapterError::DuplicateIdentity(conflicts.join("; ")))
        }
    }

    fn insert(&mut self, obj: Object) -> Result<Object> {
        self.check_uniqueness(obj.key())?;
        let scope = (obj.adapter_kind().to_string(), obj.object_kind().to_string());
        let flags = self.uniqueness.entry(scope).or_default();
        for identifier in obj.key().identifiers() {
            flags
                .entry(identifier.key.clone())
                .or_insert(identifier.is_part_of_uniqueness);
        }
        let identity = obj.key().identity().clone();
        self.order.push(identity.clone());
        self.objects.insert(identity, obj.clone());
        Ok(obj)
    }

    fn check_uniqueness(&self, key: &Key) -> Result<()> {
        let scope = (key.adapter_kind().to_string(), key.object_kind().to_string());
        let Some(flags) = self.uniqueness.get(&scope) else {
            return Ok(());
        };
        for identifier in key.identifiers() {
            if let Some(&flag) = flags.get(&identifier.key) {
                if flag != identifier.is_part_of_uniqueness {
                    return Err(AdapterError::IdentifierUniqueness(identifier.key.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn get_object(&self, key: &Key) -> Option<Object> {
        self.objects.get(key.identity()).cloned()
    }

    /// All objects in insertion order
    pub fn objects(&self) -> Vec<Object> {
        self.order
            .iter()
            .filter_map(|identity| self.objects.get(identity))
            .cloned()
            .collect()
    }

    pub fn objects_by_type(&self, object_kind: &str) -> Vec<Object> {
        self.objects()
            .into_iter()
            .filter(|o| o.object_kind() == object_kind)
            .collect()
    }

    pub fn objects_by_adapter_kind(&self, adapter_kind: &str) -> Vec<Object> {
        self.objects()
            .into_iter()
            .filter(|o| o.adapter_kind() == adapter_kind)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Put the result in error mode; the last message wins.
    pub fn with_error(&mut self, message: impl Into<String>) -> &mut Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }

    pub fn to_wire(&self) -> Value {
        if let Some(message) = &self.error_message {
            return json!({ "errorMessage": message });
        }

        let objects = self.objects();
        let result: Vec<Value> = objects.iter().map(Object::to_wire).collect();
        let relationships: Vec<Value> = objects
            .iter()
            .filter(|o| o.has_children())
            .map(|parent| {
                let children: Vec<Value> = parent
                    .children()
                    .iter()
                    .map(|child| match self.objects.get(child.identity()) {
                        Some(resolved) => resolved.key().to_wire(),
                        None => child.to_wire(),
                    })
                    .collect();
                json!({ "parent": parent.key().to_wire(), "children": children })
            })
            .collect();

        json!({
            "result": result,
            "relationships": relationships,
            "nonExistingObjects": [],
        })
    }

    /// Serialize and write to the output pipe
    pub fn send(self, pipe: &mut OutputPipe) -> Result<()> {
        log::debug!(
            "Sending collect result: {} objects, success={}",
            self.len(),
            self.is_success()
        );
        pipe.send(&self.to_wire())
    }
}

/// Outcome of an adapter instance connection test
#[derive(Debug, Clone, Default)]
pub struct TestResult {
    error_message: Option<String>,
}

impl TestResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(&mut self, message: impl Into<String>) -> &mut Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }

    pub fn to_wire(&self) -> Value {
        match &self.error_message {
            Some(message) => json!({ "errorMessage": message }),
            None => json!({}),
        }
    }

    pub fn send(self, pipe: &mut OutputPipe) -> Result<()> {
        pipe.send(&self.to_wire())
    }
}

/// URLs the platform should validate certificates for
#[derive(Debug, Clone, Default)]
pub struct EndpointResult {
    endpoints: Vec<String>,
}

impl EndpointResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an endpoint
    pub fn with_endpoint(&mut self, url: impl Into<String>) -> &mut Self {
        self.endpoints.push(url.into());
        self
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn to_wire(&self) -> Value {
        json!({ "endpointUrls": self.endpoints })
    }

    pub fn send(self, pipe: &mut OutputPipe) -> Result<()> {
        pipe.send(&self.to_wire())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::data::Metric;

    #[test]
    fn test_empty_result_wire() {
        let result = CollectResult::new();
        assert!(result.is_empty());
        assert_eq!(
            result.to_wire(),
            json!({"result": [], "relationships": [], "nonExistingObjects": []})
        );
    }

    #[test]
    fn test_error_suppresses_content() {
        let mut result = CollectResult::new();
        result
            .object("X", "host", "h1", vec![])
            .unwrap()
            .with_metric("cpu", 1.0);
        result.with_error("first").with_error("login failed");
        assert_eq!(result.to_wire(), json!({"errorMessage": "login failed"}));
        assert!(!result.is_success());
    }

    #[test]
    fn test_object_returns_same_instance() {
        let mut result = CollectResult::new();
        let a = result
            .object("X", "host", "h1", vec![Identifier::new("ip", "1.1.1.1")])
            .unwrap();
        let b = result
            .object("X", "host", "h2", vec![Identifier::new("ip", "1.1.1.1")])
            .unwrap();
        assert!(a.same_instance(&b));
        assert_eq!(result.len(), 1);
        b.with_metric("cpu", 3.0);
        assert_eq!(a.get_metric("cpu").len(), 1);
    }

    #[test]
    fn test_add_object_duplicate_identity() {
        let mut result = CollectResult::new();
        let first = Object::new(Key::new("X", "host", "h1", vec![]));
        let second = Object::new(Key::new("X", "host", "h1", vec![]));
        result.add_object(first.clone()).unwrap();
        assert!(matches!(
            result.add_object(second),
            Err(AdapterError::DuplicateIdentity(_))
        ));
        let again = result.add_object(first.clone()).unwrap();
        assert!(again.same_instance(&first));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_add_objects_reports_all_conflicts() {
        let mut result = CollectResult::new();
        result.object("X", "host", "a", vec![]).unwrap();
        result.object("X", "host", "b", vec![]).unwrap();
        let err = result
            .add_objects(vec![
                Object::new(Key::new("X", "host", "a", vec![])),
                Object::new(Key::new("X", "host", "c", vec![])),
                Object::new(Key::new("X", "host", "b", vec![])),
            ])
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains(":a:"));
        assert!(message.contains(":b:"));
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_uniqueness_conflict_within_kind_pair() {
        let mut result = CollectResult::new();
        result
            .object("X", "host", "h1", vec![Identifier::new("ip", "1.1.1.1")])
            .unwrap();
        assert!(matches!(
            result.object("X", "host", "h2", vec![Identifier::non_unique("ip", "2.2.2.2")]),
            Err(AdapterError::IdentifierUniqueness(ref k)) if k == "ip"
        ));
        // another kind pair is a separate scope
        assert!(result
            .object("X", "vm", "v1", vec![Identifier::non_unique("ip", "2.2.2.2")])
            .is_ok());
    }

    #[test]
    fn test_relationships_resolve_through_table() {
        let mut result = CollectResult::new();
        let host = result.object("X", "host", "h1", vec![]).unwrap();
        let vm = result
            .object("X", "vm", "canonical", vec![Identifier::new("uuid", "42")])
            .unwrap();
        // an equal key with a different name resolves to the stored object
        let alias = Object::new(Key::new("X", "vm", "alias", vec![Identifier::new("uuid", "42")]));
        host.add_child(&alias);
        vm.add_metric(Metric::at("mem", 1.0, 1));

        let wire = result.to_wire();
        let relationships = wire["relationships"].as_array().unwrap();
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0]["parent"]["name"], "h1");
        assert_eq!(relationships[0]["children"][0]["name"], "canonical");
        assert_eq!(wire["result"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_objects_keep_insertion_order_and_filter() {
        let mut result = CollectResult::new();
        result.object("X", "host", "h1", vec![]).unwrap();
        result.object("X", "vm", "v1", vec![]).unwrap();
        result.object("Y", "host", "h2", vec![]).unwrap();
        let names: Vec<String> = result
            .objects()
            .iter()
            .map(|o| o.key().name().to_string())
            .collect();
        assert_eq!(names, vec!["h1", "v1", "h2"]);
        assert_eq!(result.objects_by_type("host").len(), 2);
        assert_eq!(result.objects_by_adapter_kind("X").len(), 2);
        assert!(result
            .get_object(&Key::new("Y", "host", "h2", vec![]))
            .is_some());
    }

    #[test]
    fn test_results_are_independent_namespaces() {
        let mut first = CollectResult::new();
        let mut second = CollectResult::new();
        let a = first.object("X", "host", "h1", vec![]).unwrap();
        let b = second.object("X", "host", "h1", vec![]).unwrap();
        assert!(!a.same_instance(&b));
    }

    #[test]
    fn test_test_result_wire() {
        let mut result = TestResult::new();
        assert_eq!(result.to_wire(), json!({}));
        result.with_error("bad credentials");
        assert_eq!(result.to_wire(), json!({"errorMessage": "bad credentials"}));
        assert!(!result.is_success());
    }

    #[test]
    fn test_endpoint_result_keeps_call_order() {
        let mut result = EndpointResult::new();
        result
            .with_endpoint("https://a")
            .with_endpoint("https://b")
            .with_endpoint("https://a");
        assert_eq!(
            result.to_wire(),
            json!({"endpointUrls": ["https://a", "https://b", "https://a"]})
        );
    }
}
