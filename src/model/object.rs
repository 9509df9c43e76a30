// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Monitored objects and their relationship edges
//!
//! An [`Object`] is a cheap, cloneable handle: clones refer to the same
//! instance, so data added through one handle is visible through all of
//! them. Relationship edges are stored as sets of keys (identity, not
//! ownership), which keeps cyclic graphs legal without reference cycles.
//!
//! Objects are built by a single collector thread and are not `Send`.

use super::data::{Metric, Property, PropertyValue};
use super::event::{Criticality, Event};
use super::key::{Key, ObjectIdentity};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Default)]
struct ObjectState {
    metrics: Vec<Metric>,
    properties: Vec<Property>,
    events: Vec<Event>,
    parents: BTreeMap<ObjectIdentity, Key>,
    children: BTreeMap<ObjectIdentity, Key>,
}

#[derive(Debug)]
struct ObjectInner {
    key: Key,
    state: RefCell<ObjectState>,
}

/// A monitored object: metrics, properties and events for one [`Key`]
#[derive(Debug, Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

impl Object {
    /// Create a standalone object.
    ///
    /// Prefer [`CollectResult::object`](super::result::CollectResult::object),
    /// which guarantees a single instance per identity.
    pub fn new(key: Key) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                key,
                state: RefCell::new(ObjectState::default()),
            }),
        }
    }

    pub fn key(&self) -> &Key {
        &self.inner.key
    }

    pub fn adapter_kind(&self) -> &str {
        self.inner.key.adapter_kind()
    }

    pub fn object_kind(&self) -> &str {
        self.inner.key.object_kind()
    }

    /// True if both handles point at the same instance
    pub fn same_instance(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn get_identifier_value(&self, identifier_key: &str) -> Option<&str> {
        self.inner.key.get_identifier(identifier_key)
    }

    pub fn add_metric(&self, metric: Metric) -> &Self {
        self.inner.state.borrow_mut().metrics.push(metric);
        self
    }

    pub fn add_metrics(&self, metrics: impl IntoIterator<Item = Metric>) -> &Self {
        self.inner.state.borrow_mut().metrics.extend(metrics);
        self
    }

    /// Add a metric stamped with the current time
    pub fn with_metric(&self, key: impl Into<String>, value: f64) -> &Self {
        self.add_metric(Metric::new(key, value))
    }

    /// All metric data points with the given key, in insertion order
    pub fn get_metric(&self, key: &str) -> Vec<Metric> {
        self.inner
            .state
            .borrow()
            .metrics
            .iter()
            .filter(|m| m.key == key)
            .cloned()
            .collect()
    }

    pub fn add_property(&self, property: Property) -> &Self {
        self.inner.state.borrow_mut().properties.push(property);
        self
    }

    pub fn add_properties(&self, properties: impl IntoIterator<Item = Property>) -> &Self {
        self.inner.state.borrow_mut().properties.extend(properties);
        self
    }

    /// Add a property stamped with the current time
    pub fn with_property(&self, key: impl Into<String>, value: impl Into<PropertyValue>) -> &Self {
        self.add_property(Property::new(key, value))
    }

    pub fn get_property(&self, key: &str) -> Vec<Property> {
        self.inner
            .state
            .borrow()
            .properties
            .iter()
            .filter(|p| p.key == key)
            .cloned()
            .collect()
    }

    /// Values of the property with the given key, oldest first
    pub fn get_property_values(&self, key: &str) -> Vec<PropertyValue> {
        let mut properties = self.get_property(key);
        properties.sort_by_key(|p| p.timestamp);
        properties.into_iter().map(|p| p.value).collect()
    }

    /// Most recent value of the property, if any
    pub fn get_last_property_value(&self, key: &str) -> Option<PropertyValue> {
        self.get_property_values(key).pop()
    }

    pub fn add_event(&self, event: Event) -> &Self {
        self.inner.state.borrow_mut().events.push(event);
        self
    }

    pub fn add_events(&self, events: impl IntoIterator<Item = Event>) -> &Self {
        self.inner.state.borrow_mut().events.extend(events);
        self
    }

    pub fn with_event(&self, message: impl Into<String>, criticality: Criticality) -> &Self {
        self.add_event(Event::new(message, criticality))
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.state.borrow().events.clone()
    }

    /// Make `parent` a parent of this object; this object becomes its child.
    pub fn add_parent(&self, parent: &Object) -> &Self {
        let parent_key = parent.key().clone();
        self.inner
            .state
            .borrow_mut()
            .parents
            .insert(parent_key.identity().clone(), parent_key);
        let own_key = self.key().clone();
        parent
            .inner
            .state
            .borrow_mut()
            .children
            .insert(own_key.identity().clone(), own_key);
        self
    }

    pub fn add_parents<'a>(&self, parents: impl IntoIterator<Item = &'a Object>) -> &Self {
        for parent in parents {
            self.add_parent(parent);
        }
        self
    }

    /// Make `child` a child of this object; this object becomes its parent.
    pub fn add_child(&self, child: &Object) -> &Self {
        child.add_parent(self);
        self
    }

    pub fn add_children<'a>(&self, children: impl IntoIterator<Item = &'a Object>) -> &Self {
        for child in children {
            self.add_child(child);
        }
        self
    }

    pub fn parents(&self) -> Vec<Key> {
        self.inner.state.borrow().parents.values().cloned().collect()
    }

    pub fn children(&self) -> Vec<Key> {
        self.inner.state.borrow().children.values().cloned().collect()
    }

    pub fn has_children(&self) -> bool {
        !self.inner.state.borrow().children.is_empty()
    }

    /// True if any metric, property or event has been recorded
    pub fn has_content(&self) -> bool {
        let state = self.inner.state.borrow();
        !(state.metrics.is_empty() && state.properties.is_empty() && state.events.is_empty())
    }

    pub fn to_wire(&self) -> serde_json::Value {
        let state = self.inner.state.borrow();
        serde_json::json!({
            "key": self.inner.key.to_wire(),
            "metrics": state.metrics,
            "properties": state.properties,
            "events": state.events,
        })
    }
}
