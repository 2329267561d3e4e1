//! Object instances.

use crate::filter::{Filter, FilterTable};
use crate::object::ClassDef;
use crate::value::{Token, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

struct Instance {
    id: Uuid,
    class: Arc<ClassDef>,
    fields: RwLock<BTreeMap<String, Value>>,
    filters: RwLock<FilterTable>,
    owner: RwLock<Option<Weak<Instance>>>,
}

/// Shared handle to an object.
///
/// Equality is identity: two handles are equal when they point at the same
/// instance.
#[derive(Clone)]
pub struct ObjectRef(Arc<Instance>);

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("class", &self.class_name())
            .field("id", &self.0.id)
            .finish()
    }
}

impl ObjectRef {
    /// Allocate an instance seeded with the class's property defaults.
    ///
    /// No constructor runs; use [`ClassRegistry::instantiate`](crate::ClassRegistry::instantiate).
    #[must_use]
    pub fn new(class: Arc<ClassDef>) -> Self {
        let fields = class
            .property_defaults()
            .into_iter()
            .map(|p| (p.name, p.default))
            .collect();
        Self(Arc::new(Instance {
            id: Uuid::new_v4(),
            class,
            fields: RwLock::new(fields),
            filters: RwLock::new(FilterTable::new()),
            owner: RwLock::new(None),
        }))
    }

    /// Unique, stable identity
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    /// Identity token of this instance
    #[must_use]
    pub fn token(&self) -> Token {
        Token::new(self.0.id.simple().to_string())
    }

    /// Runtime class
    #[must_use]
    pub fn class(&self) -> &Arc<ClassDef> {
        &self.0.class
    }

    /// Runtime class name
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.0.class.name()
    }

    /// Whether the runtime class is `name` or a subclass of it
    #[must_use]
    pub fn is_a(&self, name: &str) -> bool {
        self.0.class.lineage().contains(&name)
    }

    /// Read a field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        self.0.fields.read().get(name).cloned()
    }

    /// Check for a field
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.0.fields.read().contains_key(name)
    }

    /// Write a field
    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        self.0.fields.write().insert(name.into(), value);
    }

    /// Remove a field
    pub fn unset_field(&self, name: &str) -> Option<Value> {
        self.0.fields.write().remove(name)
    }

    /// Field names, sorted
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.0.fields.read().keys().cloned().collect()
    }

    /// Keep only fields whose name satisfies `keep`
    pub fn retain_fields(&self, mut keep: impl FnMut(&str) -> bool) {
        self.0.fields.write().retain(|name, _| keep(name));
    }

    /// Object this instance acts on behalf of
    #[must_use]
    pub fn owner(&self) -> Option<Self> {
        self.0.owner.read().as_ref().and_then(Weak::upgrade).map(Self)
    }

    /// Record the owning object. Held weakly.
    pub fn set_owner(&self, owner: &Self) {
        *self.0.owner.write() = Some(Arc::downgrade(&owner.0));
    }

    /// Whether `owner` is the live owner of this instance
    #[must_use]
    pub fn is_owned_by(&self, owner: &Self) -> bool {
        self.0
            .owner
            .read()
            .as_ref()
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(&owner.0)))
    }

    /// Objects held in this instance's fields that it owns
    #[must_use]
    pub fn owned_objects(&self) -> Vec<Self> {
        self.0
            .fields
            .read()
            .values()
            .filter_map(|value| match value {
                Value::Object(obj) if obj != self && obj.is_owned_by(self) => Some(obj.clone()),
                _ => None,
            })
            .collect()
    }

    /// Append a filter for one of this instance's methods
    pub fn add_filter(&self, method: impl Into<String>, filter: Filter) {
        self.0.filters.write().add(method, filter);
    }

    /// Filters for a method, in registration order
    #[must_use]
    pub fn filters_for(&self, method: &str) -> Vec<Filter> {
        self.0.filters.read().get(method)
    }

    /// Drop the filters of one method
    pub fn clear_filters(&self, method: &str) {
        self.0.filters.write().clear(method);
    }

    /// Snapshot of the filter table
    #[must_use]
    pub fn filter_table(&self) -> FilterTable {
        self.0.filters.read().clone()
    }
}
