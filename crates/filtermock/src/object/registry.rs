//! The class table and call dispatch.
//!
//! `ClassRegistry` plays the part of the running program: it holds every
//! defined class, resolves unknown names through autoload hooks, builds
//! instances and dispatches method calls. No lock is held while a method
//! body, a filter or an autoload hook runs, so those may call back into the
//! registry freely.

use crate::filter::{Filter, FilterTable};
use crate::object::bootstrap;
use crate::object::class::{
    ClassBuilder, ClassDef, MethodInfo, ParentRef, Visibility, CONSTRUCTOR, DESTRUCTOR, GET,
};
use crate::object::context::CallContext;
use crate::object::ObjectRef;
use crate::result::{MockError, MockResult};
use crate::value::Value;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, trace};

/// Hook called with a class name that is not (yet) defined
pub type Autoloader = Arc<dyn Fn(&ClassRegistry, &str) + Send + Sync>;

/// Registry of classes, autoload hooks and static filters
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, Arc<ClassDef>>>,
    autoloaders: RwLock<Vec<(String, Autoloader)>>,
    loading: Mutex<HashSet<(ThreadId, String)>>,
    static_filters: RwLock<HashMap<String, FilterTable>>,
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.classes.read().len())
            .field(
                "autoloaders",
                &self
                    .autoloaders
                    .read()
                    .iter()
                    .map(|(key, _)| key.clone())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    /// Create a registry holding the two base classes
    #[must_use]
    pub fn new() -> Self {
        let registry = Self::empty();
        {
            let mut classes = registry.classes.write();
            for class in bootstrap::base_classes() {
                classes.insert(class.name().to_string(), class);
            }
        }
        registry
    }

    /// Create a registry with no classes at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            classes: RwLock::new(HashMap::new()),
            autoloaders: RwLock::new(Vec::new()),
            loading: Mutex::new(HashSet::new()),
            static_filters: RwLock::new(HashMap::new()),
        }
    }

    // =========================================================================
    // Definition and lookup
    // =========================================================================

    /// Check for a class without autoloading
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    /// Look a class up without autoloading
    #[must_use]
    pub fn find(&self, name: &str) -> Option<Arc<ClassDef>> {
        self.classes.read().get(name).cloned()
    }

    /// Names of all defined classes, sorted
    #[must_use]
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.classes.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Look a class up, running the autoload hooks on a miss
    pub fn load(&self, name: &str) -> MockResult<Arc<ClassDef>> {
        if let Some(class) = self.find(name) {
            return Ok(class);
        }
        self.autoload(name);
        self.find(name)
            .ok_or_else(|| MockError::class_not_found(name))
    }

    fn autoload(&self, name: &str) {
        let key = (thread::current().id(), name.to_string());
        if !self.loading.lock().insert(key.clone()) {
            return;
        }
        let hooks: Vec<(String, Autoloader)> = self.autoloaders.read().clone();
        for (hook_key, hook) in hooks {
            if self.exists(name) {
                break;
            }
            trace!(class = name, autoloader = %hook_key, "autoloading");
            hook(self, name);
        }
        self.loading.lock().remove(&key);
    }

    /// Install an autoload hook under `key`.
    ///
    /// Returns false, and keeps the existing hook, when `key` is taken.
    pub fn register_autoloader(&self, key: &str, hook: Autoloader) -> bool {
        let mut autoloaders = self.autoloaders.write();
        if autoloaders.iter().any(|(existing, _)| existing == key) {
            return false;
        }
        debug!(autoloader = key, "registered autoloader");
        autoloaders.push((key.to_string(), hook));
        true
    }

    /// Build a class, resolving a named parent, without registering it
    pub fn build(&self, builder: ClassBuilder) -> MockResult<Arc<ClassDef>> {
        let parent = match builder.parent_ref() {
            None => None,
            Some(ParentRef::Class(parent)) => Some(Arc::clone(parent)),
            Some(ParentRef::Name(name)) => Some(self.load(name)?),
        };
        Ok(Arc::new(builder.finish(parent)))
    }

    /// Build and register a class
    pub fn define(&self, builder: ClassBuilder) -> MockResult<Arc<ClassDef>> {
        let class = self.build(builder)?;
        self.define_all(vec![Arc::clone(&class)])?;
        Ok(class)
    }

    /// Register already built classes, all or none
    pub fn define_all(&self, classes: Vec<Arc<ClassDef>>) -> MockResult<()> {
        let mut table = self.classes.write();
        let mut batch = HashSet::new();
        for class in &classes {
            if table.contains_key(class.name()) || !batch.insert(class.name()) {
                return Err(MockError::RegistrationConflict {
                    name: class.name().to_string(),
                });
            }
        }
        for class in classes {
            debug!(class = class.name(), "defined class");
            table.insert(class.name().to_string(), class);
        }
        Ok(())
    }

    /// Strict subclass test; autoloads `name`
    #[must_use]
    pub fn is_subclass_of(&self, name: &str, ancestor: &str) -> bool {
        self.load(name)
            .map(|class| class.is_subclass_of(ancestor))
            .unwrap_or(false)
    }

    /// Reflect the callable surface of a class
    pub fn reflect(&self, name: &str) -> MockResult<Vec<MethodInfo>> {
        Ok(self.load(name)?.methods())
    }

    // =========================================================================
    // Instances and dispatch
    // =========================================================================

    /// Create an instance and run its constructor
    pub fn instantiate(&self, name: &str, args: Vec<Value>) -> MockResult<ObjectRef> {
        self.construct(name, args, true)
    }

    pub(crate) fn construct(
        &self,
        name: &str,
        args: Vec<Value>,
        external: bool,
    ) -> MockResult<ObjectRef> {
        let class = self.load(name)?;
        let obj = ObjectRef::new(Arc::clone(&class));
        if ClassDef::resolve_method(&class, CONSTRUCTOR).is_some() {
            self.invoke(
                Some(obj.clone()),
                &class,
                Arc::clone(&class),
                CONSTRUCTOR,
                args,
                external,
            )?;
        }
        Ok(obj)
    }

    /// Call a public method on an object
    pub fn call(&self, obj: &ObjectRef, method: &str, args: Vec<Value>) -> MockResult<Value> {
        self.invoke(
            Some(obj.clone()),
            obj.class(),
            Arc::clone(obj.class()),
            method,
            args,
            true,
        )
    }

    /// Call a public static method on a class; autoloads the class
    pub fn call_static(&self, class: &str, method: &str, args: Vec<Value>) -> MockResult<Value> {
        let class = self.load(class)?;
        self.invoke(None, &class, Arc::clone(&class), method, args, true)
    }

    /// Call any method on an object, ignoring visibility
    pub(crate) fn call_internal(
        &self,
        obj: &ObjectRef,
        method: &str,
        args: Vec<Value>,
    ) -> MockResult<Value> {
        self.invoke(
            Some(obj.clone()),
            obj.class(),
            Arc::clone(obj.class()),
            method,
            args,
            false,
        )
    }

    /// Call any static method on a class, ignoring visibility
    pub(crate) fn call_static_internal(
        &self,
        class: &str,
        method: &str,
        args: Vec<Value>,
    ) -> MockResult<Value> {
        let class = self.load(class)?;
        self.invoke(None, &class, Arc::clone(&class), method, args, false)
    }

    /// Resolve `method` starting at `start` and run it.
    pub(crate) fn invoke(
        &self,
        this: Option<ObjectRef>,
        start: &Arc<ClassDef>,
        called: Arc<ClassDef>,
        method: &str,
        args: Vec<Value>,
        external: bool,
    ) -> MockResult<Value> {
        let (declaring, def) = ClassDef::resolve_method(start, method)
            .ok_or_else(|| MockError::undefined_method(start.name(), method))?;

        if external && def.visibility != Visibility::Public {
            return Err(MockError::Visibility {
                class: declaring.name().to_string(),
                method: method.to_string(),
                visibility: def.visibility.to_string(),
            });
        }

        let this = if def.is_static {
            None
        } else {
            Some(this.ok_or_else(|| {
                MockError::invalid_call(
                    declaring.name(),
                    method,
                    "non-static method called statically",
                )
            })?)
        };

        let body = def.implementation().cloned().ok_or_else(|| {
            MockError::invalid_call(declaring.name(), method, "cannot call abstract method")
        })?;

        trace!(
            class = declaring.name(),
            called = called.name(),
            method,
            args = args.len(),
            "dispatch"
        );
        let ctx = CallContext::new(self, this, declaring, called, method);
        body(&ctx, args)
    }

    /// Read a property, falling back to a `__get` hook
    pub fn get_property(&self, obj: &ObjectRef, property: &str) -> MockResult<Value> {
        if let Some(value) = obj.field(property) {
            return Ok(value);
        }
        if ClassDef::resolve_method(obj.class(), GET).is_some() {
            return self.call_internal(obj, GET, vec![Value::from(property)]);
        }
        Err(MockError::UndefinedProperty {
            class: obj.class_name().to_string(),
            property: property.to_string(),
        })
    }

    /// Write a property
    pub fn set_property(&self, obj: &ObjectRef, property: &str, value: Value) {
        obj.set_field(property, value);
    }

    /// Run the object's finalizer, when its class defines one, then
    /// release every object it owns through its fields
    pub fn release(&self, obj: &ObjectRef) -> MockResult<()> {
        if ClassDef::resolve_method(obj.class(), DESTRUCTOR).is_some() {
            self.call_internal(obj, DESTRUCTOR, Vec::new())?;
        }
        for owned in obj.owned_objects() {
            trace!(owner = obj.class_name(), owned = owned.class_name(), "releasing owned object");
            self.release(&owned)?;
        }
        Ok(())
    }

    // =========================================================================
    // Filters
    // =========================================================================

    /// Install a filter on one of an object's methods
    pub fn apply_filter(&self, obj: &ObjectRef, method: &str, filter: Filter) {
        debug!(class = obj.class_name(), method, "applied instance filter");
        obj.add_filter(method, filter);
    }

    /// Install a filter on a static method, keyed by the called class
    pub fn apply_static_filter(&self, class: &str, method: &str, filter: Filter) {
        debug!(class, method, "applied static filter");
        self.static_filters
            .write()
            .entry(class.to_string())
            .or_default()
            .add(method, filter);
    }

    /// Static filters of a class's method, in registration order
    #[must_use]
    pub fn static_filters(&self, class: &str, method: &str) -> Vec<Filter> {
        self.static_filters
            .read()
            .get(class)
            .map(|table| table.get(method))
            .unwrap_or_default()
    }

    /// Drop the static filters of a class's method
    pub fn clear_static_filters(&self, class: &str, method: &str) {
        if let Some(table) = self.static_filters.write().get_mut(class) {
            table.clear(method);
        }
    }
}
