//! Call context handed to method bodies.

use crate::object::{ClassDef, ClassRegistry, ObjectRef};
use crate::result::{MockError, MockResult};
use crate::value::Value;
use std::sync::Arc;

/// What a running method body can see: its registry, receiver, declaring
/// class and called class.
///
/// Calls made through a context are internal: visibility is not checked.
#[derive(Debug)]
pub struct CallContext<'r> {
    registry: &'r ClassRegistry,
    this: Option<ObjectRef>,
    class: Arc<ClassDef>,
    called: Arc<ClassDef>,
    method: String,
}

impl<'r> CallContext<'r> {
    pub(crate) fn new(
        registry: &'r ClassRegistry,
        this: Option<ObjectRef>,
        class: Arc<ClassDef>,
        called: Arc<ClassDef>,
        method: &str,
    ) -> Self {
        Self {
            registry,
            this,
            class,
            called,
            method: method.to_string(),
        }
    }

    /// Registry the call runs in
    #[must_use]
    pub const fn registry(&self) -> &'r ClassRegistry {
        self.registry
    }

    /// Receiver of an instance call
    pub fn this(&self) -> MockResult<&ObjectRef> {
        self.this.as_ref().ok_or_else(|| {
            MockError::invalid_call(
                self.class.name(),
                &self.method,
                "no receiver in a static context",
            )
        })
    }

    /// Class that declares the running method
    #[must_use]
    pub const fn class(&self) -> &Arc<ClassDef> {
        &self.class
    }

    /// Class the call was made on (late static binding)
    #[must_use]
    pub const fn called_class(&self) -> &Arc<ClassDef> {
        &self.called
    }

    /// Name of the running method
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Call a method on the receiver, dispatching on its runtime class
    pub fn call_this(&self, method: &str, args: Vec<Value>) -> MockResult<Value> {
        let this = self.this()?;
        self.registry.call_internal(this, method, args)
    }

    /// Call a method on the called class
    pub fn call_static(&self, method: &str, args: Vec<Value>) -> MockResult<Value> {
        self.registry.invoke(
            self.this.clone(),
            &self.called,
            Arc::clone(&self.called),
            method,
            args,
            false,
        )
    }

    /// Call the parent class's implementation of a method
    pub fn call_parent(&self, method: &str, args: Vec<Value>) -> MockResult<Value> {
        let parent = self
            .class
            .parent()
            .ok_or_else(|| MockError::undefined_method(format!("{}::parent", self.class.name()), method))?;
        self.registry.invoke(
            self.this.clone(),
            parent,
            Arc::clone(&self.called),
            method,
            args,
            false,
        )
    }

    /// Read a property of the receiver
    pub fn get(&self, property: &str) -> MockResult<Value> {
        self.registry.get_property(self.this()?, property)
    }

    /// Write a property of the receiver
    pub fn set(&self, property: &str, value: Value) -> MockResult<()> {
        self.this()?.set_field(property, value);
        Ok(())
    }
}
