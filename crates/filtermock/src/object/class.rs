//! Class, method and parameter definitions.
//!
//! Classes are immutable once built. Parents are held by `Arc`, so a
//! registered class keeps its whole ancestry alive.

use crate::object::context::CallContext;
use crate::result::MockResult;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Canonical constructor name
pub const CONSTRUCTOR: &str = "__construct";
/// Finalizer run by [`ClassRegistry::release`](crate::ClassRegistry::release)
pub const DESTRUCTOR: &str = "__destruct";
/// Catch-all property read hook
pub const GET: &str = "__get";

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Callable from anywhere
    #[default]
    Public,
    /// Callable from the class hierarchy
    Protected,
    /// Callable from the declaring class
    Private,
}

impl Visibility {
    /// Keyword spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default value of an optional parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// `null`
    Null,
    /// Boolean literal
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal
    Str(String),
    /// Empty collection
    EmptyArray,
    /// Named constant, emitted verbatim
    Constant(String),
}

impl DefaultValue {
    /// Runtime value used when the argument is omitted
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Float(x) => Value::Float(*x),
            Self::Str(s) => Value::Str(s.clone()),
            Self::EmptyArray => Value::Array(Vec::new()),
            Self::Constant(name) => Value::Str(name.clone()),
        }
    }
}

/// A formal parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    /// Parameter name
    pub name: String,
    /// Declared type, if any
    pub type_hint: Option<String>,
    /// Declared with an explicit nullable marker
    pub nullable: bool,
    /// Default value for optional parameters
    pub default: Option<DefaultValue>,
    /// Collects the remaining arguments
    pub variadic: bool,
}

impl ParamDef {
    /// Create a required parameter
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            nullable: false,
            default: None,
            variadic: false,
        }
    }

    /// Create an optional parameter with a default
    #[must_use]
    pub fn optional(name: impl Into<String>, default: DefaultValue) -> Self {
        Self {
            default: Some(default),
            ..Self::required(name)
        }
    }

    /// Create a variadic parameter
    #[must_use]
    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            variadic: true,
            ..Self::required(name)
        }
    }

    /// Set the declared type
    #[must_use]
    pub fn typed(mut self, type_hint: impl Into<String>) -> Self {
        self.type_hint = Some(type_hint.into());
        self
    }

    /// Mark the declared type nullable
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Whether the argument may be omitted
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.default.is_some() || self.variadic
    }
}

/// Method implementation
pub type MethodBody = Arc<dyn Fn(&CallContext<'_>, Vec<Value>) -> MockResult<Value> + Send + Sync>;

/// A method definition
#[derive(Clone)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Declared visibility
    pub visibility: Visibility,
    /// Has no receiver
    pub is_static: bool,
    /// Declared final
    pub is_final: bool,
    /// Declared abstract (no body)
    pub is_abstract: bool,
    /// Formal parameters in order
    pub params: Vec<ParamDef>,
    body: Option<MethodBody>,
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("is_final", &self.is_final)
            .field("is_abstract", &self.is_abstract)
            .field("params", &self.params)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

impl MethodDef {
    /// Create a public instance method with no parameters and no body
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            is_final: false,
            is_abstract: false,
            params: Vec::new(),
            body: None,
        }
    }

    /// Set visibility
    #[must_use]
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Make protected
    #[must_use]
    pub const fn protected(self) -> Self {
        self.visibility(Visibility::Protected)
    }

    /// Make private
    #[must_use]
    pub const fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    /// Make static
    #[must_use]
    pub const fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark final
    #[must_use]
    pub const fn final_method(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Mark abstract
    #[must_use]
    pub const fn abstract_method(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Append a parameter
    #[must_use]
    pub fn param(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    /// Replace all parameters
    #[must_use]
    pub fn params(mut self, params: Vec<ParamDef>) -> Self {
        self.params = params;
        self
    }

    /// Set the implementation
    #[must_use]
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&CallContext<'_>, Vec<Value>) -> MockResult<Value> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    /// Implementation, if the method is not abstract
    #[must_use]
    pub fn implementation(&self) -> Option<&MethodBody> {
        self.body.as_ref()
    }
}

/// A property and its initial value
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// Value seeded into new instances
    pub default: Value,
}

/// A reflected method together with the class that declares it
#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// Declaring class name
    pub declaring_class: String,
    /// The method
    pub method: MethodDef,
}

impl MethodInfo {
    /// Method name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.method.name
    }
}

/// An immutable class definition
pub struct ClassDef {
    name: String,
    parent: Option<Arc<ClassDef>>,
    methods: Vec<MethodDef>,
    properties: Vec<PropertyDef>,
    source: Option<String>,
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field(
                "methods",
                &self.methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            )
            .field("properties", &self.properties.len())
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

impl ClassDef {
    /// Fully qualified name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class
    #[must_use]
    pub const fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    /// Methods declared by this class, in declaration order
    #[must_use]
    pub fn own_methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// Method declared by this class
    #[must_use]
    pub fn own_method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Properties declared by this class
    #[must_use]
    pub fn own_properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    /// Generated source listing, for synthesized classes
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Names of this class and its ancestors, nearest first
    #[must_use]
    pub fn lineage(&self) -> Vec<&str> {
        let mut names = vec![self.name()];
        let mut current = self.parent.as_deref();
        while let Some(class) = current {
            names.push(class.name());
            current = class.parent.as_deref();
        }
        names
    }

    /// Strict subclass test against an ancestor name
    #[must_use]
    pub fn is_subclass_of(&self, ancestor: &str) -> bool {
        self.lineage().iter().skip(1).any(|name| *name == ancestor)
    }

    /// Find a method starting at `class` and walking up the parents.
    ///
    /// Returns the declaring class with the method.
    #[must_use]
    pub fn resolve_method(class: &Arc<Self>, name: &str) -> Option<(Arc<Self>, MethodDef)> {
        let mut current = Some(class);
        while let Some(candidate) = current {
            if let Some(method) = candidate.own_method(name) {
                return Some((Arc::clone(candidate), method.clone()));
            }
            current = candidate.parent.as_ref();
        }
        None
    }

    /// All callable methods: own ones first, then inherited ones that are
    /// not overridden.
    #[must_use]
    pub fn methods(&self) -> Vec<MethodInfo> {
        let mut seen: Vec<&str> = Vec::new();
        let mut infos = Vec::new();
        let mut current = Some(self);
        while let Some(class) = current {
            for method in &class.methods {
                if !seen.contains(&method.name.as_str()) {
                    seen.push(&method.name);
                    infos.push(MethodInfo {
                        declaring_class: class.name.clone(),
                        method: method.clone(),
                    });
                }
            }
            current = class.parent.as_deref();
        }
        infos
    }

    /// Property defaults for a new instance, base classes first
    #[must_use]
    pub fn property_defaults(&self) -> Vec<PropertyDef> {
        let mut chain: Vec<&Self> = Vec::new();
        let mut current = Some(self);
        while let Some(class) = current {
            chain.push(class);
            current = class.parent.as_deref();
        }
        chain
            .into_iter()
            .rev()
            .flat_map(|class| class.properties.iter().cloned())
            .collect()
    }
}

/// How a builder names its parent
#[derive(Debug, Clone)]
pub(crate) enum ParentRef {
    Name(String),
    Class(Arc<ClassDef>),
}

/// Builder for [`ClassDef`]
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    parent: Option<ParentRef>,
    methods: Vec<MethodDef>,
    properties: Vec<PropertyDef>,
    source: Option<String>,
}

impl ClassBuilder {
    /// Start a class
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            methods: Vec::new(),
            properties: Vec::new(),
            source: None,
        }
    }

    /// Extend a class by name; resolved (and autoloaded) when the class is built
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(ParentRef::Name(parent.into()));
        self
    }

    /// Extend an already built class
    #[must_use]
    pub fn extends_class(mut self, parent: Arc<ClassDef>) -> Self {
        self.parent = Some(ParentRef::Class(parent));
        self
    }

    /// Add a method, replacing any earlier one of the same name
    #[must_use]
    pub fn method(mut self, method: MethodDef) -> Self {
        self.push_method(method);
        self
    }

    pub(crate) fn push_method(&mut self, method: MethodDef) {
        if let Some(existing) = self.methods.iter_mut().find(|m| m.name == method.name) {
            *existing = method;
        } else {
            self.methods.push(method);
        }
    }

    /// Add a property with its initial value
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            default: default.into(),
        });
        self
    }

    /// Attach a source listing
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Class name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn parent_ref(&self) -> Option<&ParentRef> {
        self.parent.as_ref()
    }

    pub(crate) fn finish(self, parent: Option<Arc<ClassDef>>) -> ClassDef {
        ClassDef {
            name: self.name,
            parent,
            methods: self.methods,
            properties: self.properties,
            source: self.source,
        }
    }
}
