//! Proptest strategies for generated target classes.
//!
//! Shapes are plain data; [`ClassShape::builder`] turns one into a class
//! extending `core.Object` whose methods echo their name and arguments, so
//! a mock and its target can be compared call by call.
//!
//! ```rust,ignore
//! proptest! {
//!     #[test]
//!     fn prop_mock_matches_target(shape in class_shape()) {
//!         let registry = ClassRegistry::new();
//!         registry.define(shape.builder()).unwrap();
//!         // ...
//!     }
//! }
//! ```

use crate::object::{ClassBuilder, MethodDef, ParamDef, Visibility, OBJECT};
use crate::value::Value;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// One generated method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodShape {
    /// Method name
    pub name: String,
    /// Static or instance
    pub is_static: bool,
    /// Declared visibility
    pub visibility: Visibility,
}

/// One generated class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassShape {
    /// Qualified name, e.g. `gen.Parser`
    pub name: String,
    /// Methods in declaration order
    pub methods: Vec<MethodShape>,
}

impl ClassShape {
    /// Mock identifier for this class
    #[must_use]
    pub fn mock_identifier(&self) -> String {
        let (namespace, short) = self.name.rsplit_once('.').unwrap_or(("", &self.name));
        let mut chars = short.chars();
        let lowered: String = chars
            .next()
            .map(|first| first.to_lowercase().chain(chars).collect())
            .unwrap_or_default();
        format!("{namespace}.{lowered}.Mock")
    }

    /// Class builder whose methods return `name(arg,...)`
    #[must_use]
    pub fn builder(&self) -> ClassBuilder {
        self.methods
            .iter()
            .fold(ClassBuilder::new(self.name.as_str()).extends(OBJECT), |builder, shape| {
                let name = shape.name.clone();
                let mut method = MethodDef::new(shape.name.as_str())
                    .visibility(shape.visibility)
                    .param(ParamDef::required("value"))
                    .body(move |_, args| {
                        let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
                        Ok(Value::from(format!("{name}({})", rendered.join(","))))
                    });
                if shape.is_static {
                    method = method.static_method();
                }
                builder.method(method)
            })
    }
}

/// Any visibility
pub fn visibility() -> impl Strategy<Value = Visibility> {
    prop_oneof![
        3 => Just(Visibility::Public),
        1 => Just(Visibility::Protected),
        1 => Just(Visibility::Private),
    ]
}

/// Method names that never collide with base-class or reserved names
pub fn method_name() -> impl Strategy<Value = String> {
    "m[a-z0-9]{0,8}"
}

/// A class with up to eight uniquely named methods
pub fn class_shape() -> impl Strategy<Value = ClassShape> {
    (
        "[A-Z][a-z0-9]{0,8}",
        prop::collection::btree_map(method_name(), (any::<bool>(), visibility()), 0..8),
    )
        .prop_map(|(short, methods): (String, BTreeMap<String, (bool, Visibility)>)| ClassShape {
            name: format!("gen.{short}"),
            methods: methods
                .into_iter()
                .map(|(name, (is_static, visibility))| MethodShape {
                    name,
                    is_static,
                    visibility,
                })
                .collect(),
        })
}
