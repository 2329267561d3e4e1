//! Host object model.
//!
//! A small dynamic class system: classes with single inheritance, instance
//! and static methods implemented as closures, late static binding and a
//! catch-all property hook. It is the "running program" mocks are
//! synthesized into.

mod bootstrap;
mod class;
mod context;
mod instance;
mod registry;

pub use bootstrap::{OBJECT, STATIC_OBJECT};
pub use class::{
    ClassBuilder, ClassDef, DefaultValue, MethodBody, MethodDef, MethodInfo, ParamDef,
    PropertyDef, Visibility, CONSTRUCTOR, DESTRUCTOR, GET,
};
pub use context::CallContext;
pub use instance::ObjectRef;
pub use registry::{Autoloader, ClassRegistry};
