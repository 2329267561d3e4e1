//! Filtermock: On-Demand Mock Synthesis with Filter Chains
//!
//! Asking for `<namespace>.<target>.Mock` synthesizes a stand-in for the
//! class `<namespace>.<Target>`. The stand-in behaves like the original
//! until a test installs filters on it: middleware that can stub, spy on or
//! short-circuit any method, static methods and constructors included.
//!
//! # Architecture
//!
//! ```text
//! load("app.widget.Mock")
//!   │
//!   ▼
//! MockNaming ─► validate ─► extract ─► render + build ─► define_all
//!
//! app.widget.Mock ──extends──► app.widget.MockDelegate ──extends──► app.Widget
//!   (runs filters)               (routes by token)                  (real code)
//! ```
//!
//! A facade call appends a token and runs its filters; the last step calls
//! the delegate, which sees the token and runs the real method. When the
//! real method calls another method on itself, that call arrives at the
//! delegate without a token and is sent back through the facade, so
//! internal calls are filtered too.
//!
//! # Example
//!
//! ```rust
//! use filtermock::{filter, ClassBuilder, ClassRegistry, MethodDef, Mocker, MockerConfig, ParamDef, Value, OBJECT};
//!
//! # fn main() -> filtermock::MockResult<()> {
//! let registry = ClassRegistry::new();
//! registry.define(
//!     ClassBuilder::new("app.Widget").extends(OBJECT).method(
//!         MethodDef::new("paint")
//!             .param(ParamDef::required("color"))
//!             .body(|_, args| Ok(Value::from(format!("painted {}", args[0])))),
//!     ),
//! )?;
//! Mocker::new(MockerConfig::default())?.register(&registry);
//!
//! let mock = registry.instantiate("app.widget.Mock", vec![])?;
//! assert_eq!(registry.call(&mock, "paint", vec![Value::from("red")])?, Value::from("painted red"));
//!
//! registry.apply_filter(&mock, "paint", filter(|_, _, _| Ok(Value::from("stubbed"))));
//! assert_eq!(registry.call(&mock, "paint", vec![Value::from("red")])?, Value::from("stubbed"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod config;
pub mod filter;
pub mod mock;
pub mod object;
mod result;
mod value;

pub use config::{MockerConfig, DEFAULT_DENYLIST, DEFAULT_STATIC_TOKEN, MOCKER_FIELD, SAFE_FIELDS_FIELD};
pub use filter::{filter, run_chain, Chain, Filter, FilterTable, Receiver};
pub use mock::{
    GeneratedType, MemberDescriptor, MemberKind, MockNaming, MockRequest, Mocker, Role, Synthesis,
    AUTOLOADER_KEY,
};
pub use object::{
    Autoloader, CallContext, ClassBuilder, ClassDef, ClassRegistry, DefaultValue, MethodDef,
    MethodInfo, ObjectRef, ParamDef, PropertyDef, Visibility, CONSTRUCTOR, DESTRUCTOR, GET, OBJECT,
    STATIC_OBJECT,
};
pub use result::{MockError, MockResult};
pub use value::{Token, Value};
