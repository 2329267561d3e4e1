//! The two base classes every mockable class descends from.
//!
//! `core.Object` supports filters on instance methods; `core.StaticObject`
//! supports filters on static methods only.

use crate::object::class::{ClassBuilder, ClassDef, DefaultValue, MethodDef, ParamDef, CONSTRUCTOR};
use crate::object::context::CallContext;
use crate::result::{MockError, MockResult};
use crate::value::Value;
use std::sync::Arc;

/// Base class with instance-level filtering
pub const OBJECT: &str = "core.Object";
/// Base class with static-only filtering
pub const STATIC_OBJECT: &str = "core.StaticObject";

/// Build both base classes
pub(crate) fn base_classes() -> Vec<Arc<ClassDef>> {
    vec![Arc::new(object()), Arc::new(static_object())]
}

fn object() -> ClassDef {
    ClassBuilder::new(OBJECT)
        .property("_config", Value::Array(Vec::new()))
        .method(
            MethodDef::new(CONSTRUCTOR)
                .param(ParamDef::optional("config", DefaultValue::EmptyArray).typed("array"))
                .body(|ctx, args| {
                    let config = args.into_iter().next().unwrap_or(Value::Array(Vec::new()));
                    ctx.set("_config", config)?;
                    ctx.call_this("_init", Vec::new())?;
                    Ok(Value::Null)
                }),
        )
        .method(MethodDef::new("_init").protected().body(|_, _| Ok(Value::Null)))
        .method(
            MethodDef::new("invoke_method")
                .param(ParamDef::required("method"))
                .param(ParamDef::optional("params", DefaultValue::EmptyArray).typed("array"))
                .body(|ctx, args| {
                    let (method, params) = split_invocation(ctx, args)?;
                    ctx.call_this(&method, params)
                }),
        )
        .method(
            MethodDef::new("_parents")
                .protected()
                .static_method()
                .body(parents),
        )
        .method(
            MethodDef::new("_stop")
                .protected()
                .param(ParamDef::optional("status", DefaultValue::Int(0)))
                .body(|_, _| Ok(Value::Null)),
        )
        .finish(None)
}

fn static_object() -> ClassDef {
    ClassBuilder::new(STATIC_OBJECT)
        .method(
            MethodDef::new("invoke_method")
                .static_method()
                .param(ParamDef::required("method"))
                .param(ParamDef::optional("params", DefaultValue::EmptyArray).typed("array"))
                .body(|ctx, args| {
                    let (method, params) = split_invocation(ctx, args)?;
                    ctx.call_static(&method, params)
                }),
        )
        .method(
            MethodDef::new("_instance")
                .protected()
                .static_method()
                .param(ParamDef::required("name"))
                .param(ParamDef::optional("options", DefaultValue::EmptyArray).typed("array"))
                .body(|ctx, args| {
                    let mut args = args.into_iter();
                    let name = match args.next() {
                        Some(Value::Str(name)) => name,
                        _ => {
                            return Err(MockError::invalid_call(
                                ctx.class().name(),
                                "_instance",
                                "class name must be a string",
                            ))
                        }
                    };
                    let options = args.next().unwrap_or(Value::Array(Vec::new()));
                    let obj = ctx.registry().construct(&name, vec![options], false)?;
                    Ok(Value::Object(obj))
                }),
        )
        .method(
            MethodDef::new("_parents")
                .protected()
                .static_method()
                .body(parents),
        )
        .method(
            MethodDef::new("_stop")
                .protected()
                .static_method()
                .param(ParamDef::optional("status", DefaultValue::Int(0)))
                .body(|_, _| Ok(Value::Null)),
        )
        .finish(None)
}

/// Ancestors of the called class, nearest first
fn parents(ctx: &CallContext<'_>, _args: Vec<Value>) -> MockResult<Value> {
    Ok(Value::Array(
        ctx.called_class()
            .lineage()
            .into_iter()
            .skip(1)
            .map(Value::from)
            .collect(),
    ))
}

fn split_invocation(ctx: &CallContext<'_>, args: Vec<Value>) -> MockResult<(String, Vec<Value>)> {
    let mut args = args.into_iter();
    let method = match args.next() {
        Some(Value::Str(method)) => method,
        _ => {
            return Err(MockError::invalid_call(
                ctx.class().name(),
                "invoke_method",
                "method name must be a string",
            ))
        }
    };
    let params = match args.next() {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    };
    Ok((method, params))
}
