//! Method bodies installed into generated classes.
//!
//! A facade call appends a token and runs the filter chain; the chain's
//! terminal calls the delegate with the token still attached. The delegate
//! strips a matching token and runs the parent implementation. Anything
//! arriving at the delegate without the token came from the target's own
//! code calling itself, so it goes back through the facade and its filters.
//!
//! Releasing a facade releases the delegate it owns, which runs the target's
//! finalizer; the facade's own finalizer does nothing.

use crate::config::MOCKER_FIELD;
use crate::filter::{run_chain, Receiver};
use crate::mock::descriptor::{MemberDescriptor, MemberKind};
use crate::mock::naming::MockRequest;
use crate::object::{MethodDef, ObjectRef, ParamDef, CONSTRUCTOR, DESTRUCTOR, GET};
use crate::result::{MockError, MockResult};
use crate::value::{Token, Value};
use std::sync::Arc;
use tracing::trace;

/// Builds the method bodies for one facade/delegate pair
#[derive(Debug, Clone)]
pub(crate) struct Routes {
    facade: Arc<str>,
    delegate: Arc<str>,
    static_token: Token,
    safe_fields: Arc<[String]>,
}

impl Routes {
    pub(crate) fn new(request: &MockRequest, static_token: &str, safe_fields: &[String]) -> Self {
        Self {
            facade: Arc::from(request.facade.as_str()),
            delegate: Arc::from(request.delegate.as_str()),
            static_token: Token::new(static_token),
            safe_fields: Arc::from(safe_fields),
        }
    }

    // =========================================================================
    // Delegate
    // =========================================================================

    /// Pops the owning facade, links both objects and runs the real constructor
    pub(crate) fn delegate_constructor(member: &MemberDescriptor) -> MethodDef {
        generated(member).body(|ctx, mut args| {
            let this = ctx.this()?;
            let facade = match args.pop() {
                Some(Value::Object(facade)) => facade,
                _ => {
                    return Err(MockError::invalid_call(
                        this.class_name(),
                        CONSTRUCTOR,
                        "expected the owning mock as the last argument",
                    ))
                }
            };
            this.set_owner(&facade);
            facade.set_field(MOCKER_FIELD, Value::Object(this.clone()));
            trace!(delegate = this.class_name(), facade = %facade.id(), "linked delegate to facade");
            ctx.call_parent(CONSTRUCTOR, args)
        })
    }

    /// Runs the real method on a token match, else re-enters the facade.
    ///
    /// A delegate that outlives its facade runs the real method directly.
    pub(crate) fn delegate_method(member: &MemberDescriptor) -> MethodDef {
        let name = member.name.clone();
        generated(member).body(move |ctx, mut args| {
            let this = ctx.this()?;
            if take_token(&mut args, &this.token()) {
                trace!(class = this.class_name(), method = %name, "token matched, calling parent");
                return ctx.call_parent(&name, args);
            }
            let Some(owner) = this.owner() else {
                trace!(class = this.class_name(), method = %name, "mock is gone, calling parent");
                return ctx.call_parent(&name, args);
            };
            trace!(class = this.class_name(), method = %name, "self-call, forwarding to mock");
            ctx.registry().call_internal(&owner, &name, args)
        })
    }

    /// Static counterpart of [`Self::delegate_method`], keyed by the shared token
    pub(crate) fn delegate_static_method(&self, member: &MemberDescriptor) -> MethodDef {
        let name = member.name.clone();
        let facade = Arc::clone(&self.facade);
        let token = self.static_token.clone();
        generated(member).body(move |ctx, mut args| {
            if take_token(&mut args, &token) {
                trace!(class = ctx.class().name(), method = %name, "static token matched, calling parent");
                return ctx.call_parent(&name, args);
            }
            trace!(class = ctx.class().name(), method = %name, "static self-call, forwarding to mock");
            ctx.registry().call_static_internal(&facade, &name, args)
        })
    }

    // =========================================================================
    // Facade
    // =========================================================================

    /// Binds arguments, appends itself, clears unsafe fields and builds the delegate
    pub(crate) fn facade_constructor(&self, member: &MemberDescriptor) -> MethodDef {
        let params = member.params.clone();
        let delegate = Arc::clone(&self.delegate);
        let safe_fields = Arc::clone(&self.safe_fields);
        generated(member).body(move |ctx, args| {
            let this = ctx.this()?;
            let mut args = bind_arguments(this.class_name(), &params, args)?;
            args.push(Value::Object(this.clone()));
            this.retain_fields(|field| safe_fields.iter().any(|safe| safe == field));
            ctx.registry().construct(&delegate, args, false)?;
            Ok(Value::Null)
        })
    }

    /// Appends the delegate's token and runs the instance filters
    pub(crate) fn facade_method(&self, member: &MemberDescriptor) -> MethodDef {
        let name = member.name.clone();
        generated(member).body(move |ctx, mut args| {
            let this = ctx.this()?;
            let delegate = delegate_of(this)?;
            args.push(Value::Token(delegate.token()));
            let filters = this.filters_for(&name);
            let registry = ctx.registry();
            let terminal = |_: &Receiver, args: Vec<Value>| -> MockResult<Value> {
                registry.call_internal(&delegate, &name, args)
            };
            run_chain(&name, &Receiver::Instance(this.clone()), &filters, args, &terminal)
        })
    }

    /// Appends the static token and runs the called class's static filters
    pub(crate) fn facade_static_method(&self, member: &MemberDescriptor) -> MethodDef {
        let name = member.name.clone();
        let delegate = Arc::clone(&self.delegate);
        let token = self.static_token.clone();
        generated(member).body(move |ctx, mut args| {
            args.push(Value::Token(token.clone()));
            let called = Arc::clone(ctx.called_class());
            let registry = ctx.registry();
            let filters = registry.static_filters(called.name(), &name);
            let terminal = |_: &Receiver, args: Vec<Value>| -> MockResult<Value> {
                registry.call_static_internal(&delegate, &name, args)
            };
            run_chain(&name, &Receiver::Class(called), &filters, args, &terminal)
        })
    }

    /// Reads missing properties from the delegate
    pub(crate) fn facade_get() -> MethodDef {
        MethodDef::new(GET)
            .param(ParamDef::required("key"))
            .body(|ctx, args| {
                let this = ctx.this()?;
                let key = match args.first() {
                    Some(Value::Str(key)) => key.clone(),
                    _ => {
                        return Err(MockError::invalid_call(
                            this.class_name(),
                            GET,
                            "property name must be a string",
                        ))
                    }
                };
                ctx.registry().get_property(&delegate_of(this)?, &key)
            })
    }

    /// The delegate owns cleanup; the facade's finalizer does nothing.
    ///
    /// [`ClassRegistry::release`](crate::ClassRegistry::release) reaches the
    /// delegate through the facade's `mocker` field.
    pub(crate) fn facade_destructor() -> MethodDef {
        MethodDef::new(DESTRUCTOR).body(|_, _| Ok(Value::Null))
    }
}

/// Public signature of a generated member
fn generated(member: &MemberDescriptor) -> MethodDef {
    let method = MethodDef::new(member.name.clone()).params(member.params.clone());
    if member.kind == MemberKind::StaticMethod {
        method.static_method()
    } else {
        method
    }
}

fn take_token(args: &mut Vec<Value>, expected: &Token) -> bool {
    if matches!(args.last(), Some(Value::Token(token)) if token == expected) {
        args.pop();
        true
    } else {
        false
    }
}

fn delegate_of(facade: &ObjectRef) -> MockResult<ObjectRef> {
    match facade.field(MOCKER_FIELD) {
        Some(Value::Object(delegate)) => Ok(delegate),
        _ => Err(MockError::invalid_state(format!(
            "{} has no delegate; was it constructed?",
            facade.class_name()
        ))),
    }
}

/// Positional arguments padded with declared defaults.
///
/// Extra arguments are dropped unless a variadic parameter collects them.
fn bind_arguments(class: &str, params: &[ParamDef], args: Vec<Value>) -> MockResult<Vec<Value>> {
    let mut args = args.into_iter();
    let mut bound = Vec::with_capacity(params.len());
    for param in params {
        if param.variadic {
            bound.extend(args.by_ref());
            break;
        }
        match (args.next(), &param.default) {
            (Some(value), _) => bound.push(value),
            (None, Some(default)) => bound.push(default.to_value()),
            (None, None) => {
                return Err(MockError::invalid_call(
                    class,
                    CONSTRUCTOR,
                    format!("missing required argument '{}'", param.name),
                ))
            }
        }
    }
    Ok(bound)
}
