//! End-to-end tests for mock synthesis and call routing.
//!
//! Every test builds a fresh registry, registers a mocker as an autoload
//! hook and asks the registry for `<namespace>.<target>.Mock`.

use filtermock::{
    filter, ClassBuilder, ClassRegistry, DefaultValue, MethodDef, MockError, Mocker, MockerConfig,
    ObjectRef, ParamDef, Receiver, Token, Value, DEFAULT_STATIC_TOKEN, DESTRUCTOR, MOCKER_FIELD,
    OBJECT, STATIC_OBJECT,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Fixtures
// ============================================================================

fn widget() -> ClassBuilder {
    ClassBuilder::new("app.Widget")
        .extends(OBJECT)
        .property("finish", "matte")
        .method(
            MethodDef::new("paint")
                .param(ParamDef::required("color"))
                .body(|ctx, args| {
                    let finish = ctx.get("finish")?;
                    Ok(Value::from(format!("painted {} {finish}", args[0])))
                }),
        )
        .method(
            MethodDef::new("repaint")
                .param(ParamDef::required("color"))
                .body(|ctx, args| {
                    let painted = ctx.call_this("paint", args)?;
                    Ok(Value::from(format!("re{painted}")))
                }),
        )
        .method(
            MethodDef::new("create")
                .static_method()
                .body(|_, _| Ok(Value::from("widget"))),
        )
        .method(
            MethodDef::new("make")
                .static_method()
                .body(|ctx, _| ctx.call_static("create", vec![])),
        )
        .method(
            MethodDef::new("secret")
                .protected()
                .body(|_, _| Ok(Value::from("secret"))),
        )
        .method(MethodDef::new("_filter").body(|_, _| Ok(Value::from("target filter"))))
}

fn gadget(released: Arc<AtomicUsize>) -> ClassBuilder {
    ClassBuilder::new("app.Gadget")
        .extends(OBJECT)
        .method(
            MethodDef::new("__construct")
                .param(ParamDef::required("name"))
                .param(ParamDef::optional("size", DefaultValue::Int(3)))
                .body(|ctx, args| {
                    let mut args = args.into_iter();
                    ctx.set("name", args.next().unwrap_or_default())?;
                    ctx.set("size", args.next().unwrap_or_default())?;
                    Ok(Value::Null)
                }),
        )
        .method(MethodDef::new("size").body(|ctx, _| ctx.get("size")))
        .method(MethodDef::new(DESTRUCTOR).body(move |_, _| {
            released.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        }))
}

fn setup() -> ClassRegistry {
    let registry = ClassRegistry::new();
    registry.define(widget()).unwrap();
    registry
        .define(ClassBuilder::new("app.Plain").method(MethodDef::new("run")))
        .unwrap();
    Mocker::new(MockerConfig::default())
        .unwrap()
        .register(&registry);
    registry
}

fn red() -> Vec<Value> {
    vec![Value::from("red")]
}

fn mock(registry: &ClassRegistry) -> ObjectRef {
    registry.instantiate("app.widget.Mock", vec![]).unwrap()
}

// ============================================================================
// Widget scenario
// ============================================================================

#[test]
fn widget_paint_matches_real_call() {
    let registry = setup();
    let real = registry.instantiate("app.Widget", vec![]).unwrap();
    let mock = mock(&registry);
    assert_eq!(
        registry.call(&mock, "paint", red()).unwrap(),
        registry.call(&real, "paint", red()).unwrap()
    );
    assert_eq!(
        registry.call(&mock, "paint", red()).unwrap(),
        Value::from("painted red matte")
    );
}

#[test]
fn widget_stubbed_filter_replaces_real_call() {
    let registry = setup();
    let mock = mock(&registry);
    registry.apply_filter(&mock, "paint", filter(|_, _, _| Ok(Value::from("stubbed"))));
    assert_eq!(
        registry.call(&mock, "paint", red()).unwrap(),
        Value::from("stubbed")
    );
}

#[test]
fn filters_on_one_instance_leave_others_alone() {
    let registry = setup();
    let stubbed = mock(&registry);
    let plain = mock(&registry);
    registry.apply_filter(&stubbed, "paint", filter(|_, _, _| Ok(Value::from("stubbed"))));
    assert_eq!(
        registry.call(&plain, "paint", red()).unwrap(),
        Value::from("painted red matte")
    );
}

#[test]
fn filters_run_outermost_first_and_see_the_token() {
    let registry = setup();
    let mock = mock(&registry);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&seen);
    registry.apply_filter(
        &mock,
        "paint",
        filter(move |receiver, params, chain| {
            log.lock().unwrap().push(format!("outer {}", receiver.class_name()));
            let result = chain.next(receiver, params)?;
            Ok(Value::from(format!("[{result}]")))
        }),
    );
    let log = Arc::clone(&seen);
    registry.apply_filter(
        &mock,
        "paint",
        filter(move |receiver, params, chain| {
            log.lock().unwrap().push(format!("inner {}", params.len()));
            assert_eq!(params[0], Value::from("red"));
            assert!(params.last().and_then(Value::as_token).is_some());
            chain.next(receiver, params)
        }),
    );

    assert_eq!(
        registry.call(&mock, "paint", red()).unwrap(),
        Value::from("[painted red matte]")
    );
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["outer app.widget.Mock".to_string(), "inner 2".to_string()]
    );
}

// ============================================================================
// Routing
// ============================================================================

#[test]
fn self_call_is_intercepted_exactly_once() {
    let registry = setup();
    let mock = mock(&registry);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    registry.apply_filter(
        &mock,
        "paint",
        filter(move |receiver, params, chain| {
            counter.fetch_add(1, Ordering::SeqCst);
            chain.next(receiver, params)
        }),
    );

    assert_eq!(
        registry.call(&mock, "repaint", red()).unwrap(),
        Value::from("repainted red matte")
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn self_call_sees_stub() {
    let registry = setup();
    let mock = mock(&registry);
    registry.apply_filter(&mock, "paint", filter(|_, _, _| Ok(Value::from("stubbed"))));
    assert_eq!(
        registry.call(&mock, "repaint", red()).unwrap(),
        Value::from("restubbed")
    );
}

#[test]
fn facade_and_delegate_are_linked() {
    let registry = setup();
    let mock = mock(&registry);
    let delegate = match mock.field(MOCKER_FIELD) {
        Some(Value::Object(delegate)) => delegate,
        other => panic!("expected a delegate, got {other:?}"),
    };
    assert_eq!(delegate.class_name(), "app.widget.MockDelegate");
    assert!(delegate.is_a("app.Widget"));
    assert_eq!(delegate.owner(), Some(mock.clone()));
    assert!(mock.is_a("app.widget.MockDelegate"));
}

#[test]
fn constructor_arguments_reach_the_real_constructor() {
    let registry = setup();
    registry
        .define(gadget(Arc::new(AtomicUsize::new(0))))
        .unwrap();
    let mock = registry
        .instantiate("app.gadget.Mock", vec![Value::from("g")])
        .unwrap();

    let mut fields = mock.field_names();
    fields.sort();
    assert_eq!(fields, vec!["_safe_vars".to_string(), MOCKER_FIELD.to_string()]);

    assert_eq!(registry.get_property(&mock, "size").unwrap(), Value::Int(3));
    assert_eq!(registry.get_property(&mock, "name").unwrap(), Value::from("g"));
    assert_eq!(registry.call(&mock, "size", vec![]).unwrap(), Value::Int(3));
}

#[test]
fn missing_constructor_argument_is_an_error() {
    let registry = setup();
    registry
        .define(gadget(Arc::new(AtomicUsize::new(0))))
        .unwrap();
    let err = registry.instantiate("app.gadget.Mock", vec![]).unwrap_err();
    assert!(matches!(err, MockError::InvalidCall { .. }));
}

#[test]
fn facade_finalizer_is_a_no_op() {
    let registry = setup();
    let released = Arc::new(AtomicUsize::new(0));
    registry.define(gadget(Arc::clone(&released))).unwrap();
    let mock = registry
        .instantiate("app.gadget.Mock", vec![Value::from("g")])
        .unwrap();

    assert_eq!(registry.call(&mock, DESTRUCTOR, vec![]).unwrap(), Value::Null);
    assert_eq!(released.load(Ordering::SeqCst), 0);
    assert_eq!(registry.call(&mock, "size", vec![]).unwrap(), Value::Int(3));
}

#[test]
fn releasing_a_mock_runs_the_target_finalizer_once() {
    let registry = setup();
    let released = Arc::new(AtomicUsize::new(0));
    registry.define(gadget(Arc::clone(&released))).unwrap();

    let real = registry
        .instantiate("app.Gadget", vec![Value::from("r")])
        .unwrap();
    registry.release(&real).unwrap();
    assert_eq!(released.load(Ordering::SeqCst), 1);

    let mock = registry
        .instantiate("app.gadget.Mock", vec![Value::from("g")])
        .unwrap();
    registry.release(&mock).unwrap();
    drop(mock);
    assert_eq!(released.load(Ordering::SeqCst), 2);
}

#[test]
fn delegate_outliving_its_mock_runs_real_code() {
    let registry = setup();
    registry
        .define(
            ClassBuilder::new("app.Res")
                .extends(OBJECT)
                .method(MethodDef::new("me").body(|ctx, _| Ok(Value::Object(ctx.this()?.clone()))))
                .method(MethodDef::new("ping").body(|ctx, _| {
                    let pong = ctx.call_this("pong", vec![])?;
                    Ok(Value::from(format!("ping {pong}")))
                }))
                .method(MethodDef::new("pong").body(|_, _| Ok(Value::from("pong")))),
        )
        .unwrap();

    let escaped = {
        let mock = registry.instantiate("app.res.Mock", vec![]).unwrap();
        match registry.call(&mock, "me", vec![]).unwrap() {
            Value::Object(obj) => obj,
            other => panic!("expected an object, got {other:?}"),
        }
    };
    assert_eq!(escaped.class_name(), "app.res.MockDelegate");
    assert!(escaped.owner().is_none());
    assert_eq!(
        registry.call(&escaped, "ping", vec![]).unwrap(),
        Value::from("ping pong")
    );
}

#[test]
fn escaped_delegate_still_routes_through_a_live_mock() {
    let registry = setup();
    let mock = mock(&registry);
    let delegate = match mock.field(MOCKER_FIELD) {
        Some(Value::Object(delegate)) => delegate,
        other => panic!("expected a delegate, got {other:?}"),
    };
    registry.apply_filter(&mock, "paint", filter(|_, _, _| Ok(Value::from("stubbed"))));
    assert_eq!(
        registry.call(&delegate, "repaint", red()).unwrap(),
        Value::from("restubbed")
    );
}

#[test]
fn property_reads_fall_through_to_the_delegate() {
    let registry = setup();
    let mock = mock(&registry);
    assert!(!mock.has_field("finish"));
    assert_eq!(
        registry.get_property(&mock, "finish").unwrap(),
        Value::from("matte")
    );
    assert!(matches!(
        registry.get_property(&mock, "nope").unwrap_err(),
        MockError::UndefinedProperty { .. }
    ));
}

// ============================================================================
// Static methods
// ============================================================================

#[test]
fn static_method_routes_and_filters() {
    let registry = setup();
    assert_eq!(
        registry.call_static("app.widget.Mock", "create", vec![]).unwrap(),
        Value::from("widget")
    );
    registry.apply_static_filter(
        "app.widget.Mock",
        "create",
        filter(|receiver, _, _| {
            assert!(matches!(receiver, Receiver::Class(class) if class.name() == "app.widget.Mock"));
            Ok(Value::from("stub widget"))
        }),
    );
    assert_eq!(
        registry.call_static("app.widget.Mock", "create", vec![]).unwrap(),
        Value::from("stub widget")
    );
    assert_eq!(
        registry.call_static("app.Widget", "create", vec![]).unwrap(),
        Value::from("widget")
    );
}

#[test]
fn static_self_call_is_intercepted() {
    let registry = setup();
    registry.load("app.widget.Mock").unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    registry.apply_static_filter(
        "app.widget.Mock",
        "create",
        filter(move |receiver, params, chain| {
            counter.fetch_add(1, Ordering::SeqCst);
            chain.next(receiver, params)
        }),
    );
    assert_eq!(
        registry.call_static("app.widget.Mock", "make", vec![]).unwrap(),
        Value::from("widget")
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

/// Static calls carry one fixed token, so every mock of a target, in any
/// registry, presents the same token. Only instance tokens are unique.
#[test]
fn static_token_is_shared_between_mocks() {
    let captured = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..2 {
        let registry = setup();
        let sink = Arc::clone(&captured);
        registry.load("app.widget.Mock").unwrap();
        registry.apply_static_filter(
            "app.widget.Mock",
            "create",
            filter(move |receiver, params, chain| {
                sink.lock().unwrap().push(params.last().cloned());
                chain.next(receiver, params)
            }),
        );
        registry.call_static("app.widget.Mock", "create", vec![]).unwrap();
    }
    let captured = captured.lock().unwrap();
    let expected = Some(Value::Token(Token::new(DEFAULT_STATIC_TOKEN)));
    assert_eq!(*captured, vec![expected.clone(), expected]);

    let registry = setup();
    let a = mock(&registry);
    let b = mock(&registry);
    assert_ne!(a.token(), b.token());
}

#[test]
fn static_object_targets_are_mockable() {
    let registry = setup();
    registry
        .define(
            ClassBuilder::new("app.Clock").extends(STATIC_OBJECT).method(
                MethodDef::new("now")
                    .static_method()
                    .body(|_, _| Ok(Value::Int(1_000))),
            ),
        )
        .unwrap();
    assert_eq!(
        registry.call_static("app.clock.Mock", "now", vec![]).unwrap(),
        Value::Int(1_000)
    );
}

// ============================================================================
// Member set, denylist and visibility
// ============================================================================

#[test]
fn mock_members_match_target_minus_denylist() {
    let registry = setup();
    let facade = registry.load("app.widget.Mock").unwrap();
    let mut own: Vec<_> = facade.own_methods().iter().map(|m| m.name.clone()).collect();
    own.sort();
    assert_eq!(
        own,
        vec![
            "__construct",
            "__destruct",
            "__get",
            "create",
            "make",
            "paint",
            "repaint",
            "secret"
        ]
    );
}

#[test]
fn denylisted_target_member_is_never_proxied() {
    let registry = setup();
    let facade = registry.load("app.widget.Mock").unwrap();
    assert!(facade.own_method("_filter").is_none());
    assert!(facade.parent().unwrap().own_method("_filter").is_none());

    let mock = mock(&registry);
    registry.apply_filter(&mock, "_filter", filter(|_, _, _| Ok(Value::from("filtered"))));
    assert_eq!(
        registry.call(&mock, "_filter", vec![]).unwrap(),
        Value::from("target filter")
    );
}

#[test]
fn configured_denylist_is_honoured() {
    let registry = ClassRegistry::new();
    registry.define(widget()).unwrap();
    Mocker::new(MockerConfig::default().with_denied("repaint"))
        .unwrap()
        .register(&registry);
    let facade = registry.load("app.widget.Mock").unwrap();
    assert!(facade.own_method("repaint").is_none());
    assert!(facade.own_method("paint").is_some());
}

#[test]
fn protected_members_are_public_on_the_mock() {
    let registry = setup();
    let real = registry.instantiate("app.Widget", vec![]).unwrap();
    assert!(matches!(
        registry.call(&real, "secret", vec![]).unwrap_err(),
        MockError::Visibility { .. }
    ));
    let mock = mock(&registry);
    assert_eq!(
        registry.call(&mock, "secret", vec![]).unwrap(),
        Value::from("secret")
    );
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn resolution_is_idempotent() {
    let registry = setup();
    let first = registry.load("app.widget.Mock").unwrap();
    let second = registry.load("app.widget.Mock").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn non_mock_identifiers_fall_through() {
    let registry = setup();
    assert!(registry.load("app.Nothing").unwrap_err().is_class_not_found());
    assert!(registry.load("app.nothing.Mock").unwrap_err().is_class_not_found());
    assert!(registry.load("app.plain.Mock").unwrap_err().is_class_not_found());
    assert!(!registry.exists("app.plain.MockDelegate"));
}

#[test]
fn failed_synthesis_surfaces_as_class_not_found() {
    let registry = setup();
    registry
        .define(ClassBuilder::new("app.widget.MockDelegate"))
        .unwrap();
    let err = registry.load("app.widget.Mock").unwrap_err();
    assert!(matches!(err, MockError::ClassNotFound { name } if name == "app.widget.Mock"));
}

#[test]
fn custom_separator_end_to_end() {
    let registry = ClassRegistry::new();
    registry
        .define(
            ClassBuilder::new("app::Parser").extends(OBJECT).method(
                MethodDef::new("parse")
                    .param(ParamDef::required("text"))
                    .body(|_, args| Ok(Value::from(format!("parsed {}", args[0])))),
            ),
        )
        .unwrap();
    Mocker::new(MockerConfig::default().with_separator("::"))
        .unwrap()
        .register(&registry);
    let mock = registry.instantiate("app::parser::Mock", vec![]).unwrap();
    assert_eq!(
        registry.call(&mock, "parse", vec![Value::from("x")]).unwrap(),
        Value::from("parsed x")
    );
    assert!(registry.exists("app::parser::MockDelegate"));
}

#[test]
fn concurrent_resolution_defines_one_mock() {
    let registry = setup();
    let classes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| registry.load("app.widget.Mock").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let registered = registry.find("app.widget.Mock").unwrap();
    assert!(classes.iter().all(|class| Arc::ptr_eq(class, &registered)));
}

#[test]
fn logging_does_not_interfere() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
    let registry = setup();
    let mock = mock(&registry);
    assert_eq!(
        registry.call(&mock, "repaint", red()).unwrap(),
        Value::from("repainted red matte")
    );
}
