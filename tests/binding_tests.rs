//! End-to-end binding scenarios against the built-in module host.
//!
//! Registries and contexts are thread-local, and the test harness runs each
//! test on its own thread, so declarations here never leak between tests.

use std::cell::RefCell;
use std::rc::Rc;

use scriptbind::prelude::*;

#[derive(Default, Clone, PartialEq, Debug)]
struct Point {
    x: f32,
    y: f32,
}

scriptbind::script_aggregate!(Point);

fn declare_point() {
    bind_aggregate::<Point>("Point")
        .constructor(|x: f32, y: f32| Point { x, y })
        .property("x", |p: &Point| p.x, |p: &mut Point, v: f32| p.x = v)
        .property("y", |p: &Point| p.y, |p: &mut Point, v: f32| p.y = v);
}

struct Counter {
    n: i64,
}

scriptbind::script_class!(Counter);

fn declare_counter() {
    bind_class::<Counter>("Counter")
        .constructor(|| Counter { n: 0 })
        .property("n", |c: &Counter| c.n)
        .method("increment", |c: &mut Counter| {
            c.n += 1;
            c.n
        });
}

fn adopt_module() -> ScriptObject {
    let module = Module::new();
    let namespace = module.namespace();
    on_context_created(Box::new(module)).unwrap();
    namespace
}

fn read_float(object: &ScriptObject, name: &str) -> f64 {
    match object.get(name).unwrap() {
        Some(ScriptValue::Float(v)) => v,
        other => panic!("expected float property {name}, got {other:?}"),
    }
}

#[test]
fn aggregate_round_trips_every_field() {
    declare_point();
    let original = Point { x: 1.5, y: -2.25 };
    let engine_value = original.clone().into_script().unwrap();
    let back = Point::from_script(&engine_value).unwrap();
    assert_eq!(back, original);
}

#[test]
fn point_scenario_construct_and_mutate_copy() {
    declare_point();
    let namespace = adopt_module();

    let ctor = namespace.get("Point").unwrap().unwrap();
    let point = ctor
        .as_function()
        .unwrap()
        .call(&[ScriptValue::Float(3.0), ScriptValue::Float(4.0)])
        .unwrap();
    let point = point.as_object().unwrap();

    assert_eq!(read_float(point, "x"), 3.0);
    assert_eq!(read_float(point, "y"), 4.0);

    // Script-side assignment mutates this copy only.
    let other = Point { x: 3.0, y: 4.0 }.into_script().unwrap();
    assert!(point.set("x", ScriptValue::Float(10.0)).unwrap());
    assert_eq!(read_float(point, "x"), 10.0);
    assert_eq!(read_float(other.as_object().unwrap(), "x"), 3.0);
}

#[test]
fn counter_scenario_methods_mutate_reads_cannot_write() {
    declare_counter();
    let namespace = adopt_module();

    let ctor = namespace.get("Counter").unwrap().unwrap();
    let counter = ctor.as_function().unwrap().call(&[]).unwrap();
    let counter = counter.as_object().unwrap();

    let increment = counter.get("increment").unwrap().unwrap();
    let increment = increment.as_function().unwrap();
    assert!(matches!(increment.call(&[]).unwrap(), ScriptValue::Int(1)));
    assert!(matches!(increment.call(&[]).unwrap(), ScriptValue::Int(2)));

    // Writes are rejected without effect.
    assert!(!counter.set("n", ScriptValue::Int(99)).unwrap());
    assert!(matches!(
        counter.get("n").unwrap(),
        Some(ScriptValue::Int(2))
    ));
}

#[test]
fn proxies_of_one_instance_share_state() {
    declare_counter();
    let namespace = adopt_module();

    let mut native = Counter { n: 0 };
    let anchor = Anchor::new(&mut native);
    add_global_instance(&anchor, "first").unwrap();
    add_global_instance(&anchor, "second").unwrap();

    let proxy_a = namespace.get("first").unwrap().unwrap();
    let proxy_a = proxy_a.as_object().unwrap().clone();
    let proxy_b = namespace.get("second").unwrap().unwrap();
    let proxy_b = proxy_b.as_object().unwrap().clone();
    assert!(!proxy_a.same_object(&proxy_b));

    let increment = proxy_a.get("increment").unwrap().unwrap();
    increment.as_function().unwrap().call(&[]).unwrap();

    // The mutation through one proxy is visible through the other.
    assert!(matches!(
        proxy_b.get("n").unwrap(),
        Some(ScriptValue::Int(1))
    ));

    // Both proxies recover the same underlying accessor target.
    let a = LiveAccessor::from_script(&ScriptValue::Object(proxy_a)).unwrap();
    let b = LiveAccessor::from_script(&ScriptValue::Object(proxy_b)).unwrap();
    assert_eq!(a.target_type_name(), b.target_type_name());
}

#[test]
fn constructor_dispatch_is_keyed_by_arity() {
    struct Span {
        lo: i64,
        hi: i64,
    }

    bind_class::<Span>("Span")
        .constructor(|| Span { lo: 0, hi: 0 })
        .constructor(|hi: i64| Span { lo: 0, hi })
        .constructor(|lo: i64, hi: i64| Span { lo, hi })
        .property("lo", |s: &Span| s.lo)
        .property("hi", |s: &Span| s.hi);

    let namespace = adopt_module();
    let ctor = namespace.get("Span").unwrap().unwrap();
    let ctor = ctor.as_function().unwrap();

    let read = |value: &ScriptValue, name: &str| -> i64 {
        match value.as_object().unwrap().get(name).unwrap() {
            Some(ScriptValue::Int(v)) => v,
            other => panic!("expected int property {name}, got {other:?}"),
        }
    };

    let zero = ctor.call(&[]).unwrap();
    assert_eq!((read(&zero, "lo"), read(&zero, "hi")), (0, 0));

    let one = ctor.call(&[ScriptValue::Int(9)]).unwrap();
    assert_eq!((read(&one, "lo"), read(&one, "hi")), (0, 9));

    let two = ctor
        .call(&[ScriptValue::Int(3), ScriptValue::Int(9)])
        .unwrap();
    assert_eq!((read(&two, "lo"), read(&two, "hi")), (3, 9));

    let err = ctor
        .call(&[ScriptValue::Int(1), ScriptValue::Int(2), ScriptValue::Int(3)])
        .unwrap_err();
    assert!(matches!(err, BindError::NoConstructor { arity: 3, .. }));
}

/// Records every installation in call order, standing in for a real engine
/// backend behind the host seam.
struct RecordingHost {
    log: Rc<RefCell<Vec<String>>>,
}

impl ScriptHost for RecordingHost {
    fn install(&mut self, name: &str, _value: ScriptValue) {
        self.log.borrow_mut().push(name.to_owned());
    }
}

#[test]
fn deferred_installs_flush_once_in_enqueue_order() {
    declare_point();
    add_global_object(1i64, "alpha").unwrap();
    add_global_object(2i64, "beta").unwrap();
    add_global_object(3i64, "gamma").unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    on_context_created(Box::new(RecordingHost {
        log: Rc::clone(&log),
    }))
    .unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "Point".to_owned(),
            "alpha".to_owned(),
            "beta".to_owned(),
            "gamma".to_owned(),
        ]
    );

    // A second context sees an already-drained queue.
    on_context_released();
    let second_log = Rc::new(RefCell::new(Vec::new()));
    on_context_created(Box::new(RecordingHost {
        log: Rc::clone(&second_log),
    }))
    .unwrap();
    assert!(second_log.borrow().is_empty());
}

#[test]
fn unknown_property_reads_as_absent() {
    declare_counter();
    let value = Counter { n: 0 }.into_script().unwrap();
    let proxy = value.as_object().unwrap();
    assert!(proxy.get("no_such_property").unwrap().is_none());
}

#[test]
fn expired_instance_reports_checked_error() {
    declare_counter();
    let namespace = adopt_module();

    let stale = {
        let mut native = Counter { n: 5 };
        let anchor = Anchor::new(&mut native);
        add_global_instance(&anchor, "counter").unwrap();
        namespace.get("counter").unwrap().unwrap()
    };

    let err = stale.as_object().unwrap().get("n").unwrap_err();
    assert!(matches!(err, BindError::ExpiredAccessor { .. }));

    let increment = stale.as_object().unwrap().get("increment").unwrap().unwrap();
    let err = increment.as_function().unwrap().call(&[]).unwrap_err();
    assert!(matches!(err, BindError::ExpiredAccessor { .. }));
}

#[test]
fn methods_convert_arguments_and_results() {
    struct Greeter {
        prefix: String,
    }

    bind_class::<Greeter>("Greeter").method(
        "greet",
        |g: &Greeter, name: String, excited: bool| {
            let mark = if excited { "!" } else { "." };
            format!("{}{name}{mark}", g.prefix)
        },
    );

    let mut greeter = Greeter {
        prefix: "Hello, ".to_owned(),
    };
    let anchor = Anchor::new(&mut greeter);
    let namespace = adopt_module();
    add_global_instance(&anchor, "greeter").unwrap();

    let value = namespace.get("greeter").unwrap().unwrap();
    let greet = value.as_object().unwrap().get("greet").unwrap().unwrap();
    let result = greet
        .as_function()
        .unwrap()
        .call(&[
            ScriptValue::String("world".to_owned()),
            ScriptValue::Bool(true),
        ])
        .unwrap();
    assert!(matches!(result, ScriptValue::String(ref s) if s == "Hello, world!"));

    let err = greet
        .as_function()
        .unwrap()
        .call(&[ScriptValue::String("world".to_owned())])
        .unwrap_err();
    assert!(matches!(err, BindError::MissingArgument { index: 1, .. }));
}
