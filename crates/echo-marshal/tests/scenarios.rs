// SPDX-License-Identifier: Apache-2.0
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! End-to-end round-trip scenarios, one test per named scenario.

use std::rc::Rc;

use echo_marshal::{
    make_function, ArrayHandle, ErrorHandle, MapHandle, Marshaller, ObjectHandle,
    PropertyDescriptor, PropertyKey, PropertySlot, Registry, SetHandle, Value,
};

// S1 — Primitives: encode then decode [undefined, null, true, false, 1,
// "hello", new Date(100)]; element-wise equal, date equal by value.
#[test]
fn s1_primitives() {
    let marshaller = Marshaller::new(Registry::empty());
    let array = ArrayHandle::new(vec![
        Value::Undefined,
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::Number(1.0),
        Value::string("hello"),
        Value::date(100),
    ]);
    let root = Value::Array(array);

    let doc = marshaller.marshal(&root).unwrap();
    let back = marshaller.unmarshal(&doc).unwrap();

    let elements = back.as_array().unwrap().0.borrow();
    assert!(matches!(elements[0], Value::Undefined));
    assert!(matches!(elements[1], Value::Null));
    assert!(matches!(elements[2], Value::Bool(true)));
    assert!(matches!(elements[3], Value::Bool(false)));
    assert_eq!(elements[4].as_f64(), Some(1.0));
    assert_eq!(elements[5].as_str(), Some("hello"));
    assert_eq!(elements[6].epoch_ms(), Some(100));
}

// S2 — Shared inner: [inner, inner, inner, inner]; decoded elements are all
// identity-equal.
#[test]
fn s2_shared_inner() {
    let marshaller = Marshaller::new(Registry::empty());
    let inner = ObjectHandle::plain();
    inner
        .0
        .borrow_mut()
        .define_own_property(PropertyKey::String("hello".into()), PropertyDescriptor::data(Value::string("world")));
    let inner = Value::Object(inner);
    let root = Value::Array(ArrayHandle::new(vec![
        inner.clone(),
        inner.clone(),
        inner.clone(),
        inner,
    ]));

    let doc = marshaller.marshal(&root).unwrap();
    let back = marshaller.unmarshal(&doc).unwrap();
    let elements = back.as_array().unwrap().0.borrow();
    assert!(elements[0].is_identical(&elements[1]));
    assert!(elements[1].is_identical(&elements[2]));
    assert!(elements[2].is_identical(&elements[3]));
}

// S3 — Class graph: Baz { foos: [foo, foo], bar }; decoded foos share
// identity and methods resolve via the registered prototype.
#[test]
fn s3_class_graph() {
    let foo_class = 0u32;
    let bar_class = 1u32;
    let baz_class = 2u32;

    let registry = Registry::builder()
        .with_prototype("Foo")
        .with_prototype("Bar")
        .with_prototype("Baz")
        .build();
    let marshaller = Marshaller::new(registry);

    let foo = ObjectHandle::of_class(foo_class);
    foo.0.borrow_mut().define_own_property(
        PropertyKey::String("greeting".into()),
        PropertyDescriptor::data(Value::string("hola mundi")),
    );
    let foo = Value::Object(foo);

    let bar = ObjectHandle::of_class(bar_class);
    bar.0.borrow_mut().define_own_property(
        PropertyKey::String("greeting".into()),
        PropertyDescriptor::data(Value::string("No greetings for you")),
    );
    let bar = Value::Object(bar);

    let baz = ObjectHandle::of_class(baz_class);
    baz.0.borrow_mut().define_own_property(
        PropertyKey::String("foos".into()),
        PropertyDescriptor::data(Value::Array(ArrayHandle::new(vec![
            foo.clone(),
            foo.clone(),
        ]))),
    );
    baz.0.borrow_mut().define_own_property(
        PropertyKey::String("bar".into()),
        PropertyDescriptor::data(bar),
    );
    let baz = Value::Object(baz);

    let doc = marshaller.marshal(&baz).unwrap();
    let back = marshaller.unmarshal(&doc).unwrap();

    let back_obj = back.as_object().unwrap().0.borrow();
    let foos = back_obj
        .get(&PropertyKey::String("foos".into()), &back)
        .unwrap();
    let foos = foos.as_array().unwrap().0.borrow();
    let foo0 = foos[0].as_object().unwrap().0.borrow();
    assert_eq!(
        foo0.get(&PropertyKey::String("greeting".into()), &foos[0])
            .unwrap()
            .as_str(),
        Some("hola mundi")
    );
    assert!(foos[0].is_identical(&foos[1]));

    let bar = back_obj
        .get(&PropertyKey::String("bar".into()), &back)
        .unwrap();
    let bar_obj = bar.as_object().unwrap().0.borrow();
    assert_eq!(
        bar_obj
            .get(&PropertyKey::String("greeting".into()), &bar)
            .unwrap()
            .as_str(),
        Some("No greetings for you")
    );
}

// S4 — Accessor: a getter `hi` returning "hi " + this.hello; decoded getter
// computes against the decoded `hello`.
#[test]
fn s4_accessor() {
    let getter = make_function(Some("hi".to_string()), "(this) => \"hi \" + this.hello", {
        |args: &[Value]| {
            let this = args[0].as_object().expect("this is an object").0.borrow();
            let hello = this
                .get(&PropertyKey::String("hello".into()), &args[0])
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            Value::string(format!("hi {hello}"))
        }
    });

    let registry = Registry::builder().with_function(getter.clone()).build();
    let marshaller = Marshaller::new(registry);

    let object = ObjectHandle::plain();
    object.0.borrow_mut().define_own_property(
        PropertyKey::String("hello".into()),
        PropertyDescriptor::data(Value::string("world")),
    );
    object.0.borrow_mut().define_own_property(
        PropertyKey::String("hi".into()),
        PropertyDescriptor {
            configurable: true,
            enumerable: true,
            slot: PropertySlot::Accessor {
                get: Some(getter),
                set: None,
            },
        },
    );
    let root = Value::Object(object);

    let doc = marshaller.marshal(&root).unwrap();
    let back = marshaller.unmarshal(&doc).unwrap();
    let back_obj = back.as_object().unwrap().0.borrow();
    let hi = back_obj
        .get(&PropertyKey::String("hi".into()), &back)
        .unwrap();
    assert_eq!(hi.as_str(), Some("hi world"));
}

// S5 — Non-writable property: decoded property is present and equal by
// value; assignment throws.
#[test]
fn s5_non_writable() {
    let marshaller = Marshaller::new(Registry::empty());
    let object = ObjectHandle::plain();
    object.0.borrow_mut().define_own_property(
        PropertyKey::String("pinned".into()),
        PropertyDescriptor {
            configurable: true,
            enumerable: true,
            slot: PropertySlot::Value {
                value: Value::Number(42.0),
                writable: false,
            },
        },
    );
    let root = Value::Object(object);

    let doc = marshaller.marshal(&root).unwrap();
    let back = marshaller.unmarshal(&doc).unwrap();

    let key = PropertyKey::String("pinned".into());
    let value = back.as_object().unwrap().0.borrow().get(&key, &back).unwrap();
    assert_eq!(value.as_f64(), Some(42.0));

    let err = back
        .as_object()
        .unwrap()
        .0
        .borrow_mut()
        .set(&key, Value::Number(7.0), &back);
    assert!(err.is_err());
}

// S6 — Default-factory container: the container's hidden factory field
// holds a function independently constructed from (but source-equal to) the
// one in the registry; encode must resolve it by source text rather than
// identity, and the decoded container's factory yields 12 for a 12-byte key.
#[test]
fn s6_source_text_equivalence() {
    const SOURCE: &str = "k => k.length";

    let registered = make_function(Some("g".to_string()), SOURCE, |args: &[Value]| {
        Value::Number(args[0].as_str().map_or(0.0, str::len) as f64)
    });
    let independently_defined = make_function(Some("f".to_string()), SOURCE, |args: &[Value]| {
        Value::Number(args[0].as_str().map_or(0.0, str::len) as f64)
    });
    assert!(!Rc::ptr_eq(&registered, &independently_defined));

    let registry = Registry::builder().with_function(registered).build();
    let marshaller = Marshaller::new(registry);

    let container = ObjectHandle::plain();
    container.0.borrow_mut().define_own_property(
        PropertyKey::String("factory".into()),
        PropertyDescriptor::data(Value::Function(independently_defined)),
    );
    let root = Value::Object(container);

    let doc = marshaller.marshal(&root).unwrap();
    let back = marshaller.unmarshal(&doc).unwrap();
    let back_obj = back.as_object().unwrap().0.borrow();
    let factory = back_obj
        .get(&PropertyKey::String("factory".into()), &back)
        .unwrap();
    let Value::Function(f) = factory else {
        panic!("expected function");
    };
    let result = (f.call)(&[Value::string("same factory")]);
    assert_eq!(result.as_f64(), Some(12.0));
}

// S7 — Built-ins: a Map and a Set round-trip value-equal with preserved
// order.
#[test]
fn s7_builtins() {
    let marshaller = Marshaller::new(Registry::empty());
    let map = MapHandle::new(vec![
        (Value::Number(1.0), Value::Number(2.0)),
        (Value::Number(3.0), Value::string("world")),
        (Value::date(0), Value::string("haha")),
    ]);
    let set = SetHandle::new(vec![
        Value::Number(1.0),
        Value::Number(2.0),
        Value::Number(3.0),
    ]);
    let root = Value::Array(ArrayHandle::new(vec![Value::Map(map), Value::Set(set)]));

    let doc = marshaller.marshal(&root).unwrap();
    let back = marshaller.unmarshal(&doc).unwrap();
    let elements = back.as_array().unwrap().0.borrow();

    let Value::Map(map) = &elements[0] else {
        panic!("expected map");
    };
    let entries = map.0.borrow();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].0.as_f64(), Some(1.0));
    assert_eq!(entries[0].1.as_f64(), Some(2.0));
    assert_eq!(entries[1].1.as_str(), Some("world"));
    assert_eq!(entries[2].0.epoch_ms(), Some(0));

    let Value::Set(set) = &elements[1] else {
        panic!("expected set");
    };
    let values: Vec<_> = set.0.borrow().iter().map(Value::as_f64).collect();
    assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0)]);
}

// Error-shaped values round-trip their message/name/stack and keep identity
// across multiple occurrences.
#[test]
fn error_round_trip() {
    let marshaller = Marshaller::new(Registry::empty());
    let error = ErrorHandle::new("boom");
    error.0.borrow_mut().name = Some("TypeError".to_string());
    error.0.borrow_mut().stack = Some("at foo (bar.js:1:1)".to_string());
    let error = Value::Error(error);
    let root = Value::Array(ArrayHandle::new(vec![error.clone(), error]));

    let doc = marshaller.marshal(&root).unwrap();
    let back = marshaller.unmarshal(&doc).unwrap();
    let elements = back.as_array().unwrap().0.borrow();
    assert!(elements[0].is_identical(&elements[1]));

    let Value::Error(handle) = &elements[0] else {
        panic!("expected error");
    };
    let data = handle.0.borrow();
    assert_eq!(data.message, "boom");
    assert_eq!(data.name.as_deref(), Some("TypeError"));
    assert_eq!(data.stack.as_deref(), Some("at foo (bar.js:1:1)"));
}

// Symbols used as property keys round-trip via the registry, not as
// independently-tracked reference nodes.
#[test]
fn symbol_keyed_property_round_trips() {
    let symbol = echo_marshal::make_symbol(Some("tag".to_string()));
    let registry = Registry::builder().with_symbol(symbol.clone()).build();
    let marshaller = Marshaller::new(registry);

    let object = ObjectHandle::plain();
    object.0.borrow_mut().define_own_property(
        PropertyKey::Symbol(symbol),
        PropertyDescriptor::data(Value::Number(9.0)),
    );
    let root = Value::Object(object);

    let doc = marshaller.marshal(&root).unwrap();
    let back = marshaller.unmarshal(&doc).unwrap();
    let back_obj = back.as_object().unwrap().0.borrow();
    let keys: Vec<_> = back_obj.own_property_keys().collect();
    assert_eq!(keys.len(), 1);
    assert!(matches!(keys[0], PropertyKey::Symbol(_)));
}

// A self-referential object round-trips without infinite recursion (the
// reference-table binding-before-descent rule).
#[test]
fn cyclic_object_round_trips() {
    let marshaller = Marshaller::new(Registry::empty());
    let object = ObjectHandle::plain();
    let root = Value::Object(object.clone());
    object
        .0
        .borrow_mut()
        .define_own_property(PropertyKey::String("self".into()), PropertyDescriptor::data(root.clone()));

    let doc = marshaller.marshal(&root).unwrap();
    let back = marshaller.unmarshal(&doc).unwrap();
    let back_obj = back.as_object().unwrap().0.borrow();
    let looped = back_obj
        .get(&PropertyKey::String("self".into()), &back)
        .unwrap();
    assert!(looped.is_identical(&back));
}

