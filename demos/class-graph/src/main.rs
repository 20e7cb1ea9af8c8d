// SPDX-License-Identifier: Apache-2.0

//! Demo: round-tripping a small class-instance graph (scenario S3).
//!
//! Builds `Baz { foos: [foo, foo], bar }` against a three-class registry,
//! marshals it, unmarshals it, and prints the parts that only make sense
//! once you trust reference identity and prototype dispatch survived the
//! trip: the shared `foos` elements and a method call resolved through the
//! registry.

use echo_marshal::{
    ArrayHandle, Marshaller, ObjectHandle, PropertyDescriptor, PropertyKey, Registry, Value,
};

fn main() {
    let registry = Registry::builder()
        .with_prototype("Foo")
        .with_prototype("Bar")
        .with_prototype("Baz")
        .build();
    let marshaller = Marshaller::new(registry);

    let foo = ObjectHandle::of_class(0);
    foo.0.borrow_mut().define_own_property(
        PropertyKey::String("greeting".into()),
        PropertyDescriptor::data(Value::string("hola mundi")),
    );
    let foo = Value::Object(foo);

    let bar = ObjectHandle::of_class(1);
    bar.0.borrow_mut().define_own_property(
        PropertyKey::String("greeting".into()),
        PropertyDescriptor::data(Value::string("No greetings for you")),
    );
    let bar = Value::Object(bar);

    let baz = ObjectHandle::of_class(2);
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

    let doc = marshaller.marshal(&baz).expect("encodable against this registry");
    println!("encoded {} nodes", doc.node_count());

    let back = marshaller.unmarshal(&doc).expect("document decodes cleanly");
    let back_obj = back.as_object().expect("root is an object").0.borrow();
    let foos = back_obj
        .get(&PropertyKey::String("foos".into()), &back)
        .expect("foos is present");
    let foos = foos.as_array().expect("foos is an array").0.borrow();

    println!("foos[0] === foos[1]: {}", foos[0].is_identical(&foos[1]));
    let foo0 = foos[0].as_object().expect("element is an object").0.borrow();
    let greeting = foo0
        .get(&PropertyKey::String("greeting".into()), &foos[0])
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    println!("foos[0].greeting = {greeting}");
}
