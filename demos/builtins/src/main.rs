// SPDX-License-Identifier: Apache-2.0

//! Demo: round-tripping `Map`/`Set` built-ins with preserved order
//! (scenario S7).

use echo_marshal::{ArrayHandle, MapHandle, Marshaller, Registry, SetHandle, Value};

fn main() {
    let marshaller = Marshaller::new(Registry::empty());

    let map = MapHandle::new(vec![
        (Value::Number(1.0), Value::Number(2.0)),
        (Value::Number(3.0), Value::string("world")),
        (Value::date(0), Value::string("haha")),
    ]);
    let set = SetHandle::new(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
    let root = Value::Array(ArrayHandle::new(vec![Value::Map(map), Value::Set(set)]));

    let doc = marshaller.marshal(&root).expect("built-ins with no registry are encodable");
    let back = marshaller.unmarshal(&doc).expect("document decodes cleanly");
    let elements = back.as_array().expect("root is an array").0.borrow();

    let Value::Map(map) = &elements[0] else {
        unreachable!("first element is a map");
    };
    for (key, value) in map.0.borrow().iter() {
        println!("map entry: {key:?} -> {value:?}");
    }

    let Value::Set(set) = &elements[1] else {
        unreachable!("second element is a set");
    };
    let values: Vec<_> = set.0.borrow().iter().map(Value::as_f64).collect();
    println!("set order preserved: {values:?}");
}
