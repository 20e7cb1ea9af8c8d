// SPDX-License-Identifier: Apache-2.0
// © echo-marshal contributors <https://github.com/flyingrobots/echo-marshal>
//! The in-process dynamic object model the marshaller traverses.
//!
//! Rust has no prototype chain and no duck-typed shapes, so this module
//! invents a concrete, nominally-typed stand-in for a rich, dynamic object
//! model: primitives, cyclic graphs, class instances, built-in containers,
//! functions, symbols, and property descriptors with accessors. Every
//! reference-tracked kind is a cheap `Rc` handle so that two [`Value`]s can
//! share identity the way two bindings to the same JS object would.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A symbol: a unique, identity-compared token with an optional description.
///
/// Two `SymbolData` instances are never equal by value — only by identity
/// (`Rc::ptr_eq` on the handle). This mirrors the registry's symbol lookup,
/// which matches by identity only.
#[derive(Debug)]
pub struct SymbolData {
    /// Human-readable description, for debugging/logging only.
    pub description: Option<String>,
}

/// Shared handle to a [`SymbolData`].
pub type SymbolHandle = Rc<SymbolData>;

/// Create a fresh symbol handle.
pub fn make_symbol(description: impl Into<Option<String>>) -> SymbolHandle {
    Rc::new(SymbolData {
        description: description.into(),
    })
}

/// A callable value: a name (optional), a source-text representation, and
/// the Rust closure backing it.
///
/// `source` is what the registry's function-equivalence rule compares when
/// two functions are not identity-equal: two functions whose stringified
/// source is identical are considered equivalent.
pub struct FunctionData {
    /// Optional function name (for debugging/logging).
    pub name: Option<String>,
    /// Source-text representation used for cross-process equivalence.
    pub source: String,
    /// The callable itself. Invoked with positional arguments; for
    /// accessors, argument 0 is `this` (get) or `(this, new_value)` (set).
    pub call: Rc<dyn Fn(&[Value]) -> Value>,
}

impl fmt::Debug for FunctionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionData")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Shared handle to a [`FunctionData`].
pub type FunctionHandle = Rc<FunctionData>;

/// Create a fresh function handle from a name, source text, and closure.
pub fn make_function(
    name: impl Into<Option<String>>,
    source: impl Into<String>,
    call: impl Fn(&[Value]) -> Value + 'static,
) -> FunctionHandle {
    Rc::new(FunctionData {
        name: name.into(),
        source: source.into(),
        call: Rc::new(call),
    })
}

/// Shared, mutable handle to a boxed epoch-millisecond date.
///
/// Dates are fully constructed on allocation and immutable-enough that no
/// later populate step is needed, but are still reference-tracked, so they
/// need identity — hence `Rc` rather than a bare `i64`.
pub type DateHandle = Rc<i64>;

/// Body of an `error`-shaped value.
#[derive(Debug, Clone)]
pub struct ErrorData {
    /// Error message.
    pub message: String,
    /// Error "name" (e.g. `TypeError`), if any.
    pub name: Option<String>,
    /// Captured stack trace text, if any.
    pub stack: Option<String>,
}

/// Shared handle to mutable error data.
#[derive(Debug, Clone)]
pub struct ErrorHandle(pub Rc<RefCell<ErrorData>>);

impl ErrorHandle {
    /// Allocate a new error handle.
    pub fn new(message: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(ErrorData {
            message: message.into(),
            name: None,
            stack: None,
        })))
    }
}

/// Shared handle to a mutable, ordered array of values.
#[derive(Debug, Clone)]
pub struct ArrayHandle(pub Rc<RefCell<Vec<Value>>>);

impl ArrayHandle {
    /// Allocate a new array handle from its initial elements.
    pub fn new(elements: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(elements)))
    }
}

/// Shared handle to a mutable, insertion-ordered key/value container.
#[derive(Debug, Clone)]
pub struct MapHandle(pub Rc<RefCell<Vec<(Value, Value)>>>);

impl MapHandle {
    /// Allocate a new map handle from its initial entries.
    pub fn new(entries: Vec<(Value, Value)>) -> Self {
        Self(Rc::new(RefCell::new(entries)))
    }
}

/// Shared handle to a mutable, insertion-ordered set of values.
#[derive(Debug, Clone)]
pub struct SetHandle(pub Rc<RefCell<Vec<Value>>>);

impl SetHandle {
    /// Allocate a new set handle from its initial elements.
    pub fn new(elements: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(elements)))
    }
}

/// A property key: either a string or a registered symbol.
#[derive(Debug, Clone)]
pub enum PropertyKey {
    /// A plain string key.
    String(String),
    /// A symbol key (must be present in the registry to be encodable).
    Symbol(SymbolHandle),
}

/// The payload half of a property descriptor: either a plain value slot or
/// a `get`/`set` accessor pair.
#[derive(Debug, Clone)]
pub enum PropertySlot {
    /// A data property.
    Value {
        /// The property's current value.
        value: Value,
        /// Whether assignment to this property is permitted.
        writable: bool,
    },
    /// An accessor property.
    Accessor {
        /// Getter, if any.
        get: Option<FunctionHandle>,
        /// Setter, if any.
        set: Option<FunctionHandle>,
    },
}

/// A full property descriptor: attribute flags plus a [`PropertySlot`].
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    /// Whether the descriptor itself may later be changed or the property
    /// deleted.
    pub configurable: bool,
    /// Whether the property shows up in "own keys" enumeration performed by
    /// ordinary consumers (the marshaller itself always enumerates *all*
    /// own keys, enumerable or not).
    pub enumerable: bool,
    /// The value or accessor pair.
    pub slot: PropertySlot,
}

impl PropertyDescriptor {
    /// Convenience constructor for a plain, fully-permissive data property.
    pub fn data(value: Value) -> Self {
        Self {
            configurable: true,
            enumerable: true,
            slot: PropertySlot::Value {
                value,
                writable: true,
            },
        }
    }
}

/// Which prototype (if any) an [`ObjectData`] instance was constructed
/// against.
///
/// Rust has no runtime prototype chain to walk, so `echo-marshal` has class
/// membership declared at construction time rather than discovered by
/// scanning a prototype list for an identity match — see DESIGN.md for the
/// rationale. The registry still supplies the positional index↔name table
/// both peers must agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrototypeRef {
    /// A plain object (`prototype_ref = "plain"` on the wire).
    Plain,
    /// An instance of the registry's class at this index.
    Class(u32),
}

/// Body of a record/class-instance value.
#[derive(Debug, Clone)]
pub struct ObjectData {
    /// Which prototype this instance was built against.
    pub prototype: PrototypeRef,
    /// Own properties, in insertion order, as observed on the input
    /// object.
    pub properties: Vec<(PropertyKey, PropertyDescriptor)>,
}

impl ObjectData {
    /// An empty plain object.
    pub fn plain() -> Self {
        Self {
            prototype: PrototypeRef::Plain,
            properties: Vec::new(),
        }
    }

    /// An empty instance of the registry class at `index`.
    pub fn of_class(index: u32) -> Self {
        Self {
            prototype: PrototypeRef::Class(index),
            properties: Vec::new(),
        }
    }

    /// Define (or redefine) an own property via low-level semantics: an
    /// existing entry with the same key is replaced in place (so its
    /// position in iteration order is preserved); a new key is appended.
    pub fn define_own_property(&mut self, key: PropertyKey, descriptor: PropertyDescriptor) {
        if let Some(slot) = self
            .properties
            .iter_mut()
            .find(|(existing, _)| property_keys_match(existing, &key))
        {
            slot.1 = descriptor;
        } else {
            self.properties.push((key, descriptor));
        }
    }

    /// All own property keys, string and symbol, in insertion order.
    pub fn own_property_keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.properties.iter().map(|(key, _)| key)
    }

    fn find(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|(existing, _)| property_keys_match(existing, key))
            .map(|(_, descriptor)| descriptor)
    }

    /// The full descriptor for `key`, attribute flags included. Unlike
    /// [`Self::get`], this never fires an accessor.
    pub fn descriptor(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.find(key)
    }

    /// Read a property, firing the getter (with `this` = the owning
    /// object) if it is an accessor.
    pub fn get(&self, key: &PropertyKey, this: &Value) -> Option<Value> {
        match &self.find(key)?.slot {
            PropertySlot::Value { value, .. } => Some(value.clone()),
            PropertySlot::Accessor { get: Some(f), .. } => Some((f.call)(&[this.clone()])),
            PropertySlot::Accessor { get: None, .. } => Some(Value::Undefined),
        }
    }

    /// Assign to a property, firing the setter (with `this` and the new
    /// value) if it is an accessor, or erroring if the data property is
    /// non-writable (scenario S5).
    pub fn set(
        &mut self,
        key: &PropertyKey,
        value: Value,
        this: &Value,
    ) -> Result<(), NotWritableError> {
        let this = this.clone();
        let found = self
            .properties
            .iter_mut()
            .find(|(existing, _)| property_keys_match(existing, key));
        match found {
            Some((existing_key, descriptor)) => match &mut descriptor.slot {
                PropertySlot::Value { value: slot, writable } => {
                    if !*writable {
                        return Err(NotWritableError {
                            key: key_description(existing_key),
                        });
                    }
                    *slot = value;
                    Ok(())
                }
                PropertySlot::Accessor { set: Some(f), .. } => {
                    (f.call)(&[this, value]);
                    Ok(())
                }
                PropertySlot::Accessor { set: None, .. } => Err(NotWritableError {
                    key: key_description(existing_key),
                }),
            },
            None => {
                self.properties.push((
                    key.clone(),
                    PropertyDescriptor::data(value),
                ));
                Ok(())
            }
        }
    }
}

fn property_keys_match(a: &PropertyKey, b: &PropertyKey) -> bool {
    match (a, b) {
        (PropertyKey::String(a), PropertyKey::String(b)) => a == b,
        (PropertyKey::Symbol(a), PropertyKey::Symbol(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

fn key_description(key: &PropertyKey) -> String {
    match key {
        PropertyKey::String(s) => s.clone(),
        PropertyKey::Symbol(s) => format!(
            "Symbol({})",
            s.description.as_deref().unwrap_or("")
        ),
    }
}

/// Raised when assigning to a non-writable data property or a setter-less
/// accessor.
#[derive(Debug, thiserror::Error)]
#[error("cannot assign to non-writable property \"{key}\"")]
pub struct NotWritableError {
    /// The offending property's key, rendered for diagnostics.
    pub key: String,
}

/// Shared handle to mutable object data.
#[derive(Debug, Clone)]
pub struct ObjectHandle(pub Rc<RefCell<ObjectData>>);

impl ObjectHandle {
    /// Allocate a new, empty plain object.
    pub fn plain() -> Self {
        Self(Rc::new(RefCell::new(ObjectData::plain())))
    }

    /// Allocate a new, empty instance of the registry class at `index`.
    pub fn of_class(index: u32) -> Self {
        Self(Rc::new(RefCell::new(ObjectData::of_class(index))))
    }
}

/// A value drawn from the dynamic object model the marshaller encodes and
/// decodes. See the module docs for why this is a concrete Rust enum
/// rather than a duck-typed shape.
#[derive(Debug, Clone)]
pub enum Value {
    /// JS-style "no value" sentinel, distinct from [`Value::Null`].
    Undefined,
    /// The null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A double-precision number, possibly non-finite.
    Number(f64),
    /// A UTF-8 string.
    String(String),
    /// An arbitrary-precision decimal literal, not reference-tracked.
    BigNumber(String),
    /// An epoch-millisecond date.
    Date(DateHandle),
    /// A registry-backed symbol.
    Symbol(SymbolHandle),
    /// A registry-backed function.
    Function(FunctionHandle),
    /// An ordered array.
    Array(ArrayHandle),
    /// An insertion-ordered map.
    Map(MapHandle),
    /// An insertion-ordered set.
    Set(SetHandle),
    /// An error-shaped value.
    Error(ErrorHandle),
    /// A plain record or class instance.
    Object(ObjectHandle),
}

impl Value {
    /// Construct a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Construct a date value from an epoch-millisecond timestamp.
    pub fn date(epoch_ms: i64) -> Self {
        Value::Date(Rc::new(epoch_ms))
    }

    /// The pointer identity used to key the reference table, for the kinds
    /// that are reference-tracked. Returns `None` for inline primitives
    /// and `bignumber`, which are never reference-tracked.
    pub(crate) fn identity_ptr(&self) -> Option<usize> {
        match self {
            Value::Undefined
            | Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::BigNumber(_) => None,
            Value::Date(d) => Some(Rc::as_ptr(d) as usize),
            Value::Symbol(s) => Some(Rc::as_ptr(s) as usize),
            Value::Function(f) => Some(Rc::as_ptr(f) as usize),
            Value::Array(a) => Some(Rc::as_ptr(&a.0) as usize),
            Value::Map(m) => Some(Rc::as_ptr(&m.0) as usize),
            Value::Set(s) => Some(Rc::as_ptr(&s.0) as usize),
            Value::Error(e) => Some(Rc::as_ptr(&e.0) as usize),
            Value::Object(o) => Some(Rc::as_ptr(&o.0) as usize),
        }
    }

    /// `true` if `self` and `other` are the same in-process value — by
    /// pointer identity for reference-tracked kinds, by value otherwise.
    /// Used by tests to check scenarios like S2/S3's shared-reference
    /// expectations.
    #[must_use]
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self.identity_ptr(), other.identity_ptr()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.shallow_eq(other),
            _ => false,
        }
    }

    fn shallow_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::BigNumber(a), Value::BigNumber(b)) => a == b,
            _ => false,
        }
    }

    /// The epoch-millisecond value of a [`Value::Date`], if this is one.
    pub fn epoch_ms(&self) -> Option<i64> {
        match self {
            Value::Date(d) => Some(**d),
            _ => None,
        }
    }

    /// The string slice of a [`Value::String`], if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The `f64` of a [`Value::Number`], if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The object handle, if this is a [`Value::Object`].
    pub fn as_object(&self) -> Option<&ObjectHandle> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The array handle, if this is a [`Value::Array`].
    pub fn as_array(&self) -> Option<&ArrayHandle> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }
}


#[cfg(test)]
impl PropertyDescriptor {
    fn slot_value(&self) -> Option<&Value> {
        match &self.slot {
            PropertySlot::Value { value, .. } => Some(value),
            PropertySlot::Accessor { .. } => None,
        }
    }
}
