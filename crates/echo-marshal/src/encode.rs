// SPDX-License-Identifier: Apache-2.0
// © echo-marshal contributors <https://github.com/flyingrobots/echo-marshal>
//! The encoder: a single depth-first, left-to-right traversal that
//! deduplicates reference-tracked values by identity.

use tracing::{instrument, trace};

use crate::document::{
    DescriptorNode, Document, Node, NonFiniteKind, PropertyEntry, PropertyKeyNode,
    PrototypeRefNode, SlotNode,
};
use crate::error::EncodeError;
use crate::refs::EncodeRefTable;
use crate::registry::Registry;
use crate::value::{PropertyDescriptor, PropertyKey, PropertySlot, PrototypeRef, Value};

/// Traverses a [`Value`] graph once and produces a [`Document`].
///
/// The reference table is `seen` below: binding happens *before* descending
/// into a value's body, so a cycle encountered during that descent resolves
/// to a [`Node::Ref`] instead of recursing forever.
pub struct Encoder<'r> {
    registry: &'r Registry,
    seen: EncodeRefTable,
    nodes: Vec<Node>,
}

impl<'r> Encoder<'r> {
    /// Start a fresh encoder against `registry`. The reference table is
    /// created per call and does not survive it.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            seen: EncodeRefTable::new(),
            nodes: Vec::new(),
        }
    }

    /// Encode `root` into a complete [`Document`].
    #[instrument(skip(self, root))]
    pub fn encode(mut self, root: &Value) -> Result<Document, EncodeError> {
        match root.identity_ptr() {
            None => {
                let node = self.encode_inline(root)?;
                self.nodes.push(node);
            }
            Some(ptr) => {
                self.ensure_tracked(ptr, root)?;
            }
        }
        Ok(Document { nodes: self.nodes })
    }

    /// Encode a nested occurrence (array element, map key/value, set
    /// element, property value, accessor reference): an inline primitive,
    /// or a [`Node::Ref`] to the (possibly freshly emitted) owning node.
    fn encode_field(&mut self, value: &Value) -> Result<Node, EncodeError> {
        match value.identity_ptr() {
            None => self.encode_inline(value),
            Some(ptr) => {
                let ordinal = self.ensure_tracked(ptr, value)?;
                Ok(Node::Ref { ordinal })
            }
        }
    }

    /// Inline primitives and `bignumber` — never reference-tracked.
    fn encode_inline(&self, value: &Value) -> Result<Node, EncodeError> {
        Ok(match value {
            Value::Undefined => Node::Undefined,
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool { value: *b },
            Value::Number(n) => Node::Number {
                value: if n.is_finite() { *n } else { 0.0 },
                non_finite: NonFiniteKind::classify(*n),
            },
            Value::String(s) => Node::String { value: s.clone() },
            Value::BigNumber(s) => Node::BigNumber { value: s.clone() },
            other => {
                return Err(EncodeError::UnknownKind {
                    description: format!("{other:?} is not an inline primitive"),
                })
            }
        })
    }

    /// Ensure `value` (identified by `ptr`) has a node position, building
    /// its body on first encounter and returning its stable ordinal either
    /// way.
    fn ensure_tracked(&mut self, ptr: usize, value: &Value) -> Result<u32, EncodeError> {
        if let Some(ordinal) = self.seen.ordinal_of(ptr) {
            trace!(ordinal, "reusing existing reference");
            return Ok(ordinal);
        }
        let ordinal = u32::try_from(self.nodes.len()).map_err(|_| EncodeError::UnknownKind {
            description: "document exceeds u32 ordinal range".to_string(),
        })?;
        // Reserve the slot and bind the ordinal before descending, so a
        // cycle reached while building the body sees this binding and
        // emits `ref` instead of recursing forever.
        self.nodes.push(Node::Undefined);
        self.seen.bind(ptr, ordinal);
        trace!(ordinal, kind = value_kind(value), "allocating new node");
        let body = self.encode_body(value)?;
        self.nodes[ordinal as usize] = body;
        Ok(ordinal)
    }

    /// Build the full node body for a reference-tracked value, dispatching
    /// by shape: symbols and functions resolve against the registry, dates
    /// and errors are by-value records, arrays/maps/sets recurse into their
    /// elements, and objects encode their prototype plus property list.
    /// Rust's `Value` enum is already nominally typed, so this collapses to
    /// a single match rather than a duck-typed host language's sequence of
    /// shape probes.
    fn encode_body(&mut self, value: &Value) -> Result<Node, EncodeError> {
        match value {
            Value::Symbol(s) => {
                let index = self.registry.symbol_index(s)?;
                Ok(Node::Symbol { index })
            }
            Value::Function(f) => {
                let index = self.registry.function_index(f)?;
                Ok(Node::Function { index })
            }
            Value::Date(d) => Ok(Node::Date { epoch_ms: **d }),
            Value::Error(e) => {
                let data = e.0.borrow();
                Ok(Node::Error {
                    message: data.message.clone(),
                    name: data.name.clone(),
                    stack: data.stack.clone(),
                })
            }
            Value::Array(a) => {
                let elements = a.0.borrow().clone();
                let mut encoded = Vec::with_capacity(elements.len());
                for element in &elements {
                    encoded.push(self.encode_field(element)?);
                }
                Ok(Node::Array { elements: encoded })
            }
            Value::Map(m) => {
                let entries = m.0.borrow().clone();
                let mut encoded = Vec::with_capacity(entries.len());
                for (key, value) in &entries {
                    encoded.push((self.encode_field(key)?, self.encode_field(value)?));
                }
                Ok(Node::Map { entries: encoded })
            }
            Value::Set(s) => {
                let elements = s.0.borrow().clone();
                let mut encoded = Vec::with_capacity(elements.len());
                for element in &elements {
                    encoded.push(self.encode_field(element)?);
                }
                Ok(Node::Set { elements: encoded })
            }
            Value::Object(o) => {
                let data = o.0.borrow();
                self.encode_object(data.prototype, &data.properties)
            }
            Value::Undefined
            | Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::BigNumber(_) => unreachable!("inline kinds never reach encode_body"),
        }
    }

    fn encode_object(
        &mut self,
        prototype: PrototypeRef,
        properties: &[(PropertyKey, PropertyDescriptor)],
    ) -> Result<Node, EncodeError> {
        let prototype = self.registry.prototype_ref_index(prototype)?;
        let prototype_node = match prototype {
            PrototypeRef::Plain => PrototypeRefNode::Plain,
            PrototypeRef::Class(index) => PrototypeRefNode::Class { index },
        };
        let mut encoded = Vec::with_capacity(properties.len());
        for (key, descriptor) in properties {
            let key_node = match key {
                PropertyKey::String(s) => PropertyKeyNode::String { value: s.clone() },
                PropertyKey::Symbol(s) => PropertyKeyNode::Symbol {
                    index: self.registry.symbol_index(s)?,
                },
            };
            let slot_node = match &descriptor.slot {
                PropertySlot::Value { value, writable } => SlotNode::Value {
                    value: self.encode_field(value)?,
                    writable: *writable,
                },
                PropertySlot::Accessor { get, set } => SlotNode::Accessor {
                    get: get
                        .as_ref()
                        .map(|f| self.encode_field(&Value::Function(f.clone())))
                        .transpose()?,
                    set: set
                        .as_ref()
                        .map(|f| self.encode_field(&Value::Function(f.clone())))
                        .transpose()?,
                },
            };
            encoded.push(PropertyEntry {
                key: key_node,
                descriptor: DescriptorNode {
                    configurable: descriptor.configurable,
                    enumerable: descriptor.enumerable,
                    slot: slot_node,
                },
            });
        }
        Ok(Node::Object {
            prototype: prototype_node,
            properties: encoded,
        })
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Undefined => "undefined",
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::BigNumber(_) => "bignumber",
        Value::Date(_) => "date",
        Value::Symbol(_) => "symbol",
        Value::Function(_) => "function",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Set(_) => "set",
        Value::Error(_) => "error",
        Value::Object(_) => "object",
    }
}

/// Encode `root` against `registry` into a [`Document`].
pub fn encode(registry: &Registry, root: &Value) -> Result<Document, EncodeError> {
    Encoder::new(registry).encode(root)
}
