// SPDX-License-Identifier: Apache-2.0
// © echo-marshal contributors <https://github.com/flyingrobots/echo-marshal>
//! The decoder: allocate pass, then populate pass, so cycles resolve
//! without placeholders ever leaking to a caller.

use tracing::{instrument, trace};

use crate::document::{Document, Node, PropertyKeyNode, PrototypeRefNode, SlotNode};
use crate::error::DecodeError;
use crate::refs::AllocationTable;
use crate::registry::Registry;
use crate::value::{
    ArrayHandle, ErrorHandle, MapHandle, ObjectHandle, PropertyDescriptor, PropertyKey,
    PropertySlot, SetHandle, Value,
};

/// Decode `document` against `registry` into a [`Value`].
#[instrument(skip(registry, document))]
pub fn decode(registry: &Registry, document: &Document) -> Result<Value, DecodeError> {
    if document.nodes.is_empty() {
        return Err(DecodeError::BadDocument {
            reason: "document has no nodes".to_string(),
        });
    }

    // Allocate pass: one shell per node, in order, following no `ref`
    // edges. Every shell ends up at the index matching its ordinal.
    let mut shells = AllocationTable::with_capacity(document.nodes.len());
    for node in &document.nodes {
        shells.push(allocate_shell(registry, node)?);
    }

    // Populate pass: fill each shell's contents, resolving `ref(ordinal)`
    // fields against the (now fully allocated) shells table. This is what
    // lets a node reference a shell at *any* ordinal, including ones
    // allocated after it.
    for (ordinal, node) in document.nodes.iter().enumerate() {
        trace!(ordinal, "populating node");
        populate(registry, &shells, ordinal, node)?;
    }

    shells.get(0).ok_or_else(|| DecodeError::BadDocument {
        reason: "document has no nodes".to_string(),
    })
}

fn allocate_shell(registry: &Registry, node: &Node) -> Result<Value, DecodeError> {
    Ok(match node {
        Node::Undefined => Value::Undefined,
        Node::Null => Value::Null,
        Node::Bool { value } => Value::Bool(*value),
        Node::Number { value, non_finite } => {
            Value::Number(non_finite.map_or(*value, |kind| kind.to_f64()))
        }
        Node::String { value } => Value::String(value.clone()),
        Node::BigNumber { value } => Value::BigNumber(value.clone()),
        Node::Date { epoch_ms } => Value::date(*epoch_ms),
        Node::Symbol { index } => Value::Symbol(registry.symbol_at(*index)?),
        Node::Function { index } => Value::Function(registry.function_at(*index)?),
        Node::Array { elements } => {
            Value::Array(ArrayHandle::new(vec![Value::Undefined; elements.len()]))
        }
        Node::Map { .. } => Value::Map(MapHandle::new(Vec::new())),
        Node::Set { .. } => Value::Set(SetHandle::new(Vec::new())),
        Node::Error { message, .. } => Value::Error(ErrorHandle::new(message.clone())),
        Node::Object { prototype, .. } => match prototype {
            PrototypeRefNode::Plain => Value::Object(ObjectHandle::plain()),
            PrototypeRefNode::Class { index } => {
                // Bypass the class constructor entirely: the document
                // already carries post-construction state.
                registry.prototype_at(*index)?;
                Value::Object(ObjectHandle::of_class(*index))
            }
        },
        Node::Ref { ordinal } => {
            return Err(DecodeError::BadDocument {
                reason: format!("ordinal {ordinal}: `ref` cannot be a top-level node"),
            })
        }
    })
}

/// Resolve a field occurrence (array element, map key/value, set element,
/// property value, accessor reference): an inline primitive decodes
/// directly; a `ref` looks up the allocate-pass shell; anything else is
/// malformed, since a field is never a nested full node body.
fn resolve_field(shells: &AllocationTable, field: &Node) -> Result<Value, DecodeError> {
    Ok(match field {
        Node::Undefined => Value::Undefined,
        Node::Null => Value::Null,
        Node::Bool { value } => Value::Bool(*value),
        Node::Number { value, non_finite } => {
            Value::Number(non_finite.map_or(*value, |kind| kind.to_f64()))
        }
        Node::String { value } => Value::String(value.clone()),
        Node::BigNumber { value } => Value::BigNumber(value.clone()),
        Node::Ref { ordinal } => {
            shells
                .get(*ordinal)
                .ok_or_else(|| DecodeError::BadDocument {
                    reason: format!("dangling ref to ordinal {ordinal}"),
                })?
        }
        other => {
            return Err(DecodeError::BadDocument {
                reason: format!("{other:?} cannot appear inline as a field; expected a ref"),
            })
        }
    })
}

fn populate(
    registry: &Registry,
    shells: &AllocationTable,
    ordinal: usize,
    node: &Node,
) -> Result<(), DecodeError> {
    let shell = shells
        .get(u32::try_from(ordinal).map_err(|_| DecodeError::BadDocument {
            reason: format!("ordinal {ordinal} exceeds u32 range"),
        })?)
        .ok_or_else(|| DecodeError::BadDocument {
            reason: format!("ordinal {ordinal} was never allocated"),
        })?;
    match node {
        Node::Undefined
        | Node::Null
        | Node::Bool { .. }
        | Node::Number { .. }
        | Node::String { .. }
        | Node::BigNumber { .. }
        | Node::Date { .. }
        | Node::Symbol { .. }
        | Node::Function { .. } => {} // fully built in the allocate pass
        Node::Array { elements } => {
            let Value::Array(handle) = shell else {
                unreachable!("ordinal {ordinal} was allocated as an array shell")
            };
            let mut slots = handle.0.borrow_mut();
            for (slot, field) in slots.iter_mut().zip(elements) {
                *slot = resolve_field(shells, field)?;
            }
        }
        Node::Map { entries } => {
            let Value::Map(handle) = shell else {
                unreachable!("ordinal {ordinal} was allocated as a map shell")
            };
            let mut resolved = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                resolved.push((resolve_field(shells, key)?, resolve_field(shells, value)?));
            }
            *handle.0.borrow_mut() = resolved;
        }
        Node::Set { elements } => {
            let Value::Set(handle) = shell else {
                unreachable!("ordinal {ordinal} was allocated as a set shell")
            };
            let mut resolved = Vec::with_capacity(elements.len());
            for element in elements {
                resolved.push(resolve_field(shells, element)?);
            }
            *handle.0.borrow_mut() = resolved;
        }
        Node::Error { name, stack, .. } => {
            let Value::Error(handle) = shell else {
                unreachable!("ordinal {ordinal} was allocated as an error shell")
            };
            let mut data = handle.0.borrow_mut();
            data.name = name.clone();
            data.stack = stack.clone();
        }
        Node::Object { properties, .. } => {
            let Value::Object(handle) = shell else {
                unreachable!("ordinal {ordinal} was allocated as an object shell")
            };
            for entry in properties {
                let key = match &entry.key {
                    PropertyKeyNode::String { value } => PropertyKey::String(value.clone()),
                    PropertyKeyNode::Symbol { index } => {
                        PropertyKey::Symbol(registry.symbol_at(*index)?)
                    }
                };
                let slot = match &entry.descriptor.slot {
                    SlotNode::Value { value, writable } => PropertySlot::Value {
                        value: resolve_field(shells, value)?,
                        writable: *writable,
                    },
                    SlotNode::Accessor { get, set } => PropertySlot::Accessor {
                        get: get
                            .as_ref()
                            .map(|field| resolve_function_field(shells, field))
                            .transpose()?,
                        set: set
                            .as_ref()
                            .map(|field| resolve_function_field(shells, field))
                            .transpose()?,
                    },
                };
                handle.0.borrow_mut().define_own_property(
                    key,
                    PropertyDescriptor {
                        configurable: entry.descriptor.configurable,
                        enumerable: entry.descriptor.enumerable,
                        slot,
                    },
                );
            }
        }
        Node::Ref { ordinal: target } => {
            return Err(DecodeError::BadDocument {
                reason: format!("ordinal {ordinal}: `ref({target})` cannot be a top-level node"),
            })
        }
    }
    Ok(())
}

fn resolve_function_field(
    shells: &AllocationTable,
    field: &Node,
) -> Result<crate::value::FunctionHandle, DecodeError> {
    match resolve_field(shells, field)? {
        Value::Function(f) => Ok(f),
        other => Err(DecodeError::BadDocument {
            reason: format!("accessor slot must reference a function, got {other:?}"),
        }),
    }
}
