// SPDX-License-Identifier: Apache-2.0
// © echo-marshal contributors <https://github.com/flyingrobots/echo-marshal>
//! The wire-shaped `Document`/`Node` types.
//!
//! `Node` is deliberately a single recursive enum reused in two roles:
//!
//! - as the *owning* record at a document position (`Document::nodes[i]`,
//!   always the full body of whatever kind occupies ordinal `i`);
//! - as a *field* value nested inside an array/map/set/property slot, where
//!   only the inline-primitive variants and [`Node::Ref`] are legal: each
//!   element is either an inline primitive or a reference to another node.
//!   [`crate::decode`] enforces that restriction; nothing in the type
//!   system does, preferring one recursive wire type over a profusion of
//!   near-duplicate ones.
//!
//! `#[serde(tag = "type")]` gives the canonical in-memory/JSON form string
//! tag discriminators rather than numeric ones.

use serde::{Deserialize, Serialize};

/// Which non-finite IEEE-754 value a `number` node carries, when it is not
/// plain-finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonFiniteKind {
    /// Not-a-number.
    Nan,
    /// Positive infinity.
    PositiveInfinity,
    /// Negative infinity.
    NegativeInfinity,
}

impl NonFiniteKind {
    /// Classify a non-finite `f64`. Returns `None` for finite values.
    pub fn classify(n: f64) -> Option<Self> {
        if n.is_nan() {
            Some(Self::Nan)
        } else if n == f64::INFINITY {
            Some(Self::PositiveInfinity)
        } else if n == f64::NEG_INFINITY {
            Some(Self::NegativeInfinity)
        } else {
            None
        }
    }

    /// Reconstruct the `f64` this classification stands for.
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Nan => f64::NAN,
            Self::PositiveInfinity => f64::INFINITY,
            Self::NegativeInfinity => f64::NEG_INFINITY,
        }
    }
}

/// A document is an ordered sequence of nodes; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Nodes in ordinal order. `nodes[i]` is the value allocated ordinal
    /// `i`; `nodes[0]` is the root.
    pub nodes: Vec<Node>,
}

impl Document {
    /// Number of nodes in the document.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The root node (ordinal 0), if the document is non-empty.
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }
}

/// One tagged node, drawn from the closed set of node kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Node {
    /// `undefined`.
    #[serde(rename = "undefined")]
    Undefined,
    /// `null`.
    #[serde(rename = "null")]
    Null,
    /// `bool(b)`.
    #[serde(rename = "bool")]
    Bool {
        /// The boolean value.
        value: bool,
    },
    /// `number(n)`, with an optional non-finite classification.
    #[serde(rename = "number")]
    Number {
        /// The numeric value; meaningless (set to `0.0`) when `non_finite`
        /// is present.
        value: f64,
        /// Present only for NaN/±Infinity.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        non_finite: Option<NonFiniteKind>,
    },
    /// `string(s)`.
    #[serde(rename = "string")]
    String {
        /// The string value.
        value: String,
    },
    /// `bignumber(decimal_string)`.
    #[serde(rename = "bignumber")]
    BigNumber {
        /// Arbitrary-precision decimal literal text.
        value: String,
    },
    /// `date(epoch_ms)`.
    #[serde(rename = "date")]
    Date {
        /// Milliseconds since the Unix epoch.
        epoch_ms: i64,
    },
    /// `symbol(registry_index)`.
    #[serde(rename = "symbol")]
    Symbol {
        /// Index into the peer registry's `symbols` table.
        index: u32,
    },
    /// `function(registry_index)`.
    #[serde(rename = "function")]
    Function {
        /// Index into the peer registry's `functions` table.
        index: u32,
    },
    /// `array(elements[])`.
    #[serde(rename = "array")]
    Array {
        /// Each element is an inline primitive or a [`Node::Ref`].
        elements: Vec<Node>,
    },
    /// `map(entries[])`.
    #[serde(rename = "map")]
    Map {
        /// Ordered key/value pairs; each side is an inline primitive or a
        /// [`Node::Ref`].
        entries: Vec<(Node, Node)>,
    },
    /// `set(elements[])`.
    #[serde(rename = "set")]
    Set {
        /// Each element is an inline primitive or a [`Node::Ref`].
        elements: Vec<Node>,
    },
    /// `error(message, name?, stack?)`.
    #[serde(rename = "error")]
    Error {
        /// Error message.
        message: String,
        /// Error name, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Captured stack text, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
    /// `object(prototype_ref, properties[])`.
    #[serde(rename = "object")]
    Object {
        /// `"plain"` or a registry class index.
        prototype: PrototypeRefNode,
        /// Ordered `(key, descriptor)` pairs.
        properties: Vec<PropertyEntry>,
    },
    /// `ref(ordinal)` — a back-reference to an already-emitted node.
    #[serde(rename = "ref")]
    Ref {
        /// The target node's ordinal.
        ordinal: u32,
    },
}

/// The `prototype_ref` field of an `object` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PrototypeRefNode {
    /// A plain object.
    #[serde(rename = "plain")]
    Plain,
    /// An instance of the registry class at this index.
    #[serde(rename = "class")]
    Class {
        /// Index into the peer registry's `prototypes` table.
        index: u32,
    },
}

/// One `(key, descriptor)` pair inside an `object` node's `properties`
/// list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyEntry {
    /// The property's key.
    pub key: PropertyKeyNode,
    /// The property's full descriptor.
    pub descriptor: DescriptorNode,
}

/// A property key on the wire: a string or a registry symbol index.
///
/// Symbol keys are resolved purely through the registry index — they are
/// not reference-tracked nodes in their own right (see DESIGN.md for why
/// that is a deliberate simplification rather than spec ambiguity).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum PropertyKeyNode {
    /// A plain string key.
    #[serde(rename = "string")]
    String {
        /// The key text.
        value: String,
    },
    /// A symbol key.
    #[serde(rename = "symbol")]
    Symbol {
        /// Index into the peer registry's `symbols` table.
        index: u32,
    },
}

/// The full attribute set of one property descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DescriptorNode {
    /// Whether the descriptor may later be changed or the property
    /// deleted.
    pub configurable: bool,
    /// Whether the property is enumerable.
    pub enumerable: bool,
    /// The value slot or accessor pair.
    #[serde(flatten)]
    pub slot: SlotNode,
}

/// Either a `value` slot or a `get`/`set` accessor pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "slot")]
pub enum SlotNode {
    /// A data property.
    #[serde(rename = "value")]
    Value {
        /// The property value — an inline primitive or a [`Node::Ref`].
        value: Node,
        /// Whether assignment is permitted.
        writable: bool,
    },
    /// An accessor property. `get`/`set` are [`Node::Ref`]s to `function`
    /// nodes (or absent).
    #[serde(rename = "accessor")]
    Accessor {
        /// Getter reference, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        get: Option<Node>,
        /// Setter reference, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        set: Option<Node>,
    },
}
