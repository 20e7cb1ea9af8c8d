// SPDX-License-Identifier: Apache-2.0
// © echo-marshal contributors <https://github.com/flyingrobots/echo-marshal>
//! Graph-preserving object marshaller.
//!
//! `echo-marshal` turns an in-process, dynamically-typed object graph
//! (primitives, cyclic references, class instances, built-in containers,
//! functions, symbols, accessor properties) into a flat, ordered
//! [`Document`] and back, preserving both cycles and shared-reference
//! identity. Transport and storage are out of scope: a [`Document`] is
//! just data — serialize it with `serde` however the caller likes (JSON,
//! CBOR, whatever already sits in the dependency tree).
//!
//! The two halves of the protocol:
//!
//! - [`Marshaller::marshal`] walks a [`Value`] graph once, depth-first,
//!   binding each reference-tracked value to a stable ordinal the first
//!   time it is seen and emitting a [`document::Node::Ref`] on every
//!   subsequent occurrence (including cycles back to an ancestor).
//! - [`Marshaller::unmarshal`] rebuilds the graph in two passes — allocate
//!   empty shells in ordinal order, then populate each shell's contents —
//!   so that a forward reference to a not-yet-populated shell still
//!   resolves correctly.
//!
//! Both sides share a [`Registry`]: a peer-agreed, positional table of
//! prototypes, functions, and symbols that cannot themselves be
//! reconstructed from the document alone.
//!
//! ```
//! use echo_marshal::{Marshaller, Registry, Value};
//!
//! let marshaller = Marshaller::new(Registry::empty());
//! let doc = marshaller.marshal(&Value::string("hello")).unwrap();
//! let back = marshaller.unmarshal(&doc).unwrap();
//! assert!(back.is_identical(&Value::string("hello")));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::cognitive_complexity,
    clippy::option_if_let_else,
    clippy::significant_drop_tightening,
    clippy::doc_markdown,
    clippy::too_many_lines,
    clippy::struct_excessive_bools,
    clippy::too_long_first_doc_paragraph,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::trivially_copy_pass_by_ref,
    clippy::needless_collect,
    clippy::manual_let_else,
    clippy::needless_pass_by_value,
    clippy::multiple_crate_versions
)]

mod decode;
mod document;
mod encode;
mod error;
mod refs;
mod registry;
mod value;

pub use document::{
    DescriptorNode, Document, Node, NonFiniteKind, PropertyEntry, PropertyKeyNode,
    PrototypeRefNode, SlotNode,
};
pub use error::{DecodeError, EncodeError};
pub use registry::{ClassDescriptor, Registry, RegistryBuilder, RegistryLenSummary};
pub use value::{
    make_function, make_symbol, ArrayHandle, DateHandle, ErrorData, ErrorHandle, FunctionData,
    FunctionHandle, MapHandle, NotWritableError, ObjectData, ObjectHandle, PropertyDescriptor,
    PropertyKey, PropertySlot, PrototypeRef, SetHandle, SymbolData, SymbolHandle, Value,
};

use tracing::instrument;

/// The encoder/decoder pair, configured once against a shared [`Registry`]
/// and then reused across any number of `marshal`/`unmarshal` calls.
///
/// A `Marshaller` holds no per-call state: the reference table and
/// allocation table it needs live only for the duration of a single
/// `marshal` or `unmarshal` call.
#[derive(Debug, Clone, Default)]
pub struct Marshaller {
    registry: Registry,
}

impl Marshaller {
    /// Configure a marshaller against a shared [`Registry`]. Both peers of
    /// a marshal/unmarshal pair must construct their registries identically
    /// — `echo-marshal` cannot detect a positional mismatch, only a length
    /// mismatch (see [`DecodeError::RegistryMismatch`]).
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// The registry this marshaller was configured with.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode `value` into a [`Document`].
    #[instrument(skip(self, value))]
    pub fn marshal(&self, value: &Value) -> Result<Document, EncodeError> {
        encode::encode(&self.registry, value)
    }

    /// Decode `document` back into a [`Value`].
    #[instrument(skip(self, document))]
    pub fn unmarshal(&self, document: &Document) -> Result<Value, DecodeError> {
        decode::decode(&self.registry, document)
    }
}
