// SPDX-License-Identifier: Apache-2.0
// © echo-marshal contributors <https://github.com/flyingrobots/echo-marshal>
//! The peer-shared registry: positional tables of prototypes, functions,
//! and symbols that both ends of a marshal/unmarshal pair must agree on.

use std::rc::Rc;

use crate::error::{DecodeError, EncodeError};
use crate::value::{FunctionHandle, PrototypeRef, SymbolHandle};

/// A registered class: just the human name — see [`crate::value::PrototypeRef`]
/// for why `echo-marshal` doesn't need to store an actual prototype object
/// to match against.
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    /// Human-readable class name, used only in diagnostics.
    pub name: String,
}

/// Summary counts for the three registry tables, for peers to sanity-check
/// "same length" — positional mismatches are otherwise silent and the
/// caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryLenSummary {
    /// Number of registered prototypes.
    pub prototypes: usize,
    /// Number of registered functions.
    pub functions: usize,
    /// Number of registered symbols.
    pub symbols: usize,
}

/// The immutable, peer-shared configuration supplied at construction.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    prototypes: Vec<ClassDescriptor>,
    functions: Vec<FunctionHandle>,
    symbols: Vec<SymbolHandle>,
}

impl Registry {
    /// An empty registry (all three tables default to empty).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Begin building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Summary counts, for local sanity-checking against a peer's
    /// registry.
    pub fn len_summary(&self) -> RegistryLenSummary {
        RegistryLenSummary {
            prototypes: self.prototypes.len(),
            functions: self.functions.len(),
            symbols: self.symbols.len(),
        }
    }

    /// `prototype-of`: classify `prototype` as `"plain"` or a registry
    /// index. Fails with [`EncodeError::UnknownPrototype`] if `prototype`
    /// names a class index out of range for this (encode-side) registry.
    pub fn prototype_ref_index(&self, prototype: PrototypeRef) -> Result<PrototypeRef, EncodeError> {
        match prototype {
            PrototypeRef::Plain => Ok(PrototypeRef::Plain),
            PrototypeRef::Class(index) => {
                if (index as usize) < self.prototypes.len() {
                    Ok(PrototypeRef::Class(index))
                } else {
                    Err(EncodeError::UnknownPrototype {
                        description: format!("class index {index} is not registered"),
                    })
                }
            }
        }
    }

    /// `prototype-at`: resolve a registry index to its class descriptor.
    pub fn prototype_at(&self, index: u32) -> Result<&ClassDescriptor, DecodeError> {
        self.prototypes
            .get(index as usize)
            .ok_or(DecodeError::RegistryMismatch {
                table: "prototypes",
                index,
                len: self.prototypes.len(),
            })
    }

    /// `function-index`: match by identity first, then by source-text
    /// equality.
    pub fn function_index(&self, f: &FunctionHandle) -> Result<u32, EncodeError> {
        if let Some(index) = self
            .functions
            .iter()
            .position(|candidate| Rc::ptr_eq(candidate, f))
        {
            return Ok(index as u32);
        }
        if let Some(index) = self.functions.iter().position(|candidate| candidate.source == f.source) {
            return Ok(index as u32);
        }
        Err(EncodeError::UnknownFunction {
            description: f
                .name
                .clone()
                .unwrap_or_else(|| "<anonymous function>".to_string()),
        })
    }

    /// `function-at`: resolve a registry index to its callable.
    pub fn function_at(&self, index: u32) -> Result<FunctionHandle, DecodeError> {
        self.functions
            .get(index as usize)
            .cloned()
            .ok_or(DecodeError::RegistryMismatch {
                table: "functions",
                index,
                len: self.functions.len(),
            })
    }

    /// `symbol-index`: match by identity only.
    pub fn symbol_index(&self, s: &SymbolHandle) -> Result<u32, EncodeError> {
        self.symbols
            .iter()
            .position(|candidate| Rc::ptr_eq(candidate, s))
            .map(|index| index as u32)
            .ok_or_else(|| EncodeError::UnknownSymbol {
                description: s
                    .description
                    .clone()
                    .unwrap_or_else(|| "<anonymous symbol>".to_string()),
            })
    }

    /// `symbol-at`: resolve a registry index to its symbol handle.
    pub fn symbol_at(&self, index: u32) -> Result<SymbolHandle, DecodeError> {
        self.symbols
            .get(index as usize)
            .cloned()
            .ok_or(DecodeError::RegistryMismatch {
                table: "symbols",
                index,
                len: self.symbols.len(),
            })
    }
}

/// Builder for [`Registry`]: all three tables default to empty and
/// are filled positionally, in the order entries are added.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    prototypes: Vec<ClassDescriptor>,
    functions: Vec<FunctionHandle>,
    symbols: Vec<SymbolHandle>,
}

impl RegistryBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a class to the `prototypes` table.
    pub fn with_prototype(mut self, name: impl Into<String>) -> Self {
        self.prototypes.push(ClassDescriptor { name: name.into() });
        self
    }

    /// Append a callable to the `functions` table.
    pub fn with_function(mut self, f: FunctionHandle) -> Self {
        self.functions.push(f);
        self
    }

    /// Append a symbol to the `symbols` table.
    pub fn with_symbol(mut self, s: SymbolHandle) -> Self {
        self.symbols.push(s);
        self
    }

    /// Finish building an immutable [`Registry`].
    pub fn build(self) -> Registry {
        Registry {
            prototypes: self.prototypes,
            functions: self.functions,
            symbols: self.symbols,
        }
    }
}
