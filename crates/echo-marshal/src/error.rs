// SPDX-License-Identifier: Apache-2.0
// © echo-marshal contributors <https://github.com/flyingrobots/echo-marshal>
//! The error taxonomy, expressed as two small `thiserror` enums — one per
//! fallible boundary — rather than one catch-all error type per crate.

use thiserror::Error;

/// Errors raised while encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A non-plain object's prototype is not in the registry.
    #[error("[E_UNKNOWN_PROTOTYPE] {description}")]
    UnknownPrototype {
        /// Description of the offending value, for diagnostics.
        description: String,
    },
    /// A function value is not in the registry (by identity or source
    /// text).
    #[error("[E_UNKNOWN_FUNCTION] {description}")]
    UnknownFunction {
        /// Description of the offending value, for diagnostics.
        description: String,
    },
    /// A symbol value is not in the registry.
    #[error("[E_UNKNOWN_SYMBOL] {description}")]
    UnknownSymbol {
        /// Description of the offending value, for diagnostics.
        description: String,
    },
    /// A numeric value could not be represented inline. Reserved for a
    /// stricter policy than the default; `echo-marshal`'s default encoder
    /// never raises this, since non-finite numbers round-trip via
    /// [`crate::document::NonFiniteKind`] instead.
    #[error("[E_NON_FINITE] {description}")]
    NonFinite {
        /// Description of the offending value, for diagnostics.
        description: String,
    },
    /// A value kind this marshaller does not support (typed arrays,
    /// regular expressions).
    #[error("[E_UNKNOWN_KIND] {description}")]
    UnknownKind {
        /// Description of the offending value, for diagnostics.
        description: String,
    },
}

/// Errors raised while decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Structural corruption: a malformed node, an out-of-range ordinal, a
    /// dangling `ref`, or an unknown tag.
    #[error("[E_BAD_DOCUMENT] {reason}")]
    BadDocument {
        /// Human-readable description of the corruption.
        reason: String,
    },
    /// An index exceeded the peer registry's length for the named table.
    #[error("[E_REGISTRY_MISMATCH] index {index} exceeds peer registry length {len} for {table}")]
    RegistryMismatch {
        /// Which registry table (`"prototypes"`, `"functions"`,
        /// `"symbols"`).
        table: &'static str,
        /// The out-of-range index.
        index: u32,
        /// The peer registry's length for that table.
        len: usize,
    },
}
