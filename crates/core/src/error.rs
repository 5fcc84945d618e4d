//! Error types for kernel dispatch
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Callers distinguish two broad classes:
//! - Fallback candidates (`NoKernelForOp`, `NoMatchingKernel`): another
//!   provider may still be able to run the node.
//! - Configuration defects (`AmbiguousKernel`, `DuplicateHash`,
//!   `ConflictingKernel`): the registry itself is wrong and session
//!   initialization should fail.

use crate::types::{HashValue, OpIdentifier};
use thiserror::Error;

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, KernelError>;

/// Error types for kernel registration and lookup
#[derive(Debug, Error)]
pub enum KernelError {
    /// Operator identity or type-string unknown to the resolver
    #[error("Failed to resolve type string '{type_str}' for op {op}")]
    NotFound {
        /// Operator the lookup was made for
        op: OpIdentifier,
        /// Type-string that could not be resolved
        type_str: String,
    },

    /// No operator schema available for a node
    #[error("No schema registered for op {0}")]
    SchemaNotFound(OpIdentifier),

    /// Attempt to bind a type-string to an empty position set
    #[error("Type string '{type_str}' for op {op} must govern at least one argument")]
    InvalidTypeStrBinding {
        /// Operator the binding was registered for
        op: OpIdentifier,
        /// Offending type-string
        type_str: String,
    },

    /// No kernel registered under the composite key
    #[error("No kernel registered for key '{key}' (node '{node}')")]
    NoKernelForOp {
        /// Composite registry key (op, domain, provider)
        key: String,
        /// Node name
        node: String,
    },

    /// Candidates exist but none verified against the node
    #[error("No matching kernel for node '{node}' op {op} on provider '{provider}': {reasons}")]
    NoMatchingKernel {
        /// Node name
        node: String,
        /// Operator identity of the node
        op: OpIdentifier,
        /// Provider the lookup targeted
        provider: String,
        /// Per-candidate rejection reasons, joined
        reasons: String,
    },

    /// More than one candidate verified against the node
    #[error("Ambiguous kernel for node '{node}' op {op} on '{provider}': {count} match {hashes:?}")]
    AmbiguousKernel {
        /// Node name
        node: String,
        /// Operator identity of the node
        op: OpIdentifier,
        /// Provider the lookup targeted
        provider: String,
        /// Number of matching kernels
        count: usize,
        /// Definition hashes of the matching kernels
        hashes: Vec<HashValue>,
    },

    /// Two registered kernel definitions share a content hash
    #[error("Duplicate kernel def hash {hash:#018x}: '{key}' collides with '{existing_key}'")]
    DuplicateHash {
        /// Hash value both definitions produced
        hash: HashValue,
        /// Key of the definition being registered
        key: String,
        /// Key of the definition already in the index
        existing_key: String,
    },

    /// Registration overlaps an existing kernel in versions and types
    #[error("Failed to add kernel for '{key}': conflicts with op versions [{start}, {end}]")]
    ConflictingKernel {
        /// Composite registry key
        key: String,
        /// Start of the existing kernel's version range
        start: i32,
        /// End of the existing kernel's version range
        end: i32,
    },

    /// No kernel registered with the given definition hash
    #[error("No kernel registered with kernel def hash {0:#018x}")]
    HashNotFound(HashValue),

    /// Hash-only lookup on a node that carries no precomputed hash
    #[error("Node '{0}' carries no kernel def hash")]
    MissingKernelDefHash(String),

    /// The kernel factory failed to produce an instance
    #[error("Kernel creation failed for node '{node}': {message}")]
    KernelCreation {
        /// Node name
        node: String,
        /// Failure reported by the factory
        message: String,
    },

    /// Invalid dispatch configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KernelError {
    /// Whether another provider might still satisfy the node
    pub fn is_fallback_candidate(&self) -> bool {
        matches!(
            self,
            KernelError::NoKernelForOp { .. } | KernelError::NoMatchingKernel { .. }
        )
    }

    /// Whether the error indicates a badly authored registry
    pub fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            KernelError::AmbiguousKernel { .. }
                | KernelError::DuplicateHash { .. }
                | KernelError::ConflictingKernel { .. }
        )
    }

    /// Convenience constructor for factory failures
    pub fn kernel_creation(node: impl Into<String>, message: impl Into<String>) -> Self {
        KernelError::KernelCreation {
            node: node.into(),
            message: message.into(),
        }
    }
}
