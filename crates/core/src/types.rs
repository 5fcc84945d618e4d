//! Identity types shared across the dispatch layers
//!
//! - OpIdentifier: (domain, op type, since version) of a versioned operator
//! - ArgType / ArgTypeAndIndex: one formal slot in an operator signature
//! - HashValue: stable kernel definition hash
//!
//! The ONNX domain has two spellings, the empty string and `"ai.onnx"`.
//! Every identity in this crate stores the alias form so both spellings
//! compare, hash, and key identically.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable content hash of a kernel definition
pub type HashValue = u64;

/// Empty-string spelling of the default ONNX domain
pub const ONNX_DOMAIN: &str = "";

/// Canonical alias used in place of [`ONNX_DOMAIN`]
pub const ONNX_DOMAIN_ALIAS: &str = "ai.onnx";

/// Traditional ML operator domain
pub const ML_DOMAIN: &str = "ai.onnx.ml";

/// Map the empty domain to its canonical alias
#[inline]
pub fn canonical_domain(domain: &str) -> &str {
    if domain.is_empty() {
        ONNX_DOMAIN_ALIAS
    } else {
        domain
    }
}

/// A versioned operator signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpIdentifier {
    domain: String,
    op_type: String,
    since_version: i32,
}

impl OpIdentifier {
    /// Create an identifier, canonicalizing the domain
    pub fn new(domain: &str, op_type: impl Into<String>, since_version: i32) -> Self {
        Self {
            domain: canonical_domain(domain).to_string(),
            op_type: op_type.into(),
            since_version,
        }
    }

    /// Canonical domain
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Operator type name
    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    /// Opset version the operator signature was introduced in
    pub fn since_version(&self) -> i32 {
        self.since_version
    }
}

impl fmt::Display for OpIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.op_type, self.domain, self.since_version)
    }
}

/// Whether a formal parameter is an input or an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArgType {
    /// Node input
    Input,
    /// Node output
    Output,
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgType::Input => write!(f, "input"),
            ArgType::Output => write!(f, "output"),
        }
    }
}

/// A formal argument slot: (kind, formal index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArgTypeAndIndex {
    /// Input or output
    pub arg_type: ArgType,
    /// Formal parameter index
    pub index: usize,
}

impl ArgTypeAndIndex {
    /// Formal input slot
    pub const fn input(index: usize) -> Self {
        Self {
            arg_type: ArgType::Input,
            index,
        }
    }

    /// Formal output slot
    pub const fn output(index: usize) -> Self {
        Self {
            arg_type: ArgType::Output,
            index,
        }
    }
}

impl fmt::Display for ArgTypeAndIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.arg_type, self.index)
    }
}
