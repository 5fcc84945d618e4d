//! Tensor element types
//!
//! Kernels constrain type-strings to sets of element types, and nodes report
//! the concrete element type of each argument. The textual form
//! (`tensor(float)`, `tensor(int64)`, ...) feeds the kernel definition hash,
//! so it must never change for an existing variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Element type of a tensor argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// 32-bit IEEE float
    Float,
    /// Unsigned byte
    Uint8,
    /// Signed byte
    Int8,
    /// Unsigned 16-bit integer
    Uint16,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// UTF-8 string
    String,
    /// Boolean
    Bool,
    /// 16-bit IEEE half float
    Float16,
    /// 64-bit IEEE float
    Double,
    /// Unsigned 32-bit integer
    Uint32,
    /// Unsigned 64-bit integer
    Uint64,
    /// 16-bit brain float
    BFloat16,
}

impl ElementType {
    /// Every supported element type
    pub const ALL: [ElementType; 14] = [
        ElementType::Float,
        ElementType::Uint8,
        ElementType::Int8,
        ElementType::Uint16,
        ElementType::Int16,
        ElementType::Int32,
        ElementType::Int64,
        ElementType::String,
        ElementType::Bool,
        ElementType::Float16,
        ElementType::Double,
        ElementType::Uint32,
        ElementType::Uint64,
        ElementType::BFloat16,
    ];

    /// Stable type name used in diagnostics and hashing
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Float => "tensor(float)",
            ElementType::Uint8 => "tensor(uint8)",
            ElementType::Int8 => "tensor(int8)",
            ElementType::Uint16 => "tensor(uint16)",
            ElementType::Int16 => "tensor(int16)",
            ElementType::Int32 => "tensor(int32)",
            ElementType::Int64 => "tensor(int64)",
            ElementType::String => "tensor(string)",
            ElementType::Bool => "tensor(bool)",
            ElementType::Float16 => "tensor(float16)",
            ElementType::Double => "tensor(double)",
            ElementType::Uint32 => "tensor(uint32)",
            ElementType::Uint64 => "tensor(uint64)",
            ElementType::BFloat16 => "tensor(bfloat16)",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown element type '{}'", s))
    }
}
