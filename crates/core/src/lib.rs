//! Core types for kernel dispatch
//!
//! This crate defines the value types shared by every dispatch layer:
//! - OpIdentifier, ArgType, ArgTypeAndIndex: operator and argument identity
//! - ElementType: tensor element types checked against kernel constraints
//! - KernelDef / KernelDefBuilder: declarative kernel registration metadata
//!   with a deterministic content hash
//! - OpSchema / OpSchemaRegistry: the slice of operator schemas used to
//!   resolve type-strings
//! - Node / GraphNode: the graph node collaborator
//! - Execution context types passed opaquely to kernel factories
//! - KernelError: error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod element_type;
pub mod error;
pub mod kernel_def;
pub mod node;
pub mod schema;
pub mod types;

pub use context::{
    ConstantTensors, DataTransfer, DataTransferManager, ExecutionProvider, FuncManager,
    KernelCreateFn, OpKernel, OpKernelInfo, Value, ValueNameIdxMap,
};
pub use element_type::ElementType;
pub use error::{KernelError, Result};
pub use kernel_def::{registry_key, KernelDef, KernelDefBuilder, MemType, OPEN_VERSION_END};
pub use node::{GraphNode, Node};
pub use schema::{
    FormalParameter, FormalParameterOption, OpSchema, OpSchemaRegistry, SchemaLookup,
    TypeConstraintParam,
};
pub use types::{
    canonical_domain, ArgType, ArgTypeAndIndex, HashValue, OpIdentifier, ML_DOMAIN, ONNX_DOMAIN,
    ONNX_DOMAIN_ALIAS,
};
