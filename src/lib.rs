//! opkernel - Operator kernel dispatch for ML inference runtimes
//!
//! Given a graph node (an operator invocation with concrete argument types)
//! and a target execution provider, opkernel selects the single registered
//! kernel implementation that can run it and hands back its factory.
//!
//! # Quick Start
//!
//! ```ignore
//! use opkernel::{ElementType, GraphNode, KernelDef, KernelRegistry, KernelTypeStrResolver};
//!
//! let mut registry = KernelRegistry::new();
//! registry.register(
//!     KernelDef::builder()
//!         .set_name("Clip")
//!         .since_version(13)
//!         .provider("CPU")
//!         .type_constraint("T", [ElementType::Float])
//!         .build(),
//!     clip_float_factory(),
//! )?;
//!
//! let node = GraphNode::new("clip_0", "Clip", "", 13).input(ElementType::Float);
//! let kernel = registry.try_find_kernel(&node, "CPU", &resolver)?;
//! ```
//!
//! # Architecture
//!
//! - `opkernel-core`: identities, element types, kernel definitions and their
//!   hashes, schemas, the node trait, errors
//! - `opkernel-registry`: type-string resolver, kernel registry, matcher, and
//!   the schema-aware / hash-only lookup strategies
//!
//! Both are re-exported here.

pub use opkernel_core::*;
pub use opkernel_registry::*;
