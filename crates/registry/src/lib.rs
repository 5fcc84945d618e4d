//! Kernel registry and dispatch
//!
//! This crate implements kernel selection for graph nodes:
//! - KernelTypeStrResolver: (operator, type-string) -> governed argument slots
//! - KernelRegistry: per-provider kernel table with a definition-hash index
//! - Matcher: provider, version, and type verification over registry candidates
//! - KernelLookup: schema-aware and hash-only lookup behind one interface
//! - DispatchConfig: `dispatch.toml` selecting the lookup strategy
//!
//! # Concurrency
//!
//! Registries and resolvers are filled single-threaded during provider setup
//! and only read afterwards. Every query takes `&self`, and both types are
//! `Send + Sync`, so sessions share them behind an `Arc` without locking.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod kernel_registry;
pub mod lookup;
mod matcher;
pub mod type_str_resolver;

pub use config::{DispatchConfig, LookupMode, CONFIG_FILE_NAME};
pub use kernel_registry::{KernelCreateInfo, KernelDefHashes, KernelRegistry};
pub use lookup::{build_kernel_lookup, HashKernelLookup, KernelLookup, SchemaKernelLookup};
pub use type_str_resolver::KernelTypeStrResolver;
