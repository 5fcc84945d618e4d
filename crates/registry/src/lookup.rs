//! Kernel lookup strategies
//!
//! Session initialization depends only on [`KernelLookup`]. Two
//! implementations exist:
//! - [`SchemaKernelLookup`]: verifies node types against kernel constraints
//!   through a [`KernelTypeStrResolver`].
//! - [`HashKernelLookup`]: reads the kernel definition hash stored on each
//!   node and looks it up directly, for builds without operator schemas.
//!
//! The strategy is chosen once from [`DispatchConfig`], not per node.

use crate::config::{DispatchConfig, LookupMode};
use crate::kernel_registry::{KernelCreateInfo, KernelRegistry};
use crate::type_str_resolver::KernelTypeStrResolver;
use opkernel_core::{
    ConstantTensors, DataTransferManager, ExecutionProvider, FuncManager, KernelError, Node,
    OpKernel, Result, ValueNameIdxMap,
};

/// Locates the kernel for a node
pub trait KernelLookup: Send + Sync {
    /// Strategy implemented
    fn mode(&self) -> LookupMode;

    /// Registry-owned kernel entry able to run `node` on `exec_provider`
    fn find_kernel(&self, node: &dyn Node, exec_provider: &str) -> Result<&KernelCreateInfo>;

    /// Find the kernel for `node` and instantiate it
    ///
    /// The returned instance belongs to the caller.
    fn create_kernel(
        &self,
        node: &dyn Node,
        execution_provider: &dyn ExecutionProvider,
        constant_initialized_tensors: &ConstantTensors,
        value_name_idx_map: &ValueNameIdxMap,
        funcs_mgr: &mut FuncManager,
        data_transfer_mgr: &DataTransferManager,
    ) -> Result<Box<dyn OpKernel>> {
        let create_info = self.find_kernel(node, execution_provider.provider_type())?;
        create_info.create_kernel(
            node,
            execution_provider,
            constant_initialized_tensors,
            value_name_idx_map,
            funcs_mgr,
            data_transfer_mgr,
        )
    }
}

/// Lookup backed by operator schemas
#[derive(Debug, Clone, Copy)]
pub struct SchemaKernelLookup<'a> {
    registry: &'a KernelRegistry,
    resolver: &'a KernelTypeStrResolver,
}

impl<'a> SchemaKernelLookup<'a> {
    /// Match against `registry` using bindings from `resolver`
    pub fn new(registry: &'a KernelRegistry, resolver: &'a KernelTypeStrResolver) -> Self {
        Self { registry, resolver }
    }
}

impl KernelLookup for SchemaKernelLookup<'_> {
    fn mode(&self) -> LookupMode {
        LookupMode::Schema
    }

    fn find_kernel(&self, node: &dyn Node, exec_provider: &str) -> Result<&KernelCreateInfo> {
        self.registry.try_find_kernel(node, exec_provider, self.resolver)
    }
}

/// Lookup backed by precomputed kernel definition hashes
#[derive(Debug, Clone, Copy)]
pub struct HashKernelLookup<'a> {
    registry: &'a KernelRegistry,
}

impl<'a> HashKernelLookup<'a> {
    /// Look hashes up in `registry`
    pub fn new(registry: &'a KernelRegistry) -> Self {
        Self { registry }
    }
}

impl KernelLookup for HashKernelLookup<'_> {
    fn mode(&self) -> LookupMode {
        LookupMode::Hash
    }

    /// `exec_provider` is not consulted; the hash already pins the provider.
    fn find_kernel(&self, node: &dyn Node, _exec_provider: &str) -> Result<&KernelCreateInfo> {
        let hash = node
            .kernel_def_hash()
            .ok_or_else(|| KernelError::MissingKernelDefHash(node.name().to_string()))?;
        self.registry.try_find_kernel_by_hash(hash)
    }
}

/// Build the lookup strategy selected by `config`
///
/// # Errors
///
/// `Config` if schema lookup is selected but no resolver is available.
pub fn build_kernel_lookup<'a>(
    config: &DispatchConfig,
    registry: &'a KernelRegistry,
    resolver: Option<&'a KernelTypeStrResolver>,
) -> Result<Box<dyn KernelLookup + 'a>> {
    match (config.lookup_mode, resolver) {
        (LookupMode::Schema, Some(resolver)) => {
            Ok(Box::new(SchemaKernelLookup::new(registry, resolver)))
        }
        (LookupMode::Schema, None) => Err(KernelError::Config(
            "schema lookup requires a kernel type string resolver".to_string(),
        )),
        (LookupMode::Hash, _) => Ok(Box::new(HashKernelLookup::new(registry))),
    }
}
