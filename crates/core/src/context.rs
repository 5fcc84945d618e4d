//! Execution context handed to kernel factories
//!
//! None of these types are interpreted by the dispatch layer. They are carried
//! from session initialization into the factory of the matched kernel, which
//! decides what to do with them.

use crate::error::{KernelError, Result};
use crate::kernel_def::KernelDef;
use crate::node::Node;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque runtime value (tensor, sequence, map, ...)
pub type Value = Arc<dyn Any + Send + Sync>;

/// Constant initializers, keyed by value index
pub type ConstantTensors = FxHashMap<usize, Value>;

/// An execution backend
pub trait ExecutionProvider: Send + Sync {
    /// Provider type string, matching `KernelDef::provider`
    fn provider_type(&self) -> &str;
}

/// An executable kernel instance
pub trait OpKernel: Send + Sync {
    /// Operator type this instance executes
    fn op_type(&self) -> &str;

    /// Downcast hook for callers that know the concrete kernel
    fn as_any(&self) -> &dyn Any;
}

/// Bidirectional map between value names and dense indices
#[derive(Debug, Default, Clone)]
pub struct ValueNameIdxMap {
    name_to_idx: FxHashMap<String, usize>,
    idx_to_name: Vec<String>,
}

impl ValueNameIdxMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, assigning the next free one if unseen
    pub fn add(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.name_to_idx.get(name) {
            return idx;
        }
        let idx = self.idx_to_name.len();
        self.idx_to_name.push(name.to_string());
        self.name_to_idx.insert(name.to_string(), idx);
        idx
    }

    /// Index of an existing name
    pub fn get_idx(&self, name: &str) -> Result<usize> {
        self.name_to_idx
            .get(name)
            .copied()
            .ok_or_else(|| KernelError::Config(format!("Unknown value name '{}'", name)))
    }

    /// Name of an existing index
    pub fn get_name(&self, idx: usize) -> Option<&str> {
        self.idx_to_name.get(idx).map(String::as_str)
    }

    /// Number of names
    pub fn len(&self) -> usize {
        self.idx_to_name.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.idx_to_name.is_empty()
    }
}

/// Compiled functions produced for fused nodes, by node name
#[derive(Default)]
pub struct FuncManager {
    funcs: FxHashMap<String, Value>,
}

impl FuncManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a compiled function
    pub fn add(&mut self, name: impl Into<String>, func: Value) {
        self.funcs.insert(name.into(), func);
    }

    /// Compiled function for `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.funcs.get(name)
    }
}

impl fmt::Debug for FuncManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncManager")
            .field("func_count", &self.funcs.len())
            .finish()
    }
}

/// Copies values between provider memories
pub trait DataTransfer: Send + Sync {
    /// Whether this transfer handles `src` -> `dst`
    fn can_copy(&self, src_provider: &str, dst_provider: &str) -> bool;
}

/// Registered data transfers
#[derive(Default)]
pub struct DataTransferManager {
    transfers: Vec<Box<dyn DataTransfer>>,
}

impl DataTransferManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transfer
    pub fn register(&mut self, transfer: Box<dyn DataTransfer>) {
        self.transfers.push(transfer);
    }

    /// First transfer able to copy `src` -> `dst`
    pub fn get_data_transfer(
        &self,
        src_provider: &str,
        dst_provider: &str,
    ) -> Option<&dyn DataTransfer> {
        self.transfers
            .iter()
            .find(|t| t.can_copy(src_provider, dst_provider))
            .map(|t| t.as_ref())
    }
}

impl fmt::Debug for DataTransferManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTransferManager")
            .field("transfer_count", &self.transfers.len())
            .finish()
    }
}

/// Everything a kernel factory gets to see
pub struct OpKernelInfo<'a> {
    /// Node being instantiated
    pub node: &'a dyn Node,
    /// Definition of the matched kernel
    pub kernel_def: &'a KernelDef,
    /// Provider the kernel will run on
    pub execution_provider: &'a dyn ExecutionProvider,
    /// Constant initializers
    pub constant_initialized_tensors: &'a ConstantTensors,
    /// Value name to index map of the session
    pub value_name_idx_map: &'a ValueNameIdxMap,
    /// Data transfers of the session
    pub data_transfer_manager: &'a DataTransferManager,
}

/// Factory producing a kernel instance for a matched node
pub type KernelCreateFn =
    Box<dyn Fn(&mut FuncManager, &OpKernelInfo<'_>) -> Result<Box<dyn OpKernel>> + Send + Sync>;
