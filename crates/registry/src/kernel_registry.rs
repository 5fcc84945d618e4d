//! Kernel registry storage and registration
//!
//! Each execution provider owns one `KernelRegistry`. The registry maps the
//! composite key `"<op> <domain> <provider>"` to every kernel registered under
//! it, and keeps a secondary index from kernel definition hash to entry for
//! minimal builds that have no schemas to match against.
//!
//! ## Lifecycle
//!
//! Registration happens single-threaded while the provider is set up. After
//! that the registry is only read, through `&self`, by any number of session
//! initialization threads at once. Entries are never removed, so the secondary
//! index can refer to entries by position.

use opkernel_core::{
    ConstantTensors, DataTransferManager, ExecutionProvider, FuncManager, HashValue,
    KernelCreateFn, KernelDef, KernelError, Node, OpKernel, OpKernelInfo, Result,
    ValueNameIdxMap,
};
use rustc_hash::FxHashMap;
use std::fmt;
use tracing::debug;

/// Sorted (registry key, kernel def hash) pairs
pub type KernelDefHashes = Vec<(String, HashValue)>;

/// A registered kernel: its definition and its factory
pub struct KernelCreateInfo {
    kernel_def: KernelDef,
    kernel_create_func: KernelCreateFn,
}

impl KernelCreateInfo {
    /// Pair a definition with its factory
    pub fn new(kernel_def: KernelDef, kernel_create_func: KernelCreateFn) -> Self {
        Self {
            kernel_def,
            kernel_create_func,
        }
    }

    /// Kernel definition
    pub fn kernel_def(&self) -> &KernelDef {
        &self.kernel_def
    }

    /// Invoke the factory for `node`
    ///
    /// The returned instance belongs to the caller.
    pub fn create_kernel(
        &self,
        node: &dyn Node,
        execution_provider: &dyn ExecutionProvider,
        constant_initialized_tensors: &ConstantTensors,
        value_name_idx_map: &ValueNameIdxMap,
        funcs_mgr: &mut FuncManager,
        data_transfer_mgr: &DataTransferManager,
    ) -> Result<Box<dyn OpKernel>> {
        let info = OpKernelInfo {
            node,
            kernel_def: &self.kernel_def,
            execution_provider,
            constant_initialized_tensors,
            value_name_idx_map,
            data_transfer_manager: data_transfer_mgr,
        };
        (self.kernel_create_func)(funcs_mgr, &info)
    }
}

impl fmt::Debug for KernelCreateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelCreateInfo")
            .field("kernel_def", &self.kernel_def)
            .finish_non_exhaustive()
    }
}

/// Kernels available to one execution provider
#[derive(Default)]
pub struct KernelRegistry {
    /// Registry key -> entries, in registration order
    kernel_creator_fn_map: FxHashMap<String, Vec<KernelCreateInfo>>,
    /// Kernel def hash -> (registry key, position under that key)
    kernel_def_hash_lookup: FxHashMap<HashValue, (String, usize)>,
}

impl KernelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kernel definition with its factory
    pub fn register(
        &mut self,
        kernel_def: KernelDef,
        kernel_creator: KernelCreateFn,
    ) -> Result<()> {
        self.register_create_info(KernelCreateInfo::new(kernel_def, kernel_creator))
    }

    /// Register a prepared entry
    ///
    /// # Errors
    ///
    /// - `DuplicateHash` if an entry with the same definition hash exists.
    /// - `ConflictingKernel` if an entry under the same key overlaps this one
    ///   in versions and types with identical execution hints.
    pub fn register_create_info(&mut self, create_info: KernelCreateInfo) -> Result<()> {
        let kernel_def = create_info.kernel_def();
        let key = kernel_def.key();
        let hash = kernel_def.hash();

        if let Some((existing_key, _)) = self.kernel_def_hash_lookup.get(&hash) {
            return Err(KernelError::DuplicateHash {
                hash,
                key,
                existing_key: existing_key.clone(),
            });
        }

        if let Some(existing) = self.kernel_creator_fn_map.get(&key) {
            let conflict = existing
                .iter()
                .find(|e| e.kernel_def().is_conflict(kernel_def));
            if let Some(conflict) = conflict {
                let (start, end) = conflict.kernel_def().since_version();
                return Err(KernelError::ConflictingKernel { key, start, end });
            }
        }

        debug!(
            key = %key,
            hash,
            constraints = kernel_def.type_constraint_count(),
            "Registered kernel"
        );

        let entries = self.kernel_creator_fn_map.entry(key.clone()).or_default();
        self.kernel_def_hash_lookup.insert(hash, (key, entries.len()));
        entries.push(create_info);
        Ok(())
    }

    /// Entries registered under a key, in registration order
    pub(crate) fn candidates(&self, key: &str) -> &[KernelCreateInfo] {
        self.kernel_creator_fn_map
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up an entry by its kernel definition hash
    ///
    /// No type or provider verification happens here; the hash was produced
    /// by a full build that already matched the node.
    ///
    /// # Errors
    ///
    /// `HashNotFound` if no entry has this hash.
    pub fn try_find_kernel_by_hash(&self, kernel_def_hash: HashValue) -> Result<&KernelCreateInfo> {
        self.kernel_def_hash_lookup
            .get(&kernel_def_hash)
            .and_then(|(key, pos)| self.kernel_creator_fn_map.get(key)?.get(*pos))
            .ok_or(KernelError::HashNotFound(kernel_def_hash))
    }

    /// Sorted (key, hash) pairs for every entry
    ///
    /// Entries sharing a key are ordered by hash, so the export does not
    /// depend on registration order.
    pub fn export_kernel_def_hashes(&self) -> KernelDefHashes {
        let mut hashes: KernelDefHashes = self
            .kernel_creator_fn_map
            .iter()
            .flat_map(|(key, entries)| {
                entries
                    .iter()
                    .map(move |e| (key.clone(), e.kernel_def().hash()))
            })
            .collect();
        hashes.sort_unstable();
        hashes
    }

    /// Every entry with its key, sorted by key then hash
    pub fn kernel_create_map(&self) -> Vec<(&str, &KernelCreateInfo)> {
        let mut all: Vec<(&str, &KernelCreateInfo)> = self
            .kernel_creator_fn_map
            .iter()
            .flat_map(|(key, entries)| entries.iter().map(move |e| (key.as_str(), e)))
            .collect();
        all.sort_by(|a, b| {
            a.0.cmp(b.0)
                .then_with(|| a.1.kernel_def().hash().cmp(&b.1.kernel_def().hash()))
        });
        all
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.kernel_def_hash_lookup.len()
    }

    /// Whether nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.kernel_creator_fn_map.is_empty()
    }
}

impl fmt::Debug for KernelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelRegistry")
            .field("key_count", &self.kernel_creator_fn_map.len())
            .field("kernel_count", &self.len())
            .finish()
    }
}
