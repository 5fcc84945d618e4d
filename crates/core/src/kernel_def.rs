//! Kernel definitions and their content hash
//!
//! A `KernelDef` is the declarative half of a kernel registration: which
//! operator it serves (name, domain, version range), which provider it runs
//! on, which element types each type-string accepts, and a handful of
//! execution hints. It is built once with `KernelDefBuilder` and is immutable
//! afterwards.
//!
//! ## Hash stability
//!
//! The hash is persisted into minimal-build graphs and looked up later by a
//! possibly different process on a possibly different platform. It is computed
//! with xxh3-64 over a fixed little-endian encoding of every field, with maps
//! iterated in sorted order. Changing the encoding invalidates every persisted
//! artifact.

use crate::element_type::ElementType;
use crate::types::{canonical_domain, HashValue};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use xxhash_rust::xxh3::Xxh3;

/// Open end of a version range
pub const OPEN_VERSION_END: i32 = i32::MAX;

/// Memory placement requested for a kernel argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemType {
    /// Provider default memory
    Default,
    /// Input must live in CPU-accessible memory
    CpuInput,
    /// Output is produced in CPU-accessible memory
    CpuOutput,
}

impl MemType {
    fn tag(self) -> u8 {
        match self {
            MemType::Default => 0,
            MemType::CpuInput => 1,
            MemType::CpuOutput => 2,
        }
    }
}

/// Build the composite registry key for (op, domain, provider)
///
/// The empty domain is replaced with its canonical alias.
pub fn registry_key(op_name: &str, domain: &str, provider: &str) -> String {
    let domain = canonical_domain(domain);
    let mut key = String::with_capacity(op_name.len() + domain.len() + provider.len() + 2);
    key.push_str(op_name);
    key.push(' ');
    key.push_str(domain);
    key.push(' ');
    key.push_str(provider);
    key
}

/// Declarative description of one kernel implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelDef {
    op_name: String,
    domain: String,
    provider: String,
    since_start: i32,
    since_end: i32,
    type_constraints: BTreeMap<String, SmallVec<[ElementType; 4]>>,
    input_memory_types: BTreeMap<usize, MemType>,
    output_memory_types: BTreeMap<usize, MemType>,
    may_inplace: Vec<(usize, usize)>,
    alias: Vec<(usize, usize)>,
    exec_queue_id: i32,
    hash: HashValue,
}

impl KernelDef {
    /// Start a new definition
    pub fn builder() -> KernelDefBuilder {
        KernelDefBuilder::new()
    }

    /// Operator name
    pub fn op_name(&self) -> &str {
        &self.op_name
    }

    /// Canonical domain
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Execution provider this kernel targets
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Supported operator version range, inclusive
    pub fn since_version(&self) -> (i32, i32) {
        (self.since_start, self.since_end)
    }

    /// Accepted element types per type-string, sorted by type-string
    pub fn type_constraints(&self) -> impl Iterator<Item = (&str, &[ElementType])> {
        self.type_constraints
            .iter()
            .map(|(name, types)| (name.as_str(), types.as_slice()))
    }

    /// Accepted element types for one type-string
    pub fn type_constraint(&self, type_str: &str) -> Option<&[ElementType]> {
        self.type_constraints.get(type_str).map(|t| t.as_slice())
    }

    /// Number of declared type constraints
    pub fn type_constraint_count(&self) -> usize {
        self.type_constraints.len()
    }

    /// Memory type of an input
    pub fn input_memory_type(&self, index: usize) -> MemType {
        self.input_memory_types
            .get(&index)
            .copied()
            .unwrap_or(MemType::Default)
    }

    /// Memory type of an output
    pub fn output_memory_type(&self, index: usize) -> MemType {
        self.output_memory_types
            .get(&index)
            .copied()
            .unwrap_or(MemType::Default)
    }

    /// (input, output) pairs that may share a buffer
    pub fn may_inplace(&self) -> &[(usize, usize)] {
        &self.may_inplace
    }

    /// (input, output) pairs that must share a buffer
    pub fn alias(&self) -> &[(usize, usize)] {
        &self.alias
    }

    /// Execution queue the kernel is scheduled on
    pub fn exec_queue_id(&self) -> i32 {
        self.exec_queue_id
    }

    /// Stable content hash
    pub fn hash(&self) -> HashValue {
        self.hash
    }

    /// Composite registry key
    pub fn key(&self) -> String {
        registry_key(&self.op_name, &self.domain, &self.provider)
    }

    /// Whether a node at `node_version` falls into this kernel's range
    ///
    /// A node's since-version is its schema's since-version, so an open-ended
    /// range only matches its exact start; a bounded range matches anything
    /// from its start up to its end.
    pub fn matches_version(&self, node_version: i32) -> bool {
        self.since_start == node_version
            || (self.since_start < node_version
                && self.since_end != OPEN_VERSION_END
                && self.since_end >= node_version)
    }

    /// Whether this definition would shadow `other` in the registry
    ///
    /// Two definitions conflict when they serve the same op, domain, and
    /// provider, their version ranges overlap, every type-string they both
    /// constrain has overlapping accepted types, and their execution hints
    /// are identical.
    pub fn is_conflict(&self, other: &KernelDef) -> bool {
        if self.op_name != other.op_name
            || self.domain != other.domain
            || self.provider != other.provider
        {
            return false;
        }
        if self.since_start > other.since_end || self.since_end < other.since_start {
            return false;
        }
        for (type_str, types) in &self.type_constraints {
            if let Some(other_types) = other.type_constraints.get(type_str) {
                if !types.iter().any(|t| other_types.contains(t)) {
                    return false;
                }
            }
        }
        self.input_memory_types == other.input_memory_types
            && self.output_memory_types == other.output_memory_types
            && self.may_inplace == other.may_inplace
            && self.alias == other.alias
            && self.exec_queue_id == other.exec_queue_id
    }

    fn compute_hash(&self) -> HashValue {
        let mut h = HashWriter(Xxh3::new());
        h.str(&self.op_name);
        h.str(&self.domain);
        h.str(&self.provider);
        h.i32(self.since_start);
        h.i32(self.since_end);

        h.len(self.type_constraints.len());
        for (type_str, types) in &self.type_constraints {
            h.str(type_str);
            h.len(types.len());
            for t in types {
                h.str(t.as_str());
            }
        }

        for map in [&self.input_memory_types, &self.output_memory_types] {
            h.len(map.len());
            for (index, mem) in map {
                h.len(*index);
                h.0.update(&[mem.tag()]);
            }
        }

        for pairs in [&self.may_inplace, &self.alias] {
            h.len(pairs.len());
            for (input, output) in pairs {
                h.len(*input);
                h.len(*output);
            }
        }

        h.i32(self.exec_queue_id);
        h.0.digest()
    }
}

/// Length-prefixed little-endian field encoder over xxh3
struct HashWriter(Xxh3);

impl HashWriter {
    fn len(&mut self, n: usize) {
        self.0.update(&(n as u64).to_le_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.0.update(&v.to_le_bytes());
    }

    fn str(&mut self, s: &str) {
        self.len(s.len());
        self.0.update(s.as_bytes());
    }
}

/// Builder for [`KernelDef`]
///
/// ```rust,ignore
/// let def = KernelDef::builder()
///     .set_name("Clip")
///     .set_domain(ONNX_DOMAIN)
///     .since_version_range(6, 10)
///     .provider("CPU")
///     .type_constraint("T", [ElementType::Float])
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct KernelDefBuilder {
    op_name: String,
    domain: String,
    provider: String,
    since_start: i32,
    since_end: i32,
    type_constraints: BTreeMap<String, SmallVec<[ElementType; 4]>>,
    input_memory_types: BTreeMap<usize, MemType>,
    output_memory_types: BTreeMap<usize, MemType>,
    may_inplace: Vec<(usize, usize)>,
    alias: Vec<(usize, usize)>,
    exec_queue_id: i32,
}

impl Default for KernelDefBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelDefBuilder {
    /// Empty builder: ONNX domain, version 1 onwards, no constraints
    pub fn new() -> Self {
        Self {
            op_name: String::new(),
            domain: String::new(),
            provider: String::new(),
            since_start: 1,
            since_end: OPEN_VERSION_END,
            type_constraints: BTreeMap::new(),
            input_memory_types: BTreeMap::new(),
            output_memory_types: BTreeMap::new(),
            may_inplace: Vec::new(),
            alias: Vec::new(),
            exec_queue_id: 0,
        }
    }

    /// Operator name
    pub fn set_name(mut self, op_name: impl Into<String>) -> Self {
        self.op_name = op_name.into();
        self
    }

    /// Operator domain; empty means ONNX
    pub fn set_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Execution provider
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Open-ended version range starting at `since`
    pub fn since_version(mut self, since: i32) -> Self {
        self.since_start = since;
        self.since_end = OPEN_VERSION_END;
        self
    }

    /// Bounded inclusive version range
    pub fn since_version_range(mut self, start: i32, end: i32) -> Self {
        self.since_start = start;
        self.since_end = end;
        self
    }

    /// Accepted element types for a type-string, replacing earlier calls
    pub fn type_constraint(
        mut self,
        type_str: impl Into<String>,
        types: impl IntoIterator<Item = ElementType>,
    ) -> Self {
        let mut types: SmallVec<[ElementType; 4]> = types.into_iter().collect();
        types.sort();
        types.dedup();
        self.type_constraints.insert(type_str.into(), types);
        self
    }

    /// Memory type of one input
    pub fn input_memory_type(mut self, mem: MemType, index: usize) -> Self {
        self.input_memory_types.insert(index, mem);
        self
    }

    /// Memory type of one output
    pub fn output_memory_type(mut self, mem: MemType, index: usize) -> Self {
        self.output_memory_types.insert(index, mem);
        self
    }

    /// Allow `input` and `output` to share a buffer
    pub fn may_inplace(mut self, input: usize, output: usize) -> Self {
        self.may_inplace.push((input, output));
        self
    }

    /// Require `input` and `output` to share a buffer
    pub fn alias(mut self, input: usize, output: usize) -> Self {
        self.alias.push((input, output));
        self
    }

    /// Execution queue
    pub fn exec_queue_id(mut self, id: i32) -> Self {
        self.exec_queue_id = id;
        self
    }

    /// Finish the definition and compute its hash
    pub fn build(mut self) -> KernelDef {
        self.may_inplace.sort_unstable();
        self.may_inplace.dedup();
        self.alias.sort_unstable();
        self.alias.dedup();

        let mut def = KernelDef {
            op_name: self.op_name,
            domain: canonical_domain(&self.domain).to_string(),
            provider: self.provider,
            since_start: self.since_start,
            since_end: self.since_end,
            type_constraints: self.type_constraints,
            input_memory_types: self.input_memory_types,
            output_memory_types: self.output_memory_types,
            may_inplace: self.may_inplace,
            alias: self.alias,
            exec_queue_id: self.exec_queue_id,
            hash: 0,
        };
        def.hash = def.compute_hash();
        def
    }
}
