//! Type-string resolution
//!
//! Kernel definitions constrain symbolic type-strings (`T`, `T1`, ...), while
//! nodes carry concrete types per argument. The resolver bridges the two: for
//! each operator identity it records which formal argument slots each
//! type-string governs.
//!
//! Bindings are written once per identity during registration and read
//! concurrently afterwards. Re-registering a binding is a no-op, since every
//! kernel registered for the same operator re-derives the same binding.
//!
//! A type-string may also be a formal parameter name, which lets a kernel
//! constrain one specific argument even when the schema shares its type
//! parameter with others.

use opkernel_core::{
    ArgType, ArgTypeAndIndex, KernelError, Node, OpIdentifier, OpSchema, Result, SchemaLookup,
};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::{debug, warn};

type ArgList = SmallVec<[ArgTypeAndIndex; 2]>;

/// Maps (operator identity, type-string) to the formal slots it governs
#[derive(Debug, Default, Clone)]
pub struct KernelTypeStrResolver {
    op_type_str_map: FxHashMap<OpIdentifier, FxHashMap<String, ArgList>>,
}

impl KernelTypeStrResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Formal slots governed by `type_str` for `op_id`, ordered
    ///
    /// # Errors
    ///
    /// `NotFound` if the identity or the type-string is unknown.
    pub fn resolve_kernel_type_str(
        &self,
        op_id: &OpIdentifier,
        type_str: &str,
    ) -> Result<&[ArgTypeAndIndex]> {
        self.op_type_str_map
            .get(op_id)
            .and_then(|type_strs| type_strs.get(type_str))
            .map(|args| args.as_slice())
            .ok_or_else(|| KernelError::NotFound {
                op: op_id.clone(),
                type_str: type_str.to_string(),
            })
    }

    /// Bind `type_str` to `args` for `op_id`
    ///
    /// Returns `Ok(true)` if the binding was inserted and `Ok(false)` if the
    /// type-string was already bound, in which case nothing changes.
    ///
    /// # Errors
    ///
    /// `InvalidTypeStrBinding` if `args` is empty.
    pub fn register(
        &mut self,
        op_id: OpIdentifier,
        type_str: impl Into<String>,
        args: impl IntoIterator<Item = ArgTypeAndIndex>,
    ) -> Result<bool> {
        let type_str = type_str.into();
        let mut args: ArgList = args.into_iter().collect();
        args.sort_unstable();
        args.dedup();

        if args.is_empty() {
            return Err(KernelError::InvalidTypeStrBinding { op: op_id, type_str });
        }

        let type_strs = self.op_type_str_map.entry(op_id).or_default();
        if let Some(existing) = type_strs.get(&type_str) {
            if *existing != args {
                warn!(
                    type_str = %type_str,
                    existing = ?existing,
                    requested = ?args,
                    "Ignoring conflicting type string binding"
                );
            }
            return Ok(false);
        }
        type_strs.insert(type_str, args);
        Ok(true)
    }

    /// Populate bindings for one operator from its schema
    ///
    /// Each formal parameter is bound under its type-string (when the schema
    /// declares that type parameter) and under its own name. Variadic
    /// parameters occupy a single formal slot; the matcher expands it to the
    /// node's actual arguments.
    ///
    /// Returns `Ok(false)` if the identity already has bindings.
    pub fn register_op_schema(&mut self, op_schema: &OpSchema) -> Result<bool> {
        let op_id = op_schema.op_id();
        if self.op_type_str_map.contains_key(&op_id) {
            return Ok(false);
        }

        let type_param_names: FxHashSet<&str> = op_schema
            .type_constraints
            .iter()
            .map(|tc| tc.type_param_str.as_str())
            .collect();

        let mut type_strs: FxHashMap<String, ArgList> = FxHashMap::default();
        for (arg_type, params) in [
            (ArgType::Input, &op_schema.inputs),
            (ArgType::Output, &op_schema.outputs),
        ] {
            for (index, param) in params.iter().enumerate() {
                let arg = ArgTypeAndIndex { arg_type, index };
                if type_param_names.contains(param.type_str.as_str()) {
                    type_strs.entry(param.type_str.clone()).or_default().push(arg);
                }
                let by_name = type_strs.entry(param.name.clone()).or_default();
                if !by_name.contains(&arg) {
                    by_name.push(arg);
                }
            }
        }
        for args in type_strs.values_mut() {
            args.sort_unstable();
        }

        debug!(op = %op_id, type_strs = type_strs.len(), "Registered op schema type strings");
        self.op_type_str_map.insert(op_id, type_strs);
        Ok(true)
    }

    /// Populate bindings for the operator a node invokes
    ///
    /// # Errors
    ///
    /// `SchemaNotFound` if `schemas` has no schema with the node's exact
    /// since-version.
    pub fn register_node_op_schema(
        &mut self,
        node: &dyn Node,
        schemas: &dyn SchemaLookup,
    ) -> Result<bool> {
        let op_id = node.op_id();
        if self.op_type_str_map.contains_key(&op_id) {
            return Ok(false);
        }
        match schemas.get_schema(node.op_type(), node.domain(), node.since_version()) {
            Some(schema) if schema.since_version == node.since_version() => {
                self.register_op_schema(schema)
            }
            _ => Err(KernelError::SchemaNotFound(op_id)),
        }
    }

    /// Whether any binding exists for `op_id`
    pub fn contains(&self, op_id: &OpIdentifier) -> bool {
        self.op_type_str_map.contains_key(op_id)
    }

    /// Number of operator identities with bindings
    pub fn len(&self) -> usize {
        self.op_type_str_map.len()
    }

    /// Whether the resolver has no bindings
    pub fn is_empty(&self) -> bool {
        self.op_type_str_map.is_empty()
    }
}
