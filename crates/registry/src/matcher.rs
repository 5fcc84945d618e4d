//! Kernel selection
//!
//! Given a node and a target provider, pick the one registered kernel whose
//! provider, version range, and type constraints all agree with the node.
//!
//! Verification only checks; it never infers types. A node is expected to
//! have passed operator type checking already, so the type constraints here
//! serve to pick among implementations (e.g. `Clip<float>` vs `Clip<int32>`).
//!
//! Candidates that fail verification are skipped, with the reason kept for
//! the diagnostic. Zero survivors is `NoMatchingKernel`; more than one is
//! `AmbiguousKernel`, which always means the registry was authored wrong.

use crate::kernel_registry::{KernelCreateInfo, KernelRegistry};
use crate::type_str_resolver::KernelTypeStrResolver;
use opkernel_core::{
    registry_key, ArgType, ArgTypeAndIndex, ConstantTensors, DataTransferManager, ElementType,
    ExecutionProvider, FuncManager, KernelDef, KernelError, Node, OpIdentifier, OpKernel, Result,
    ValueNameIdxMap,
};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::hash::BuildHasher;
use tracing::{debug, error, trace, warn};

/// Actual element types occupying one formal slot of `node`
///
/// A formal input or output maps to the contiguous run of actual arguments
/// given by the node's per-formal argument counts, so a variadic formal covers
/// every argument it owns. Slots the node does not have yield an empty slice.
fn actual_arg_types(node: &dyn Node, arg: ArgTypeAndIndex) -> &[Option<ElementType>] {
    match arg.arg_type {
        ArgType::Input => formal_slot(node.input_arg_count(), node.input_types(), arg.index),
        ArgType::Output => formal_slot(node.output_arg_count(), node.output_types(), arg.index),
    }
}

fn formal_slot<'a>(
    counts: &[usize],
    types: &'a [Option<ElementType>],
    index: usize,
) -> &'a [Option<ElementType>] {
    if counts.is_empty() {
        return types.get(index..=index).unwrap_or(&[]);
    }
    match counts.get(index) {
        Some(&count) => {
            let start: usize = counts[..index].iter().sum();
            types.get(start..start + count).unwrap_or(&[])
        }
        None => &[],
    }
}

fn type_list(types: &[ElementType]) -> String {
    types
        .iter()
        .map(ElementType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check one candidate against a node
///
/// If the node already carries a provider assignment the candidate must match
/// it and `exec_provider` is ignored; otherwise the candidate must match
/// `exec_provider`. Returns the rejection reason on mismatch.
pub(crate) fn verify_kernel_def(
    node: &dyn Node,
    kernel_def: &KernelDef,
    exec_provider: &str,
    resolver: &KernelTypeStrResolver,
) -> std::result::Result<(), String> {
    let expected_provider = node.execution_provider_type().unwrap_or(exec_provider);
    if kernel_def.provider() != expected_provider {
        return Err(format!(
            "kernel provider '{}' does not match '{}'",
            kernel_def.provider(),
            expected_provider
        ));
    }

    if !kernel_def.matches_version(node.since_version()) {
        let (start, end) = kernel_def.since_version();
        return Err(format!(
            "node version {} outside kernel range [{}, {}]",
            node.since_version(),
            start,
            end
        ));
    }

    let op_id = node.op_id();
    for (type_str, accepted) in kernel_def.type_constraints() {
        let args = match resolver.resolve_kernel_type_str(&op_id, type_str) {
            Ok(args) => args,
            Err(e) => {
                warn!(
                    node = node.name(),
                    error = %e,
                    "Kernel constrains an unresolvable type string"
                );
                return Err(e.to_string());
            }
        };
        for &arg in args {
            for actual in actual_arg_types(node, arg).iter().flatten() {
                if !accepted.contains(actual) {
                    return Err(format!(
                        "type mismatch: {} ({}) is {}, kernel accepts [{}]",
                        type_str,
                        arg,
                        actual,
                        type_list(accepted)
                    ));
                }
            }
        }
    }
    Ok(())
}

impl KernelRegistry {
    /// Find the unique kernel able to run `node` on `exec_provider`
    ///
    /// # Errors
    ///
    /// - `NoKernelForOp` if nothing is registered for the node's op and domain
    ///   under `exec_provider`.
    /// - `NoMatchingKernel` if no candidate verifies.
    /// - `AmbiguousKernel` if more than one candidate verifies.
    pub fn try_find_kernel(
        &self,
        node: &dyn Node,
        exec_provider: &str,
        resolver: &KernelTypeStrResolver,
    ) -> Result<&KernelCreateInfo> {
        let key = registry_key(node.op_type(), node.domain(), exec_provider);
        let candidates = self.candidates(&key);
        if candidates.is_empty() {
            return Err(KernelError::NoKernelForOp {
                key,
                node: node.name().to_string(),
            });
        }

        let mut matched: SmallVec<[&KernelCreateInfo; 1]> = SmallVec::new();
        let mut reasons = Vec::new();
        for candidate in candidates {
            let kernel_def = candidate.kernel_def();
            match verify_kernel_def(node, kernel_def, exec_provider, resolver) {
                Ok(()) => matched.push(candidate),
                Err(reason) => {
                    trace!(
                        node = node.name(),
                        hash = kernel_def.hash(),
                        reason = %reason,
                        "Kernel rejected"
                    );
                    reasons.push(format!("kernel {:#018x}: {}", kernel_def.hash(), reason));
                }
            }
        }

        self.select_unique(matched, node.name(), node.op_id(), exec_provider, reasons)
    }

    /// Find the unique kernel for an operator and explicit type bindings
    ///
    /// For tooling that asks "can this provider run op X at version V with
    /// these types" without a graph. The version must fall inside the kernel's
    /// inclusive range, and every queried type-string must be declared by the
    /// kernel and accept the given type.
    pub fn try_find_kernel_by_constraints<S: BuildHasher>(
        &self,
        op_name: &str,
        domain: &str,
        version: i32,
        type_constraints: &HashMap<String, ElementType, S>,
        exec_provider: &str,
    ) -> Result<&KernelCreateInfo> {
        let key = registry_key(op_name, domain, exec_provider);
        let candidates = self.candidates(&key);
        if candidates.is_empty() {
            return Err(KernelError::NoKernelForOp {
                key,
                node: op_name.to_string(),
            });
        }

        let mut matched: SmallVec<[&KernelCreateInfo; 1]> = SmallVec::new();
        let mut reasons = Vec::new();
        for candidate in candidates {
            let kernel_def = candidate.kernel_def();
            let (start, end) = kernel_def.since_version();
            if version < start || version > end {
                reasons.push(format!(
                    "kernel {:#018x}: version {} outside [{}, {}]",
                    kernel_def.hash(),
                    version,
                    start,
                    end
                ));
                continue;
            }
            let mismatch = type_constraints.iter().find(|(type_str, ty)| {
                kernel_def
                    .type_constraint(type_str)
                    .map_or(true, |accepted| !accepted.contains(ty))
            });
            match mismatch {
                None => matched.push(candidate),
                Some((type_str, ty)) => reasons.push(format!(
                    "kernel {:#018x}: {} is {}, not accepted",
                    kernel_def.hash(),
                    type_str,
                    ty
                )),
            }
        }

        let op_id = OpIdentifier::new(domain, op_name, version);
        self.select_unique(matched, op_name, op_id, exec_provider, reasons)
    }

    fn select_unique<'a>(
        &'a self,
        matched: SmallVec<[&'a KernelCreateInfo; 1]>,
        node: &str,
        op: OpIdentifier,
        exec_provider: &str,
        reasons: Vec<String>,
    ) -> Result<&'a KernelCreateInfo> {
        match matched.as_slice() {
            [] => Err(KernelError::NoMatchingKernel {
                node: node.to_string(),
                op,
                provider: exec_provider.to_string(),
                reasons: reasons.join("; "),
            }),
            [only] => {
                debug!(node, op = %op, hash = only.kernel_def().hash(), "Matched kernel");
                Ok(*only)
            }
            many => {
                let hashes: Vec<_> = many.iter().map(|c| c.kernel_def().hash()).collect();
                error!(node, op = %op, ?hashes, "Multiple kernels match node");
                Err(KernelError::AmbiguousKernel {
                    node: node.to_string(),
                    op,
                    provider: exec_provider.to_string(),
                    count: many.len(),
                    hashes,
                })
            }
        }
    }

    /// Whether some kernel in this registry can run `node` on `exec_provider`
    pub fn has_implementation_of(
        &self,
        node: &dyn Node,
        exec_provider: &str,
        resolver: &KernelTypeStrResolver,
    ) -> bool {
        self.try_find_kernel(node, exec_provider, resolver).is_ok()
    }

    /// Find the kernel for `node` and instantiate it
    ///
    /// The kernel is looked up for the provider of `execution_provider`. The
    /// returned instance belongs to the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn try_create_kernel(
        &self,
        node: &dyn Node,
        execution_provider: &dyn ExecutionProvider,
        constant_initialized_tensors: &ConstantTensors,
        value_name_idx_map: &ValueNameIdxMap,
        funcs_mgr: &mut FuncManager,
        data_transfer_mgr: &DataTransferManager,
        resolver: &KernelTypeStrResolver,
    ) -> Result<Box<dyn OpKernel>> {
        let create_info = self.try_find_kernel(node, execution_provider.provider_type(), resolver)?;
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
