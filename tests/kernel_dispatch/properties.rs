//! Registry and resolver properties
//!
//! Idempotent bindings, injective hash index, selection exclusivity, provider
//! gating, and agreement between schema-aware and hash-only lookups.

use super::*;
use proptest::prelude::*;
use proptest::sample::subsequence;

// =============================================================================
// IDEMPOTENT BINDING
// =============================================================================

#[test]
fn test_rebinding_leaves_resolver_unchanged() {
    let mut resolver = resolver();
    let op = clip_schema().op_id();
    let before: Vec<ArgTypeAndIndex> = resolver.resolve_kernel_type_str(&op, "T").unwrap().to_vec();
    let ops_before = resolver.len();

    let added = resolver
        .register(op.clone(), "T", [ArgTypeAndIndex::input(0)])
        .unwrap();
    assert!(!added);
    assert!(!resolver.register_op_schema(&clip_schema()).unwrap());

    assert_eq!(resolver.len(), ops_before);
    assert_eq!(resolver.resolve_kernel_type_str(&op, "T").unwrap(), before.as_slice());
}

// =============================================================================
// HASH INDEX
// =============================================================================

#[test]
fn test_duplicate_hash_rejected() {
    let mut registry = KernelRegistry::new();
    registry
        .register(clip_def("CPU", ElementType::Float), test_factory())
        .unwrap();

    let err = registry
        .register(clip_def("CPU", ElementType::Float), test_factory())
        .unwrap_err();
    assert!(matches!(err, KernelError::DuplicateHash { .. }));
    assert!(err.is_configuration_defect());
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_aliased_domain_is_same_kernel() {
    let mut registry = KernelRegistry::new();
    registry
        .register(clip_def("CPU", ElementType::Float), test_factory())
        .unwrap();

    let aliased = KernelDef::builder()
        .set_name("Clip")
        .set_domain("ai.onnx")
        .since_version(13)
        .provider("CPU")
        .type_constraint("T", [ElementType::Float])
        .build();
    let err = registry.register(aliased, test_factory()).unwrap_err();
    assert!(matches!(err, KernelError::DuplicateHash { .. }));
}

#[test]
fn test_overlapping_kernel_rejected() {
    let mut registry = KernelRegistry::new();
    registry
        .register(clip_def("CPU", ElementType::Float), test_factory())
        .unwrap();

    let wider = KernelDef::builder()
        .set_name("Clip")
        .since_version(13)
        .provider("CPU")
        .type_constraint("T", [ElementType::Float, ElementType::Double])
        .build();
    let err = registry.register(wider, test_factory()).unwrap_err();
    assert!(matches!(err, KernelError::ConflictingKernel { start: 13, .. }));
}

#[test]
fn test_distinct_hashes_all_retrievable() {
    let mut registry = KernelRegistry::new();
    let defs: Vec<KernelDef> = [ElementType::Float, ElementType::Int32, ElementType::Int64]
        .into_iter()
        .map(|ty| clip_def("CPU", ty))
        .collect();
    let hashes: Vec<u64> = defs.iter().map(KernelDef::hash).collect();
    for def in defs {
        registry.register(def, test_factory()).unwrap();
    }

    for hash in hashes {
        let found = registry.try_find_kernel_by_hash(hash).unwrap();
        assert_eq!(found.kernel_def().hash(), hash);
    }
}

// =============================================================================
// EXCLUSIVITY
// =============================================================================

#[test]
fn test_identical_constraints_are_ambiguous() {
    let mut registry = KernelRegistry::new();
    registry
        .register(clip_def("CPU", ElementType::Float), test_factory())
        .unwrap();
    let inplace = KernelDef::builder()
        .set_name("Clip")
        .since_version(13)
        .provider("CPU")
        .type_constraint("T", [ElementType::Float])
        .may_inplace(0, 0)
        .build();
    registry.register(inplace, test_factory()).unwrap();

    let err = registry
        .try_find_kernel(&clip_node(ElementType::Float), "CPU", &resolver())
        .unwrap_err();
    assert!(matches!(err, KernelError::AmbiguousKernel { count: 2, .. }));
    assert!(err.is_configuration_defect());
}

proptest! {
    #[test]
    fn prop_disjoint_kernels_match_at_most_once(
        registered in subsequence(ElementType::ALL.to_vec(), 1..=ElementType::ALL.len()),
        query_idx in 0..ElementType::ALL.len(),
    ) {
        let mut registry = KernelRegistry::new();
        for ty in &registered {
            registry.register(clip_def("CPU", *ty), test_factory()).unwrap();
        }
        let resolver = resolver();
        let query = ElementType::ALL[query_idx];

        let result = registry.try_find_kernel(&clip_node(query), "CPU", &resolver);
        if registered.contains(&query) {
            let found = result.unwrap();
            let expected = [query];
            prop_assert_eq!(found.kernel_def().type_constraint("T"), Some(&expected[..]));
        } else {
            let is_no_match = matches!(result, Err(KernelError::NoMatchingKernel { .. }));
            prop_assert!(is_no_match);
        }
    }
}

// =============================================================================
// PROVIDER GATING
// =============================================================================

#[test]
fn test_node_assigned_elsewhere_never_matches() {
    let mut registry = KernelRegistry::new();
    registry
        .register(clip_def("CPU", ElementType::Float), test_factory())
        .unwrap();
    let resolver = resolver();

    let node = clip_node(ElementType::Float).with_provider("GPU");
    let err = registry.try_find_kernel(&node, "CPU", &resolver).unwrap_err();
    assert!(matches!(err, KernelError::NoMatchingKernel { .. }));
    assert!(!registry.has_implementation_of(&node, "CPU", &resolver));

    let unassigned = clip_node(ElementType::Float);
    assert!(registry.has_implementation_of(&unassigned, "CPU", &resolver));
}

// =============================================================================
// HASH-PATH EQUIVALENCE
// =============================================================================

#[test]
fn test_hash_lookup_returns_schema_match() {
    let mut registry = KernelRegistry::new();
    for ty in [ElementType::Float, ElementType::Double, ElementType::Int64] {
        registry.register(clip_def("CPU", ty), test_factory()).unwrap();
    }
    let resolver = resolver();

    for ty in [ElementType::Float, ElementType::Double, ElementType::Int64] {
        let node = clip_node(ty);
        let by_schema = registry.try_find_kernel(&node, "CPU", &resolver).unwrap();
        let by_hash = registry
            .try_find_kernel_by_hash(by_schema.kernel_def().hash())
            .unwrap();
        assert!(std::ptr::eq(by_schema, by_hash));
    }
}
