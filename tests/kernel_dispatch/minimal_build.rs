//! Full build then minimal build replay
//!
//! A full build matches every node against kernel constraints and stores the
//! chosen definition hash on the node. A minimal build has no schemas; it
//! replays those hashes through `HashKernelLookup`.

use super::*;

struct Model {
    nodes: Vec<GraphNode>,
}

fn model() -> Model {
    Model {
        nodes: vec![
            GraphNode::new("clip_f", "Clip", "", 13)
                .input(ElementType::Float)
                .output(ElementType::Float),
            GraphNode::new("clip_i", "Clip", "", 13)
                .input(ElementType::Int64)
                .missing_input()
                .input(ElementType::Int64)
                .output(ElementType::Int64),
            GraphNode::new("relu", "Relu", "", 14)
                .input(ElementType::Double)
                .output(ElementType::Double),
        ],
    }
}

fn provider_registry() -> KernelRegistry {
    let mut registry = KernelRegistry::new();
    registry
        .register(clip_def("CPU", ElementType::Float), test_factory())
        .unwrap();
    registry
        .register(clip_def("CPU", ElementType::Int64), test_factory())
        .unwrap();
    let relu = KernelDef::builder()
        .set_name("Relu")
        .since_version(14)
        .provider("CPU")
        .type_constraint("T", [ElementType::Float, ElementType::Double])
        .build();
    registry.register(relu, test_factory()).unwrap();
    registry
}

/// Match every node with the schema lookup and bake the result in
fn full_build(registry: &KernelRegistry, model: &mut Model) -> Vec<u64> {
    let resolver = resolver();
    let config = DispatchConfig::default();
    let lookup = build_kernel_lookup(&config, registry, Some(&resolver)).unwrap();
    assert_eq!(lookup.mode(), LookupMode::Schema);

    let mut hashes = Vec::new();
    for node in &mut model.nodes {
        let hash = lookup.find_kernel(&*node, "CPU").unwrap().kernel_def().hash();
        node.set_kernel_def_hash(hash);
        hashes.push(hash);
    }
    hashes
}

#[test]
fn test_hash_replay_finds_same_kernels() {
    let registry = provider_registry();
    let mut model = model();
    let baked = full_build(&registry, &mut model);

    let config = DispatchConfig::from_toml_str("lookup_mode = \"hash\"").unwrap();
    let lookup = build_kernel_lookup(&config, &registry, None).unwrap();
    assert_eq!(lookup.mode(), LookupMode::Hash);

    for (node, hash) in model.nodes.iter().zip(&baked) {
        let found = lookup.find_kernel(node, "CPU").unwrap();
        assert_eq!(found.kernel_def().hash(), *hash);
        assert_eq!(found.kernel_def().op_name(), node.op_type());
    }
}

#[test]
fn test_exported_hashes_cover_baked_hashes() {
    let registry = provider_registry();
    let mut model = model();
    let baked = full_build(&registry, &mut model);

    let exported = registry.export_kernel_def_hashes();
    assert_eq!(exported.len(), registry.len());
    for hash in baked {
        assert!(exported.iter().any(|(_, h)| *h == hash));
    }
    let keys: Vec<&str> = exported.iter().map(|(k, _)| k.as_str()).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn test_exported_hashes_persist_as_json() {
    let registry = provider_registry();
    let exported = registry.export_kernel_def_hashes();

    let json = serde_json::to_string_pretty(&exported).unwrap();
    let restored: KernelDefHashes = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, exported);

    for (_, hash) in &restored {
        let found = registry.try_find_kernel_by_hash(*hash).unwrap();
        assert_eq!(found.kernel_def().hash(), *hash);
    }
}

#[test]
fn test_hash_replay_creates_kernels() {
    let registry = provider_registry();
    let mut model = model();
    full_build(&registry, &mut model);

    let lookup = HashKernelLookup::new(&registry);
    let mut ctx = SessionContext::default();
    for node in &model.nodes {
        let kernel = lookup
            .create_kernel(
                node,
                &TestProvider("CPU"),
                &ctx.constants,
                &ctx.names,
                &mut ctx.funcs,
                &ctx.transfers,
            )
            .unwrap();
        let kernel = kernel.as_any().downcast_ref::<TestKernel>().unwrap();
        assert_eq!(kernel.op_type, node.op_type());
        assert_eq!(Some(kernel.kernel_def_hash), node.kernel_def_hash());
        assert_eq!(kernel.provider, "CPU");
    }
}

#[test]
fn test_node_without_baked_hash_fails() {
    let registry = provider_registry();
    let model = model();
    let lookup = HashKernelLookup::new(&registry);

    let err = lookup.find_kernel(&model.nodes[0], "CPU").unwrap_err();
    assert!(matches!(err, KernelError::MissingKernelDefHash(ref name) if name == "clip_f"));
}

#[test]
fn test_stale_hash_not_found() {
    let registry = provider_registry();
    let node = clip_node(ElementType::Float).with_kernel_def_hash(0xdead_beef);
    let err = HashKernelLookup::new(&registry)
        .find_kernel(&node, "CPU")
        .unwrap_err();
    assert!(matches!(err, KernelError::HashNotFound(0xdead_beef)));
}

#[test]
fn test_schema_mode_without_resolver_is_config_error() {
    let registry = provider_registry();
    let config = DispatchConfig::from_toml_str(DispatchConfig::default_toml()).unwrap();
    let err = build_kernel_lookup(&config, &registry, None).err().unwrap();
    assert!(matches!(err, KernelError::Config(_)));
}
