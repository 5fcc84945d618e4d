//! Shared read-only registries across threads
//!
//! After registration a registry and resolver are only read. Sessions on
//! different threads share them behind an `Arc` and must observe identical
//! results.

use super::*;
use std::sync::Barrier;
use std::thread;

const THREADS: usize = 8;
const ITERATIONS: usize = 200;

const TYPES: [ElementType; 4] = [
    ElementType::Float,
    ElementType::Double,
    ElementType::Int32,
    ElementType::Int64,
];

fn shared_registry() -> Arc<KernelRegistry> {
    let mut registry = KernelRegistry::new();
    for ty in TYPES {
        registry.register(clip_def("CPU", ty), test_factory()).unwrap();
    }
    Arc::new(registry)
}

#[test]
fn test_concurrent_lookups_agree() {
    let registry = shared_registry();
    let resolver = Arc::new(resolver());
    let barrier = Arc::new(Barrier::new(THREADS));

    let expected: Vec<u64> = TYPES
        .iter()
        .map(|ty| {
            registry
                .try_find_kernel(&clip_node(*ty), "CPU", &resolver)
                .unwrap()
                .kernel_def()
                .hash()
        })
        .collect();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let resolver = Arc::clone(&resolver);
            let barrier = Arc::clone(&barrier);
            let expected = expected.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..ITERATIONS {
                    let idx = (t + i) % TYPES.len();
                    let found = registry
                        .try_find_kernel(&clip_node(TYPES[idx]), "CPU", &resolver)
                        .unwrap();
                    assert_eq!(found.kernel_def().hash(), expected[idx]);

                    let by_hash = registry.try_find_kernel_by_hash(expected[idx]).unwrap();
                    assert!(std::ptr::eq(found, by_hash));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_kernel_creation() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut registry = KernelRegistry::new();
    registry
        .register(
            clip_def("CPU", ElementType::Float),
            counting_factory(Arc::clone(&counter)),
        )
        .unwrap();
    let registry = Arc::new(registry);
    let resolver = Arc::new(resolver());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let resolver = Arc::clone(&resolver);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut ctx = SessionContext::default();
                let lookup = SchemaKernelLookup::new(&registry, &resolver);
                barrier.wait();
                for _ in 0..ITERATIONS {
                    let kernel = lookup
                        .create_kernel(
                            &clip_node(ElementType::Float),
                            &TestProvider("CPU"),
                            &ctx.constants,
                            &ctx.names,
                            &mut ctx.funcs,
                            &ctx.transfers,
                        )
                        .unwrap();
                    assert_eq!(kernel.op_type(), "Clip");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), THREADS * ITERATIONS);
}
