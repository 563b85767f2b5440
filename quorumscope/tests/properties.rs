//! Seeded randomized checks of the dependency-forest metrics.

use quorumscope::{Component, ComponentRegistry, DominanceAnalyzer};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SEEDS: u64 = 64;

/// A random forest where every component may depend on an earlier one, so
/// the result is always acyclic.
fn random_forest(rng: &mut ChaCha8Rng) -> Vec<Component> {
    let count = rng.random_range(1..=12);
    let mut components: Vec<Component> = Vec::with_capacity(count);
    for i in 0..count {
        let latency = f64::from(rng.random_range(1..=200u32));
        let throughput = f64::from(rng.random_range(0..=2000u32));
        let mut component = Component::new(
            format!("c{i}"),
            f64::from(rng.random_range(0..=100u32)),
            f64::from(rng.random_range(1..=16u32)),
            latency,
            throughput,
            90.0,
            u64::from(rng.random_range(1..=500u32)),
        );
        if i > 0 && rng.random_bool(0.7) {
            let parent = rng.random_range(0..i);
            component = component.with_dependency(format!("c{parent}"));
        }
        components.push(component);
    }
    components
}

#[test]
fn test_root_cumulative_latency_is_own_latency() {
    for seed in 0..SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let registry = ComponentRegistry::new(random_forest(&mut rng)).expect("acyclic");
        let analyzer = DominanceAnalyzer::new(&registry);

        for root in registry.roots() {
            let cumulative = analyzer.cumulative_latency(&root.name).expect("registered");
            assert_eq!(cumulative, root.latency_ms, "seed {seed}, root {}", root.name);
        }
    }
}

#[test]
fn test_cumulative_latency_adds_parent_path() {
    for seed in 0..SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let registry = ComponentRegistry::new(random_forest(&mut rng)).expect("acyclic");
        let analyzer = DominanceAnalyzer::new(&registry);

        for component in registry.iter() {
            let Some(parent) = component.dependency.as_deref() else {
                continue;
            };
            let own = analyzer.cumulative_latency(&component.name).expect("registered");
            let upstream = analyzer.cumulative_latency(parent).expect("registered");
            assert_eq!(own, upstream + component.latency_ms, "seed {seed}");
        }
    }
}

#[test]
fn test_downstream_throughput_covers_own_throughput() {
    for seed in 0..SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let registry = ComponentRegistry::new(random_forest(&mut rng)).expect("acyclic");
        let analyzer = DominanceAnalyzer::new(&registry);

        for component in registry.iter() {
            let downstream = analyzer
                .downstream_throughput(&component.name)
                .expect("registered");
            assert!(
                downstream >= component.throughput_mbps,
                "seed {seed}: {} has downstream {downstream} below own {}",
                component.name,
                component.throughput_mbps
            );

            let children: f64 = registry
                .children(&component.name)
                .expect("registered")
                .map(|child| analyzer.downstream_throughput(&child.name).expect("registered"))
                .sum();
            assert_eq!(downstream, component.throughput_mbps + children, "seed {seed}");
        }
    }
}

#[test]
fn test_dominant_is_first_maximum_ratio() {
    for seed in 0..SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let components = random_forest(&mut rng);
        let registry = ComponentRegistry::new(components).expect("acyclic");
        let analyzer = DominanceAnalyzer::new(&registry);

        let report = analyzer.identify_dominant_source().expect("non-empty");
        assert_eq!(report.metrics.len(), registry.len());

        let mut expected = &report.metrics[0];
        for m in &report.metrics[1..] {
            if m.latency_throughput_ratio > expected.latency_throughput_ratio {
                expected = m;
            }
        }
        let expected_name = expected.name.as_str();
        assert_eq!(report.dominant, expected_name, "seed {seed}");

        let again = analyzer.identify_dominant_source().expect("non-empty");
        assert_eq!(again.dominant, report.dominant, "seed {seed}");
    }
}
