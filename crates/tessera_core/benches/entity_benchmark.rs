//! # Entity Manager Benchmark
//!
//! Entity allocation, component assignment and release cycles.
//!
//! Run with: `cargo bench --package tessera_core --bench entity_benchmark`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::{ComponentRegistry, Entity, EntityManager};

#[derive(Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

fn registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    registry.register::<Position>().unwrap();
    registry.register::<Velocity>().unwrap();
    registry
}

fn bench_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate_entities");

    for count in [10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut manager: EntityManager = EntityManager::new(ComponentRegistry::new());
                for _ in 0..count {
                    black_box(manager.allocate());
                }
                manager.entity_count()
            });
        });
    }

    group.finish();
}

fn bench_assign(c: &mut Criterion) {
    c.bench_function("assign_two_components_10K", |b| {
        b.iter(|| {
            let mut manager: EntityManager = EntityManager::new(registry());
            for i in 0..10_000 {
                let entity = manager.allocate();
                let f = i as f32;
                let _ = manager.assign(entity, Position { x: f, y: f, z: f });
                let _ = manager.assign(entity, Velocity { x: 1.0, y: 0.0, z: 0.0 });
            }
            manager.component_count::<Velocity>()
        });
    });
}

fn bench_integrate(c: &mut Criterion) {
    let mut manager: EntityManager = EntityManager::new(registry());
    let entities: Vec<Entity> = (0..100_000)
        .map(|i| {
            let entity = manager.allocate();
            let f = i as f32;
            let _ = manager.assign(entity, Position { x: f, y: 0.0, z: 0.0 });
            let _ = manager.assign(entity, Velocity { x: 1.0, y: 2.0, z: 3.0 });
            entity
        })
        .collect();

    c.bench_function("integrate_positions_100K", |b| {
        b.iter(|| {
            for &entity in &entities {
                let Some(velocity) = manager.try_get::<Velocity>(entity).copied() else {
                    continue;
                };
                if let Some(position) = manager.try_get_mut::<Position>(entity) {
                    position.x += velocity.x * 0.016;
                    position.y += velocity.y * 0.016;
                    position.z += velocity.z * 0.016;
                }
            }
            black_box(manager.component_count::<Position>())
        });
    });
}

fn bench_release_cycle(c: &mut Criterion) {
    let mut manager: EntityManager = EntityManager::new(registry());
    let mut entities: Vec<Entity> = (0..100_000).map(|_| manager.allocate()).collect();

    c.bench_function("release_allocate_cycle_10K", |b| {
        b.iter(|| {
            for entity in entities.iter_mut().take(10_000) {
                manager.release(*entity);
                *entity = manager.allocate();
                let _ = manager.assign(*entity, Position { x: 0.0, y: 0.0, z: 0.0 });
            }
            black_box(manager.entity_count())
        });
    });
}

criterion_group!(
    benches,
    bench_allocate,
    bench_assign,
    bench_integrate,
    bench_release_cycle,
);
criterion_main!(benches);
