// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Benchmarks for memory pooling performance
//!
//! Measures the impact of buffer pooling on allocation churn for island
//! scratch data and on whole-world step times.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use planar_physics::pool::{BufferPool, PoolConfig};
use planar_physics::{Body, BodyDef, Vec2, World};

fn sample_bodies(n: usize) -> Vec<Body> {
    (0..n)
        .map(|i| {
            Body::new(&BodyDef::dynamic().with_position(Vec2::new(i as f64, 0.0)))
                .expect("dynamic body definition is valid")
        })
        .collect()
}

fn bench_pooled_vs_fresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("island_buffers");

    for n_bodies in [10, 100, 1000].iter() {
        let bodies = sample_bodies(*n_bodies);

        group.bench_with_input(BenchmarkId::new("fresh_vec", n_bodies), n_bodies, |b, _| {
            b.iter(|| {
                let mut buffer: Vec<Body> = Vec::new();
                buffer.extend(bodies.iter().cloned());
                black_box(buffer.len())
            });
        });

        group.bench_with_input(BenchmarkId::new("pooled", n_bodies), n_bodies, |b, _| {
            let pool = BufferPool::with_config(PoolConfig::default());
            b.iter(|| {
                let mut buffer = pool.acquire();
                buffer.extend(bodies.iter().cloned());
                black_box(buffer.len())
            });
        });

        group.bench_with_input(
            BenchmarkId::new("pooled_large_capacity", n_bodies),
            n_bodies,
            |b, &n| {
                // Larger initial capacity to avoid early resizes
                let pool = BufferPool::with_config(PoolConfig::new(n, 16));
                b.iter(|| {
                    let mut buffer = pool.acquire();
                    buffer.extend(bodies.iter().cloned());
                    black_box(buffer.len())
                });
            },
        );
    }

    group.finish();
}

fn bench_step_with_stats_check(c: &mut Criterion) {
    let mut world = World::new(Vec2::new(0.0, -9.8));
    for i in 0..100 {
        world
            .create_body(&BodyDef::dynamic().with_position(Vec2::new(i as f64, 0.0)))
            .expect("dynamic body definition is valid");
    }

    c.bench_function("step_with_stats_check", |b| {
        b.iter(|| {
            world.step(1.0 / 60.0).expect("valid time step");
            // Check stats after stepping
            black_box(world.pool_stats());
        });
    });
}

criterion_group!(benches, bench_pooled_vs_fresh, bench_step_with_stats_check);
criterion_main!(benches);
