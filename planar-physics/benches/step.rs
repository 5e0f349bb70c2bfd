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
//! Benchmarks for world stepping
//!
//! These benchmarks measure:
//! - Step throughput for weld chains of increasing length
//! - Sequential versus parallel island solving for many independent chains
//! - The cost of the weld velocity solve in isolation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use planar_physics::{
    Body, BodyDef, BodyHandle, BodyPair, Constraint, Settings, TimeStep, Vec2, WeldJoint, World,
};

const DT: f64 = 1.0 / 60.0;

/// Build `chains` independent chains of `links` welded boxes hanging off a
/// shared static ground
fn weld_chains(chains: usize, links: usize, settings: Settings) -> World {
    let mut world = World::with_settings(Vec2::new(0.0, -9.8), settings)
        .expect("benchmark settings are valid");
    let ground = world
        .create_body(&BodyDef::fixed())
        .expect("static body definition is valid");

    for chain in 0..chains {
        let x = chain as f64 * 2.0;
        let mut previous = ground;
        for link in 0..links {
            let body = world
                .create_body(&BodyDef::dynamic().with_position(Vec2::new(x, -(link as f64) - 0.5)))
                .expect("dynamic body definition is valid");
            let weld = WeldJoint::from_world_anchor(
                &world,
                previous,
                body,
                Vec2::new(x, -(link as f64)),
            )
            .expect("both bodies exist");
            world.add_joint(weld).expect("weld links a dynamic body");
            previous = body;
        }
    }
    world
}

fn bench_chain_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("weld_chain_step");

    for links in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*links as u64));
        group.bench_with_input(BenchmarkId::from_parameter(links), links, |b, &n| {
            let mut world = weld_chains(1, n, Settings::default());
            b.iter(|| black_box(world.step(DT).expect("valid time step")));
        });
    }

    group.finish();
}

fn bench_island_parallelism(c: &mut Criterion) {
    let mut group = c.benchmark_group("islands");

    for chains in [4, 64].iter() {
        group.bench_with_input(BenchmarkId::new("sequential", chains), chains, |b, &n| {
            let mut world = weld_chains(n, 20, Settings::default().with_parallel_islands(false));
            b.iter(|| black_box(world.step(DT).expect("valid time step")));
        });

        group.bench_with_input(BenchmarkId::new("parallel", chains), chains, |b, &n| {
            let mut world = weld_chains(n, 20, Settings::default().with_parallel_islands(true));
            b.iter(|| black_box(world.step(DT).expect("valid time step")));
        });
    }

    group.finish();
}

fn bench_weld_velocity_solve(c: &mut Criterion) {
    let settings = Settings::default();
    let step = TimeStep::new(DT, 1.0 / DT, &settings).expect("valid time step");
    let mut a = Body::new(&BodyDef::dynamic().with_velocity(Vec2::new(1.0, 0.0), 0.5))
        .expect("dynamic body definition is valid");
    let mut b = Body::new(&BodyDef::dynamic().with_position(Vec2::new(1.0, 0.0)))
        .expect("dynamic body definition is valid");
    let mut joint = WeldJoint::new(
        BodyHandle::new(0, 0),
        BodyHandle::new(1, 0),
        Vec2::new(0.5, 0.0),
        Vec2::new(-0.5, 0.0),
    );
    joint.init_velocity_constraints(BodyPair::new(&mut a, &mut b), &step);

    c.bench_function("weld_solve_velocity", |bencher| {
        bencher.iter(|| {
            joint.solve_velocity_constraints(BodyPair::new(&mut a, &mut b), black_box(&step));
        });
    });
}

criterion_group!(
    benches,
    bench_chain_length,
    bench_island_parallelism,
    bench_weld_velocity_solve,
);
criterion_main!(benches);
