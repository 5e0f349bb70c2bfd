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
//! Welded Cantilever Example
//!
//! A horizontal beam of boxes welded end to end and to a static wall, sagging
//! under gravity. It showcases:
//!
//! - Weld joints built from world-space anchors
//! - Warm starting and position correction holding a long chain rigid
//! - Reaction forces at the wall
//! - Breakable joints, when a breakpoint is given
//!
//! # Running
//!
//! ```bash
//! # Run with default settings (10 links, 5 seconds)
//! cargo run --example weld_chain --release
//!
//! # Longer beam, more solver passes
//! cargo run --example weld_chain --release -- --links 30 --iterations 20
//!
//! # Let the wall weld break above 200 N
//! cargo run --example weld_chain --release -- --breakpoint 200
//! ```

use planar_physics::{BodyDef, BodyHandle, JointHandle, Settings, Vec2, WeldJoint, World};

/// Simulation configuration
struct SimulationConfig {
    links: usize,
    velocity_iterations: usize,
    duration: f64,
    timestep: f64,
    breakpoint: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            links: 10,
            velocity_iterations: 8,
            duration: 5.0,
            timestep: 1.0 / 60.0,
            breakpoint: None,
        }
    }
}

fn parse_args() -> SimulationConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = SimulationConfig::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--links", Some(v)) => match v.parse() {
                Ok(n) if n > 0 => config.links = n,
                _ => eprintln!("Warning: Invalid link count '{}', using {}", v, config.links),
            },
            ("--iterations", Some(v)) => match v.parse() {
                Ok(n) if n > 0 => config.velocity_iterations = n,
                _ => eprintln!(
                    "Warning: Invalid iteration count '{}', using {}",
                    v, config.velocity_iterations
                ),
            },
            ("--seconds", Some(v)) => match v.parse() {
                Ok(s) if s > 0.0 => config.duration = s,
                _ => eprintln!("Warning: Invalid duration '{}', using {} s", v, config.duration),
            },
            ("--breakpoint", Some(v)) => match v.parse() {
                Ok(f) if f > 0.0 => config.breakpoint = Some(f),
                _ => eprintln!("Warning: Invalid breakpoint '{}', ignoring", v),
            },
            (flag, None) if flag.starts_with("--") => {
                eprintln!("Error: {} requires an argument", flag);
                std::process::exit(1);
            }
            _ => {}
        }
        i += 2;
    }
    config
}

/// Build the beam; returns the links in order and the wall weld
fn build_beam(world: &mut World, links: usize) -> planar_physics::Result<(Vec<BodyHandle>, JointHandle)> {
    let wall = world.create_body(&BodyDef::fixed())?;
    let mut bodies = Vec::with_capacity(links);
    let mut wall_joint = None;
    let mut previous = wall;

    for i in 0..links {
        let x = i as f64 + 0.5;
        let body = world.create_body(
            &BodyDef::dynamic()
                .with_position(Vec2::new(x, 0.0))
                .with_mass(1.0, 1.0 / 6.0),
        )?;
        let weld = WeldJoint::from_world_anchor(world, previous, body, Vec2::new(i as f64, 0.0))?;
        let handle = world.add_joint(weld)?;
        if wall_joint.is_none() {
            wall_joint = Some(handle);
        }
        bodies.push(body);
        previous = body;
    }

    match wall_joint {
        Some(joint) => Ok((bodies, joint)),
        None => Err(planar_physics::PhysicsError::InvalidSettings(
            "beam needs at least one link".to_string(),
        )),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    use simplelog::LevelFilter::{Info, Off};
    simplelog::TermLogger::init(
        Info,
        simplelog::ConfigBuilder::new()
            .set_target_level(Off)
            .set_location_level(Off)
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    println!("==========================================================");
    println!("       Welded Cantilever");
    println!("==========================================================");
    println!();

    let config = parse_args();
    println!("Simulation Configuration:");
    println!("  Links: {}", config.links);
    println!("  Velocity iterations: {}", config.velocity_iterations);
    println!("  Timestep: {:.4} s", config.timestep);
    println!("  Duration: {:.1} s", config.duration);
    match config.breakpoint {
        Some(f) => println!("  Wall breakpoint: {:.1} N", f),
        None => println!("  Wall breakpoint: unbreakable"),
    }
    println!();

    let settings = Settings::default().with_velocity_iterations(config.velocity_iterations);
    let mut world = World::with_settings(Vec2::new(0.0, -9.8), settings)?;
    let (links, wall_joint) = build_beam(&mut world, config.links)?;
    if let Some(breakpoint) = config.breakpoint {
        world.set_joint_breakpoint(wall_joint, breakpoint)?;
    }

    let tip = links[links.len() - 1];
    let steps = (config.duration / config.timestep).round() as usize;
    let report_every = (steps / 10).max(1);

    println!(
        "{:>8} {:>12} {:>12} {:>14} {:>10}",
        "time", "tip y", "tip angle", "wall force", "pos iters"
    );
    for step in 1..=steps {
        let report = world.step(config.timestep)?;
        for broken in &report.broken_joints {
            println!("  t = {:.3} s: {} broke", world.time(), broken);
        }

        if step % report_every == 0 || step == steps {
            let tip_body = world.body(tip)?;
            let wall_force = if world.is_joint_enabled(wall_joint)? {
                world.joint_reaction_force(wall_joint)?.length()
            } else {
                0.0
            };
            println!(
                "{:>8.3} {:>12.5} {:>12.5} {:>14.3} {:>10}",
                world.time(),
                tip_body.position().y,
                tip_body.angle(),
                wall_force,
                report.position_iterations
            );
        }
    }

    println!();
    println!("Final state:");
    println!("  Total kinetic energy: {:.6} J", world.total_kinetic_energy());
    let stats = world.pool_stats();
    println!(
        "  Island buffer pool: {} hits, {} misses ({:.1}% hit rate)",
        stats.hits,
        stats.misses,
        stats.hit_rate()
    );
    Ok(())
}
