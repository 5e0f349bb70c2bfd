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
//! Buoyancy Example
//!
//! Three boxes of different density dropped into a pool of water. It
//! showcases:
//!
//! - A box-shaped fluid container queried through `FluidContainer`
//! - Buoyancy and drag applied by a controller each step
//! - A raft made of two boxes welded together
//!
//! # Running
//!
//! ```bash
//! cargo run --example buoyancy --release
//! ```

use planar_physics::controllers::{AabbFluidContainer, BuoyancyController, FluidProbe};
use planar_physics::{BodyDef, Vec2, WeldJoint, World};

/// Water density in simulation units (mass per unit area)
const WATER_DENSITY: f64 = 1.0;

/// Boxes are 1 x 1
const HALF_EXTENT: f64 = 0.5;

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
    println!("       Buoyancy");
    println!("==========================================================");
    println!();

    let mut world = World::new(Vec2::new(0.0, -9.8));
    let mut buoyancy =
        BuoyancyController::new(AabbFluidContainer::pool(-20.0, 20.0, 0.0, 10.0), WATER_DENSITY)?
            .with_drag(2.0, 0.5)?;

    let materials = [("cork", 0.25, -6.0), ("wood", 0.6, -2.0), ("stone", 2.5, 2.0)];
    let mut boxes = Vec::new();
    for &(name, density, x) in &materials {
        let mass = density * 4.0 * HALF_EXTENT * HALF_EXTENT;
        let handle = world.create_body(
            &BodyDef::dynamic()
                .with_position(Vec2::new(x, 2.0))
                .with_mass(mass, mass / 6.0),
        )?;
        buoyancy.add_body(handle, FluidProbe::rectangle(HALF_EXTENT, HALF_EXTENT, 8));
        boxes.push((name, handle));
        println!("  {:<6} density {:.2}, mass {:.3}", name, density, mass);
    }

    // Two light boxes welded side by side
    let left = world.create_body(
        &BodyDef::dynamic()
            .with_position(Vec2::new(6.0, 1.0))
            .with_mass(0.4, 0.4 / 6.0),
    )?;
    let right = world.create_body(
        &BodyDef::dynamic()
            .with_position(Vec2::new(7.0, 1.0))
            .with_mass(0.4, 0.4 / 6.0),
    )?;
    world.add_joint(WeldJoint::from_world_anchor(&world, left, right, Vec2::new(6.5, 1.0))?)?;
    buoyancy.add_body(left, FluidProbe::rectangle(HALF_EXTENT, HALF_EXTENT, 8));
    buoyancy.add_body(right, FluidProbe::rectangle(HALF_EXTENT, HALF_EXTENT, 8));
    boxes.push(("raft-L", left));
    boxes.push(("raft-R", right));
    println!("  raft   two welded boxes, density 0.40");
    println!();

    world.add_controller(Box::new(buoyancy))?;

    let dt = 1.0 / 60.0;
    print!("{:>6}", "time");
    for (name, _) in &boxes {
        print!(" {:>9}", name);
    }
    println!();

    for step in 1..=600 {
        world.step(dt)?;
        if step % 60 == 0 {
            print!("{:>6.1}", world.time());
            for (_, handle) in &boxes {
                print!(" {:>9.4}", world.body(*handle)?.position().y);
            }
            println!();
        }
    }

    println!();
    println!("Submerged areas after {:.1} s:", world.time());
    if let Some(controller) = world.controller_as::<BuoyancyController>("buoyancy") {
        for (name, handle) in &boxes {
            match controller.submersion(*handle) {
                Some(s) => println!("  {:<6} {:.3}", name, s.area),
                None => println!("  {:<6} dry", name),
            }
        }
    }
    Ok(())
}
