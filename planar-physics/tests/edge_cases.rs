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
//! Edge case tests for world bookkeeping, validation and degenerate bodies

use planar_physics::{BodyDef, BodyHandle, PhysicsError, Vec2, WeldJoint, World};

const DT: f64 = 1.0 / 60.0;

fn hanging_pair() -> (World, BodyHandle, BodyHandle) {
    let mut world = World::new(Vec2::new(0.0, -9.8));
    let ground = world.create_body(&BodyDef::fixed()).unwrap();
    let body = world
        .create_body(&BodyDef::dynamic().with_position(Vec2::new(0.0, -1.0)))
        .unwrap();
    (world, ground, body)
}

#[test]
fn test_invalid_time_step_leaves_world_untouched() {
    let (mut world, ground, body) = hanging_pair();
    world
        .add_joint(WeldJoint::from_world_anchor(&world, ground, body, Vec2::ZERO).unwrap())
        .unwrap();
    world
        .push_contact(Box::new(WeldJoint::new(ground, body, Vec2::ZERO, Vec2::new(0.0, 1.0))))
        .unwrap();
    world.body_mut(body).unwrap().apply_force(Vec2::new(1.0, 0.0));

    for dt in [0.0, -DT, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = world.step(dt).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidTimeStep(_)), "dt = {}", dt);
    }

    assert_eq!(world.step_count(), 0);
    assert_eq!(world.time(), 0.0);
    assert_eq!(world.pending_contact_count(), 1);
    let state = world.body(body).unwrap();
    assert_eq!(state.position(), Vec2::new(0.0, -1.0));
    assert_eq!(state.linear_velocity(), Vec2::ZERO);
    assert_eq!(state.force(), Vec2::new(1.0, 0.0));
}

#[test]
fn test_stale_body_handle() {
    let (mut world, ground, body) = hanging_pair();
    world.destroy_body(body).unwrap();

    assert!(!world.contains_body(body));
    assert!(matches!(world.body(body), Err(PhysicsError::StaleBody(_))));
    assert!(matches!(world.destroy_body(body), Err(PhysicsError::StaleBody(_))));

    let err = world
        .add_joint(WeldJoint::new(ground, body, Vec2::ZERO, Vec2::ZERO))
        .unwrap_err();
    assert!(matches!(err, PhysicsError::StaleBody(_)));
    assert!(WeldJoint::from_world_anchor(&world, ground, body, Vec2::ZERO).is_err());

    // A new body may reuse the slot, but the old handle stays stale
    let replacement = world.create_body(&BodyDef::dynamic()).unwrap();
    assert_eq!(replacement.index(), body.index());
    assert_ne!(replacement, body);
    assert!(world.body(body).is_err());
    assert!(world.body(replacement).is_ok());
}

#[test]
fn test_stale_joint_handle() {
    let (mut world, ground, body) = hanging_pair();
    let joint = world
        .add_joint(WeldJoint::from_world_anchor(&world, ground, body, Vec2::ZERO).unwrap())
        .unwrap();
    world.destroy_joint(joint).unwrap();

    assert!(matches!(world.joint(joint), Err(PhysicsError::StaleJoint(_))));
    assert!(matches!(world.destroy_joint(joint), Err(PhysicsError::StaleJoint(_))));
    assert!(world.set_joint_enabled(joint, false).is_err());
    assert!(world.joint_reaction_force(joint).is_err());
    assert!(world.joint_as::<WeldJoint>(joint).is_none());
}

#[test]
fn test_joint_to_same_body_rejected() {
    let (mut world, _, body) = hanging_pair();
    let err = world
        .add_joint(WeldJoint::new(body, body, Vec2::ZERO, Vec2::ZERO))
        .unwrap_err();
    assert!(matches!(err, PhysicsError::SameBody(_)));
    assert_eq!(world.joint_count(), 0);
}

#[test]
fn test_immovable_pairs_rejected() {
    let mut world = World::default();
    let ground = world.create_body(&BodyDef::fixed()).unwrap();
    let wall = world
        .create_body(&BodyDef::fixed().with_position(Vec2::new(5.0, 0.0)))
        .unwrap();
    let platform = world
        .create_body(&BodyDef::kinematic().with_velocity(Vec2::new(1.0, 0.0), 0.0))
        .unwrap();

    for (a, b) in [(ground, wall), (ground, platform), (platform, wall)] {
        let err = world
            .add_joint(WeldJoint::new(a, b, Vec2::ZERO, Vec2::ZERO))
            .unwrap_err();
        assert!(matches!(err, PhysicsError::DegenerateMass(_, _)));

        let err = world
            .push_contact(Box::new(WeldJoint::new(a, b, Vec2::ZERO, Vec2::ZERO)))
            .unwrap_err();
        assert!(matches!(err, PhysicsError::DegenerateMass(_, _)));
    }
    assert_eq!(world.joint_count(), 0);
    assert_eq!(world.pending_contact_count(), 0);
}

#[test]
fn test_invalid_body_definitions_rejected() {
    let mut world = World::default();

    let massless = BodyDef::dynamic().with_mass(0.0, 1.0);
    assert!(matches!(
        world.create_body(&massless),
        Err(PhysicsError::InvalidBodyDef(_))
    ));

    let negative_inertia = BodyDef::dynamic().with_mass(1.0, -1.0);
    assert!(world.create_body(&negative_inertia).is_err());

    let nowhere = BodyDef::dynamic().with_position(Vec2::new(f64::NAN, 0.0));
    assert!(world.create_body(&nowhere).is_err());

    let damped = BodyDef::dynamic().with_damping(-0.1, 0.0);
    assert!(world.create_body(&damped).is_err());

    assert_eq!(world.body_count(), 0);

    // Static bodies ignore mass entirely
    assert!(world.create_body(&BodyDef::fixed().with_mass(0.0, 0.0)).is_ok());
}

#[test]
fn test_destroy_body_removes_attached_constraints() {
    let (mut world, ground, body) = hanging_pair();
    let other = world
        .create_body(&BodyDef::dynamic().with_position(Vec2::new(2.0, -1.0)))
        .unwrap();

    world
        .add_joint(WeldJoint::from_world_anchor(&world, ground, body, Vec2::ZERO).unwrap())
        .unwrap();
    let kept = world
        .add_joint(WeldJoint::from_world_anchor(&world, ground, other, Vec2::new(2.0, 0.0)).unwrap())
        .unwrap();
    world
        .push_contact(Box::new(WeldJoint::new(body, other, Vec2::ZERO, Vec2::ZERO)))
        .unwrap();

    world.destroy_body(body).unwrap();

    assert_eq!(world.joint_count(), 1);
    assert!(world.joint(kept).is_ok());
    assert_eq!(world.pending_contact_count(), 0);
    assert_eq!(world.body_count(), 2);

    // The remaining scene still steps
    let report = world.step(DT).unwrap();
    assert_eq!(report.constraint_count, 1);
}

#[test]
fn test_contacts_last_one_step() {
    let (mut world, ground, body) = hanging_pair();
    world
        .push_contact(Box::new(
            WeldJoint::from_world_anchor(&world, ground, body, Vec2::new(0.0, -1.0)).unwrap(),
        ))
        .unwrap();

    let report = world.step(DT).unwrap();
    assert_eq!(report.constraint_count, 1);
    assert_eq!(world.pending_contact_count(), 0);
    // Held in place for the first step only
    assert!(world.body(body).unwrap().linear_velocity().length() < 1e-12);

    let report = world.step(DT).unwrap();
    assert_eq!(report.constraint_count, 0);
    assert!(world.body(body).unwrap().linear_velocity().y < 0.0);
}

#[test]
fn test_disabled_joint_is_not_solved() {
    let (mut world, ground, body) = hanging_pair();
    let joint = world
        .add_joint(WeldJoint::from_world_anchor(&world, ground, body, Vec2::ZERO).unwrap())
        .unwrap();
    world.set_joint_enabled(joint, false).unwrap();

    let report = world.step(DT).unwrap();
    assert_eq!(report.constraint_count, 0);
    assert!(world.body(body).unwrap().position().y < -1.0);
    assert!(!world.is_joint_enabled(joint).unwrap());
}

#[test]
fn test_invalid_breakpoint_rejected() {
    let (mut world, ground, body) = hanging_pair();
    let joint = world
        .add_joint(WeldJoint::from_world_anchor(&world, ground, body, Vec2::ZERO).unwrap())
        .unwrap();

    for breakpoint in [0.0, -1.0, f64::NAN] {
        assert!(matches!(
            world.set_joint_breakpoint(joint, breakpoint),
            Err(PhysicsError::InvalidSettings(_))
        ));
    }
    assert_eq!(world.joint_breakpoint(joint).unwrap(), f64::INFINITY);
}

#[test]
fn test_fixed_rotation_body_welded_to_ground() {
    let mut world = World::new(Vec2::new(0.0, -9.8));
    let ground = world.create_body(&BodyDef::fixed()).unwrap();
    let slider = world
        .create_body(
            &BodyDef::dynamic()
                .with_position(Vec2::new(1.0, 0.0))
                .with_fixed_rotation(true),
        )
        .unwrap();
    assert_eq!(world.body(slider).unwrap().inv_inertia(), 0.0);

    // Angular rows vanish from the mass matrix; the linear block still holds
    world
        .add_joint(WeldJoint::from_world_anchor(&world, ground, slider, Vec2::ZERO).unwrap())
        .unwrap();
    for _ in 0..60 {
        world.step(DT).unwrap();
    }

    let state = world.body(slider).unwrap();
    assert!(state.is_valid());
    assert!((state.position() - Vec2::new(1.0, 0.0)).length() < 0.01);
    assert_eq!(state.angle(), 0.0);
}

#[test]
fn test_kinematic_body_drags_welded_body() {
    let mut world = World::default();
    let carrier = world
        .create_body(&BodyDef::kinematic().with_velocity(Vec2::new(1.0, 0.0), 0.0))
        .unwrap();
    let load = world
        .create_body(&BodyDef::dynamic().with_position(Vec2::new(0.0, -1.0)))
        .unwrap();
    world
        .add_joint(WeldJoint::from_world_anchor(&world, carrier, load, Vec2::ZERO).unwrap())
        .unwrap();

    for _ in 0..60 {
        world.step(DT).unwrap();
    }

    let carrier_state = world.body(carrier).unwrap();
    assert!((carrier_state.position().x - 1.0).abs() < 1e-9);
    assert_eq!(carrier_state.linear_velocity(), Vec2::new(1.0, 0.0));

    let load_state = world.body(load).unwrap();
    assert!((load_state.position() - Vec2::new(1.0, -1.0)).length() < 0.01);
    assert!((load_state.linear_velocity().x - 1.0).abs() < 1e-6);
}

#[test]
fn test_empty_world_steps() {
    let mut world = World::default();
    let report = world.step(DT).unwrap();
    assert_eq!(report.island_count, 0);
    assert_eq!(report.constraint_count, 0);
    assert!(report.position_converged);
    assert_eq!(world.step_count(), 1);
}
