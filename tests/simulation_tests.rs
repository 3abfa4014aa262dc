//! End-to-end tests: configuration in, simulation steps, snapshot out.
//!
//! These drive the public API the same way the viewer does, minus the GPU.

use glam::{DVec3, Vec3, Vec4};
use horizon::camera::FixedCamera;
use horizon::config::{Config, ObjectConfig};
use horizon::constants::MAX_BODIES;
use horizon::snapshot::Tier;
use horizon::{Body, CentralMass, IntegrationScheme, SceneSnapshotMarshaler, Simulation};

fn star_and_planet() -> Simulation {
    let mut sim = Simulation::new(CentralMass::default())
        .with_gravity(true)
        .with_scheme(IntegrationScheme::Rk4);
    sim.add_body(Body::new("Star", DVec3::new(4e11, 0.0, 0.0), 1.989e30, 4e10))
        .unwrap();
    sim.add_body(Body::new("Planet", DVec3::new(0.0, 0.0, 4e11), 5.972e24, 4e10))
        .unwrap();
    sim
}

// ============================================================================
// Simulation scenarios
// ============================================================================

#[test]
fn test_single_rk4_step_moves_both_bodies() {
    let mut sim = star_and_planet();
    let start: Vec<DVec3> = sim.bodies().iter().map(|b| b.position()).collect();

    let report = sim.step(1.0 / 60.0);

    assert!(report.is_empty());
    assert_eq!(sim.bodies().len(), 2);
    assert_eq!(sim.steps(), 1);
    for (body, start) in sim.bodies().iter().zip(&start) {
        let moved = body.position().distance(*start);
        assert!(moved.is_finite());
        assert!(moved > 0.0, "{} did not move", body.name());
    }
}

#[test]
fn test_star_and_planet_fall_inward() {
    let mut sim = star_and_planet();
    let start: Vec<DVec3> = sim.bodies().iter().map(|b| b.position()).collect();

    for _ in 0..60 {
        sim.step(1.0 / 60.0);
    }

    assert_eq!(sim.bodies().len(), 2);
    for (body, start) in sim.bodies().iter().zip(&start) {
        let moved = body.position().distance(*start);
        assert!(moved.is_finite());
        assert!(moved > 0.0, "{} did not move", body.name());
        // Pulled toward the hole at the origin
        assert!(body.position().length() < start.length());
    }
    assert!((sim.time() - 1.0).abs() < 1e-9);
}

#[test]
fn test_every_scheme_keeps_state_finite() {
    for scheme in IntegrationScheme::ALL {
        let mut sim = star_and_planet();
        sim.set_scheme(scheme);
        for _ in 0..600 {
            sim.step(1.0 / 60.0);
        }
        for body in sim.bodies() {
            assert!(body.position().is_finite(), "{} diverged", scheme);
            assert!(body.velocity().is_finite(), "{} diverged", scheme);
        }
    }
}

#[test]
fn test_plunging_body_is_swept() {
    let mut sim = Simulation::new(CentralMass::default()).with_gravity(true);
    let rs = sim.central().horizon_radius();
    sim.add_body(
        Body::new("Infaller", DVec3::new(1.2 * rs, 0.0, 0.0), 1e3, 1e3)
            .with_velocity(DVec3::new(-0.5 * rs, 0.0, 0.0)),
    )
    .unwrap();

    let report = sim.step(1.0);
    assert_eq!(report.absorbed, vec!["Infaller".to_string()]);
    assert!(sim.bodies().is_empty());
}

#[test]
fn test_capacity_is_enforced() {
    let mut sim = Simulation::new(CentralMass::default());
    for i in 0..MAX_BODIES {
        let x = 1e11 * (i + 1) as f64;
        sim.add_body(Body::new(format!("B{}", i), DVec3::new(x, 0.0, 0.0), 1.0, 1.0))
            .unwrap();
    }
    let err = sim
        .add_body(Body::new("Extra", DVec3::new(0.0, 0.0, 1e13), 1.0, 1.0))
        .unwrap_err();
    assert_eq!(err.capacity, MAX_BODIES);
    assert_eq!(sim.bodies().len(), MAX_BODIES);
}

#[test]
fn test_trail_stays_bounded_over_long_runs() {
    let mut config = Config::default();
    config.physics.enable_gravity = true;
    config.physics.trail_length = 25;
    let mut sim = Simulation::from_config(&config);

    for _ in 0..200 {
        sim.step(1.0 / 60.0);
    }
    for body in sim.bodies() {
        assert_eq!(body.trail_capacity(), 25);
        assert_eq!(body.trail_len(), 25);
    }
}

// ============================================================================
// Configuration to snapshot
// ============================================================================

#[test]
fn test_config_scene_round_trip_to_snapshot() {
    let json = r#"{
        "physics": { "enableGravity": true, "integrationMethod": "leapfrog" },
        "rendering": { "adaptiveQuality": true },
        "objects": [
            { "name": "Red Giant", "kind": "star", "position": [3e11, 0, 0],
              "mass": 2e30, "radius": 5e10, "color": [1.0, 0.3, 0.1, 1.0] },
            { "name": "Rock", "kind": "planet", "position": [0, 0, 5e11],
              "mass": 6e24, "radius": 1e10 }
        ]
    }"#;
    let config = Config::from_json_str(json).unwrap();
    let sim = Simulation::from_config(&config);
    assert_eq!(sim.scheme(), IntegrationScheme::Leapfrog);
    assert!(sim.gravity_enabled());
    assert_eq!(sim.bodies().len(), 2);

    let marshaler = SceneSnapshotMarshaler::from_config(&config);
    let mut camera = FixedCamera::looking_at(Vec3::new(0.0, 0.0, 6.3e10), Vec3::ZERO);

    let still = marshaler.marshal(&camera, sim.bodies());
    assert_eq!(still.tier, Tier::Static);
    assert_eq!(still.objects.num_objects, 2);
    assert_eq!(still.objects.pos_radius[0], [3e11, 0.0, 0.0, 5e10]);
    assert_eq!(still.objects.color[0], [1.0, 0.3, 0.1, 1.0]);
    assert_eq!(still.objects.mass[1], 6e24);

    camera.moving = true;
    let moving = marshaler.marshal(&camera, sim.bodies());
    assert_eq!(moving.tier, Tier::Moving);
    assert!(moving.resolution.pixel_count() < still.resolution.pixel_count());
}

#[test]
fn test_default_scene_when_no_objects_configured() {
    let sim = Simulation::from_config(&Config::default());
    let names: Vec<&str> = sim.bodies().iter().map(|b| b.name()).collect();
    assert_eq!(names, ["Test Star 1", "Test Planet 1"]);
}

#[test]
fn test_more_objects_than_capacity_are_dropped() {
    let mut config = Config::default();
    config.objects = (0..MAX_BODIES + 4)
        .map(|i| ObjectConfig {
            name: format!("Object {}", i),
            position: [1e11 * (i + 1) as f64, 0.0, 0.0],
            mass: 1e20,
            radius: 1e6,
            color: Vec4::ONE.to_array(),
            ..ObjectConfig::default()
        })
        .collect();

    let sim = Simulation::from_config(&config);
    assert_eq!(sim.bodies().len(), MAX_BODIES);
    assert_eq!(sim.bodies()[MAX_BODIES - 1].name(), "Object 15");
}
