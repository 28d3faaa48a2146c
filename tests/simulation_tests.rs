//! Integration tests for the growth simulation and run configuration.

use cellgrid::{
    GrowthSimulation, RandomSource, RunConfig, SeededRandom, SimulationParams, Snapshot, Vec3,
};

/// Random source whose draws never trigger a division.
struct NeverDivide;

impl RandomSource for NeverDivide {
    fn uniform(&mut self, _low: i32, high: i32) -> i32 {
        high - 1
    }

    fn rand_unit_cube(&mut self) -> Vec3 {
        Vec3::ZERO
    }
}

// ============================================================================
// Invariants Over Many Steps
// ============================================================================

#[test]
fn test_links_stay_ordered_and_in_range() {
    let mut sim = GrowthSimulation::seeded(SimulationParams::default(), 11);
    for _ in 0..30 {
        sim.step(0.01);
        let count = sim.particles().len() as u32;
        for link in sim.links() {
            assert!(link.a < link.b);
            assert!(link.b < count);
        }
    }
}

#[test]
fn test_particle_count_never_shrinks() {
    let mut sim = GrowthSimulation::seeded(SimulationParams::default(), 5);
    let mut previous = sim.particles().len();
    for _ in 0..30 {
        let stats = sim.step(0.01);
        assert_eq!(stats.particles_before, previous);
        assert_eq!(stats.particles_after, previous + stats.divisions);
        assert!(sim.particles().len() >= previous);
        previous = sim.particles().len();
    }
}

#[test]
fn test_system_size_covers_all_particles() {
    let params = SimulationParams::default().with_spring_factor(4.0).with_repell_factor(2.0);
    let mut sim = GrowthSimulation::seeded(params, 2);
    for _ in 0..25 {
        sim.step(0.02);
        for p in sim.particles() {
            assert!(p.abs().max_element() <= sim.system_size());
        }
    }
}

#[test]
fn test_growth_happens() {
    let mut sim = GrowthSimulation::seeded(SimulationParams::default(), 1);
    let mut divisions = 0;
    for _ in 0..40 {
        divisions += sim.step(0.01).divisions;
    }
    assert!(divisions > 0);
    assert_eq!(sim.step_count(), 40);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_same_seed_same_state() {
    let run = |seed| {
        let mut sim = GrowthSimulation::seeded(SimulationParams::default(), seed);
        for _ in 0..25 {
            sim.step(0.01);
        }
        sim.snapshot()
    };
    assert_eq!(run(42), run(42));
}

#[test]
fn test_parallel_matches_sequential() {
    let params = SimulationParams::default().with_repell_factor(3.0);
    let mut sequential = GrowthSimulation::seeded(params, 8);
    let mut parallel = GrowthSimulation::seeded(params, 8).with_parallel(true);
    for _ in 0..30 {
        let a = sequential.step(0.01);
        let b = parallel.step(0.01);
        assert_eq!(a, b);
    }
    assert_eq!(sequential.particles(), parallel.particles());
    assert_eq!(sequential.links(), parallel.links());
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_seed_pair_without_forces_is_static() {
    let r = 0.25;
    let params = SimulationParams::default()
        .with_cell_radius(r)
        .with_rest_length(2.0 * r)
        .with_spring_factor(0.0)
        .with_repell_factor(0.0);
    let mut sim = GrowthSimulation::new(params, SeededRandom::new(0));
    sim.step(0.01);
    assert_eq!(&sim.particles()[..2], &[Vec3::new(0.0, 0.0, -r), Vec3::new(0.0, 0.0, r)]);
}

#[test]
fn test_isolated_cells_never_bond() {
    let particles = vec![Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)];
    let params = SimulationParams::default().with_domain_radius(0.0);
    let mut sim = GrowthSimulation::from_parts(params, particles, Vec::new(), NeverDivide);
    for _ in 0..5 {
        let stats = sim.step(0.01);
        assert_eq!(stats.links_formed, 0);
    }
    assert_eq!(sim.stress()[0], 0.0);
    assert_eq!(sim.stress()[1], 0.0);
}

#[test]
fn test_confined_growth_stays_in_domain() {
    let params = SimulationParams::default().with_domain_radius(0.6);
    let mut sim = GrowthSimulation::seeded(params, 4);
    for _ in 0..20 {
        sim.step(0.05);
    }
    for p in sim.particles() {
        assert!(p.truncate().length() <= 0.6 + 1e-5);
        assert!(p.z.abs() <= 0.6);
    }
}

// ============================================================================
// Export And Configuration
// ============================================================================

#[test]
fn test_snapshot_file_roundtrip() {
    let mut sim = GrowthSimulation::seeded(SimulationParams::default(), 6);
    for _ in 0..5 {
        sim.step(0.01);
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    sim.snapshot().write_json(&path).unwrap();

    let loaded = Snapshot::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded.step, 5);
    assert_eq!(loaded.particles.len(), sim.particles().len());
    assert_eq!(loaded.links.len(), sim.links().len());
    assert_eq!(sim.positions_bytes().len(), sim.particles().len() * 12);
}

#[test]
fn test_config_from_files() {
    let dir = tempfile::tempdir().unwrap();

    let toml_path = dir.path().join("run.toml");
    std::fs::write(&toml_path, "steps = 3\nseed = 12\n[params]\nrest_length = 0.5\n").unwrap();
    let config = RunConfig::from_file(&toml_path).unwrap();
    assert_eq!(config.steps, 3);
    assert_eq!(config.seed, 12);
    assert_eq!(config.params.rest_length, 0.5);

    let json_path = dir.path().join("run.json");
    std::fs::write(&json_path, r#"{ "steps": 4, "parallel": true }"#).unwrap();
    let config = RunConfig::from_file(&json_path).unwrap();
    assert_eq!(config.steps, 4);
    assert!(config.parallel);

    assert!(RunConfig::from_file(dir.path().join("missing.toml")).is_err());
}
