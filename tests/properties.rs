//! End-to-end checks of the solver and camera invariants through the
//! public API.

use std::f64::consts::{PI, TAU};

use expanse::geometry::{cartesian_to_polar, normalize_angle, polar_to_cartesian};
use expanse::{
    Camera, CameraConfig, ClimateBoundaries, ClimateModel, ClimateZone, ExpansionSolver, FieldConfig,
    FieldSolver, PolarCoordinate, Station, StationConfig, StationSimulator, Vector2,
};

const R: f64 = 20_000.0;

// ============================================================================
// Expansion
// ============================================================================

#[test]
fn test_expanded_radius_ratio_is_linear_in_time() {
    for &k in &[0.0, 0.01, 0.033, -0.002] {
        let solver = ExpansionSolver::new(k);
        for &r0 in &[1.0, 500.0, 20_000.0] {
            for &t in &[0.0, 1.0, 12.5, 100.0] {
                let ratio = solver.expanded_radius(r0, t) / r0;
                assert!((ratio - (1.0 + k * t)).abs() < 1e-12, "k={k} r0={r0} t={t}");

                let back = solver.historical_radius(solver.expanded_radius(r0, t), t).unwrap();
                assert!((back - r0).abs() < 1e-9 * r0.max(1.0));
            }
        }
    }
}

#[test]
fn test_historical_radius_rejects_singular_time() {
    let solver = ExpansionSolver::new(-0.5);
    assert!(solver.historical_radius(1_000.0, 2.0).is_err());
    assert!(solver.historical_radius(1_000.0, 1.0).is_ok());
}

#[test]
fn test_scenario_k0033_over_a_century() {
    // k per year, t in years: 20000 * (1 + 0.033 * 100).
    let solver = ExpansionSolver::new(0.033);
    let r = solver.expanded_radius(20_000.0, 100.0);
    assert!((r - 86_000.0).abs() < 1e-6);
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn test_polar_round_trip_recovers_radius_and_angle() {
    for i in 0..64 {
        let theta = -3.0 * TAU + i as f64 * 0.37;
        for &r in &[0.5, 1.0, 734.2, 19_999.0] {
            let back = cartesian_to_polar(polar_to_cartesian(PolarCoordinate::new(r, theta)));
            assert!((back.r - r).abs() < 1e-9 * r);
            let diff = normalize_angle(back.theta) - normalize_angle(theta);
            let diff = diff.abs().min(TAU - diff.abs());
            assert!(diff < 1e-9, "theta={theta}");
        }
    }
}

// ============================================================================
// Camera
// ============================================================================

fn cameras() -> Vec<Camera> {
    let mut cams = Vec::new();
    for &(w, h) in &[(1280, 720), (600, 900)] {
        for &rotation in &[0.0, 0.7, -2.1] {
            let mut camera = Camera::new(w, h, CameraConfig::default());
            camera.fit(R);
            camera.set_rotation(rotation);
            camera.set_position(Vector2::new(1_234.0, -560.0));
            cams.push(camera);
        }
    }
    cams
}

#[test]
fn test_screen_world_round_trip() {
    for mut camera in cameras() {
        for &(x, y) in &[(0.0, 0.0), (17.0, 400.0), (640.0, 360.0), (599.0, 5.0)] {
            let screen = Vector2::new(x, y);
            let world = camera.screen_to_world(screen);
            let back = camera.world_to_screen(world);
            assert!((back - screen).length() < 1e-6, "{screen:?} -> {back:?}");
        }
    }
}

#[test]
fn test_zoom_to_point_keeps_anchor_fixed() {
    for mut camera in cameras() {
        let anchor = Vector2::new(3_000.0, 7_500.0);
        for &factor in &[1.1, 0.9, 1.1f64.powi(3)] {
            let before = camera.world_to_screen(anchor);
            camera.zoom_to_point(anchor.x, anchor.y, factor);
            let after = camera.world_to_screen(anchor);
            assert!((after - before).length() < 1e-6);
        }
    }
}

// ============================================================================
// Field
// ============================================================================

#[test]
fn test_field_magnitude_is_inverse_square() {
    let solver = FieldSolver::new(1.0e6, R);
    for i in 0..12 {
        let theta = i as f64 * PI / 6.0 + 0.1;
        for &r0 in &[10.0, 250.0, 4_000.0] {
            let near = solver.field_magnitude(PolarCoordinate::new(r0, theta).to_cartesian());
            let far = solver.field_magnitude(PolarCoordinate::new(2.0 * r0, theta).to_cartesian());
            assert!((far - near / 4.0).abs() < 1e-9 * near);
        }
    }
}

#[test]
fn test_streamlines_terminate_inside_domain() {
    let solver = FieldSolver::new(1.0e6, R);
    let config = FieldConfig::new(16).with_start_radius(100.0).with_max_steps(200);
    let lines = solver.generate_streamlines(&config);
    assert_eq!(lines.len(), 16);

    for line in &lines {
        assert!(line.len() <= 201);
        let interior = &line.points[..line.points.len().saturating_sub(1)];
        for p in interior {
            let r = p.length();
            assert!((1.0..=R).contains(&r), "r = {r}");
        }
    }
}

#[test]
fn test_streamlines_are_regenerated_fresh() {
    let solver = FieldSolver::new(1.0e6, R);
    let config = FieldConfig::new(4);
    assert_eq!(solver.generate_streamlines(&config), solver.generate_streamlines(&config));
}

// ============================================================================
// Stations
// ============================================================================

#[test]
fn test_radial_growth_regresses_to_proportional_line() {
    let stations: Vec<Station> = (0..40)
        .map(|i| {
            let r = 500.0 + 450.0 * i as f64;
            Station::new(i, format!("s{i}"), PolarCoordinate::new(r, i as f64 * 0.61))
        })
        .collect();
    let mut sim = StationSimulator::from_stations(stations, R, 0.02);
    for _ in 0..50 {
        sim.update_positions(0.1);
    }

    let fit = sim.analyze_displacement_pattern().unwrap();
    assert!((fit.r_squared - 1.0).abs() < 1e-9);
    assert!(fit.intercept.abs() < 1e-6);
    assert!(fit.slope > 0.0);

    let pattern = expanse::validate_expansion_pattern(sim.stations());
    assert!(pattern.is_radial);
    assert_eq!(pattern.radial_count, 40);
}

#[test]
fn test_station_reset_restores_initial_positions() {
    let mut sim = StationSimulator::new(StationConfig::new(100).with_seed(11), R, 0.05);
    for _ in 0..10 {
        sim.update_positions(0.5);
    }
    assert!(sim.stations().iter().any(|s| s.displacement.length() > 0.0));

    sim.reset();
    for station in sim.stations() {
        assert_eq!(station.position, station.initial_position);
        assert_eq!(station.displacement, Vector2::ZERO);
    }
}

#[test]
fn test_stepwise_advection_tracks_closed_form_for_small_steps() {
    let k = 0.01;
    let expansion = ExpansionSolver::new(k);
    let mut sim = StationSimulator::new(StationConfig::new(20).with_seed(5), R, k);
    let steps = 1_000;
    let dt = 1.0e-3;
    for _ in 0..steps {
        sim.update_positions(dt);
    }
    let t = steps as f64 * dt;
    for station in sim.stations() {
        let closed = expansion.expanded_radius(station.initial_position.r, t);
        // Compounding overshoots by O(k²t²/2).
        let rel = (station.position.r - closed) / closed;
        assert!(rel >= 0.0);
        assert!(rel < 1e-4);
    }
}

// ============================================================================
// Climate
// ============================================================================

#[test]
fn test_climate_band_edges() {
    let bounds = ClimateBoundaries::default();
    let model = ClimateModel::new(bounds.clone());

    assert_eq!(model.zone_at(bounds.heating_min), ClimateZone::Heating);
    let below = model.zone_at(bounds.heating_min - 1.0);
    assert!(matches!(below, ClimateZone::Stable | ClimateZone::Polar));

    assert_eq!(model.zone_at(0.0), ClimateZone::Polar);
    assert_eq!(model.zone_at(bounds.cooling_min), ClimateZone::Cooling);
    assert_eq!(model.zone_at(bounds.subarctic_min), ClimateZone::Subarctic);
    assert_eq!(model.zone_at(bounds.outer_radius + 1.0), ClimateZone::Temperate);
}
