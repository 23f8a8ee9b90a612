use divesim::depth::*;

#[test]
fn test_integrator_starts_at_surface() {
    let integrator = DepthIntegrator::new();
    let state = integrator.state();

    assert_eq!(state.current_depth, 0.0);
    assert_eq!(state.target_depth, 0.0);
    assert_eq!(state.rate, 0.0);
    assert_eq!(state.max_depth_reached, 0.0);
    assert!(state.is_at_target());
}

#[test]
fn test_single_step_snaps_exactly_onto_target() {
    // 8 m/min for 37.5 s covers exactly 5 m
    let mut integrator = DepthIntegrator::with_target(5.0, 8.0 / 60.0);

    integrator.advance(37.5);

    assert_eq!(integrator.current_depth(), 5.0);
    assert_eq!(integrator.state().max_depth_reached, 5.0);
}

#[test]
fn test_sub_steps_match_single_step() {
    let rate = 8.0 / 60.0;
    let mut stepped = DepthIntegrator::with_target(5.0, rate);
    let mut single = DepthIntegrator::with_target(5.0, rate);

    for _ in 0..375 {
        stepped.advance(0.1);
    }
    single.advance(37.5);

    assert_eq!(stepped.current_depth(), 5.0);
    assert!((stepped.current_depth() - single.current_depth()).abs() < 1e-9);
}

#[test]
fn test_partial_progress_moves_at_rate() {
    let mut integrator = DepthIntegrator::with_target(30.0, 0.5);

    integrator.advance(10.0);
    assert!((integrator.current_depth() - 5.0).abs() < 1e-12);

    integrator.advance(4.0);
    assert!((integrator.current_depth() - 7.0).abs() < 1e-12);
}

#[test]
fn test_never_overshoots_in_either_direction() {
    let mut integrator = DepthIntegrator::with_target(12.0, 1.0);

    let mut previous = integrator.current_depth();
    for elapsed in [0.0, 0.3, 2.5, 7.0, 100.0, 0.1] {
        integrator.advance(elapsed);
        let depth = integrator.current_depth();
        assert!(depth >= previous && depth <= 12.0);
        previous = depth;
    }
    assert_eq!(integrator.current_depth(), 12.0);

    integrator.set_target(3.0);
    for elapsed in [1.0, 4.0, 50.0] {
        integrator.advance(elapsed);
        let depth = integrator.current_depth();
        assert!(depth <= previous && depth >= 3.0);
        previous = depth;
    }
    assert_eq!(integrator.current_depth(), 3.0);
}

#[test]
fn test_zero_rate_holds_depth() {
    let mut integrator = DepthIntegrator::with_target(20.0, 0.0);

    for _ in 0..10 {
        integrator.advance(60.0);
    }

    assert_eq!(integrator.current_depth(), 0.0);
    assert!(!integrator.state().is_at_target());
}

#[test]
fn test_sub_nanometre_gap_holds_without_movement() {
    let mut stalled = DepthIntegrator::with_target(1e-10, 0.0);
    stalled.advance(60.0);
    assert_eq!(stalled.current_depth(), 0.0);

    let mut paused = DepthIntegrator::with_target(1e-10, 1.0);
    paused.advance(0.0);
    assert_eq!(paused.current_depth(), 0.0);

    paused.advance(0.1);
    assert_eq!(paused.current_depth(), 1e-10);
}

#[test]
fn test_zero_elapsed_is_a_no_op() {
    let mut integrator = DepthIntegrator::with_target(10.0, 1.0);
    integrator.advance(3.0);
    let before = *integrator.state();

    integrator.advance(0.0);

    assert_eq!(*integrator.state(), before);
}

#[test]
fn test_max_depth_is_non_decreasing() {
    let mut integrator = DepthIntegrator::with_target(10.0, 1.0);
    let mut max_seen = 0.0;

    for step in 0..40 {
        if step == 15 {
            integrator.set_target(2.0);
        }
        if step == 30 {
            integrator.set_target(6.0);
        }
        integrator.advance(1.0);
        let max_depth = integrator.state().max_depth_reached;
        assert!(max_depth >= max_seen);
        max_seen = max_depth;
    }

    assert_eq!(max_seen, 10.0);
    assert_eq!(integrator.current_depth(), 6.0);
}

#[test]
fn test_set_rate_stores_magnitude() {
    let mut integrator = DepthIntegrator::new();

    assert!(integrator.set_rate(-0.25));
    assert_eq!(integrator.state().rate, 0.25);
    assert_eq!(integrator.state().rate_per_minute(), 15.0);
}

#[test]
fn test_non_finite_inputs_keep_previous_values() {
    let mut integrator = DepthIntegrator::with_target(15.0, 0.2);

    assert!(!integrator.set_target(f64::NAN));
    assert!(!integrator.set_rate(f64::INFINITY));

    assert_eq!(integrator.state().target_depth, 15.0);
    assert_eq!(integrator.state().rate, 0.2);
}

#[test]
fn test_command_path_never_touches_current_or_max_depth() {
    let mut integrator = DepthIntegrator::with_target(8.0, 1.0);
    integrator.advance(4.0);

    integrator.set_target(1.0);
    integrator.set_rate(3.0);

    assert_eq!(integrator.current_depth(), 4.0);
    assert_eq!(integrator.state().max_depth_reached, 4.0);
}
