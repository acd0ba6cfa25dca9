// Behavioural tests for both bioturbation models
// Drives the integrators through the shared run loop and checks the observable series

use approx::assert_abs_diff_eq;
use bioturbation::error::BioturbationError;
use bioturbation::sim::compartment_mixing::mix_step;
use bioturbation::sim::sim_op::MassBalanceOp;
use bioturbation::sim::{
    integrator_for, CompartmentMixing, ContinuumDiffusion, Integrator, LayerGrid, RunSettings,
    SimProps, Simulation,
};
use bioturbation::soil::{LayerInput, ModelKind, ProfileId, ProfileInput, SoilProfile};
use more_asserts::{assert_gt, assert_lt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn profile(model: ModelKind, layers: Vec<LayerInput>) -> SoilProfile {
    SoilProfile::from_input(ProfileId(1), &ProfileInput { model, layers, h: None }).unwrap()
}

fn run(profile: &SoilProfile, dt: f64, tol: f64, max_iter: usize) -> bioturbation::Result<bioturbation::sim::RunReport> {
    Simulation::new(SimProps {
        name: "behaviour".to_string(),
        integrator: integrator_for(profile),
        ops: vec![],
        settings: RunSettings { dt, tol, max_iter },
    })
    .run()
}

#[test]
fn test_model1_step_conserves_total_concentration() {
    let mut rng = StdRng::seed_from_u64(7);

    for case in 0..200 {
        let layer_count = rng.random_range(1..12);
        let mut conc: Vec<f64> = (0..layer_count).map(|_| rng.random_range(0.0..100.0)).collect();
        let rates: Vec<f64> = (0..layer_count).map(|_| rng.random_range(0.0..1e-5)).collect();
        let dt = rng.random_range(1.0..86_400.0);

        let before: f64 = conc.iter().sum();
        mix_step(&mut conc, &rates, dt);
        let after: f64 = conc.iter().sum();

        assert_abs_diff_eq!(before, after, epsilon = 1e-9 * before.max(1.0));
        if case == 0 {
            println!("   {} layers: sum {:.6} -> {:.6}", layer_count, before, after);
        }
    }
}

#[test]
fn test_model1_reference_step() {
    // r = 1e-6, dt = 86400: flux = 1e-6 * 86400 * (0 - 10) = -0.864
    let mut model = CompartmentMixing::new(vec![10.0, 0.0], vec![1e-6, 1e-6]);
    model.step(86_400.0);
    assert_abs_diff_eq!(model.concentrations()[0], 9.136, epsilon = 1e-12);
    assert_abs_diff_eq!(model.concentrations()[1], 0.864, epsilon = 1e-12);
}

#[test]
fn test_uniform_profiles_are_converged_immediately() {
    for conc in [0.0, 1.0, 42.5] {
        let layers = (0..4).map(|_| LayerInput::new(10.0, conc, 30.0, 1e-7)).collect();
        let report = run(&profile(ModelKind::Model1, layers), 86_400.0, 1e-12, 10).unwrap();
        assert!(report.converged);
        assert_eq!(report.iterations, 0);
        assert_eq!(report.history.len(), 1);
    }
}

#[test]
fn test_model1_converges_and_conserves_through_run() {
    let layers = vec![
        LayerInput::new(10.0, 8.0, 100.0, 1e-8),
        LayerInput::new(10.0, 2.0, 100.0, 1e-8),
        LayerInput::new(10.0, 0.0, 100.0, 1e-8),
    ];
    let soil = profile(ModelKind::Model1, layers);
    let report = run(&soil, 86_400.0, 1e-6, 10_000).unwrap();

    assert!(report.converged);
    assert_gt!(report.iterations, 0);
    assert_eq!(report.history.len(), report.iterations + 1);

    let last = report.history.latest().unwrap();
    let total: f64 = last.iter().sum();
    assert_abs_diff_eq!(total, 10.0, epsilon = 1e-9);
    for value in &last {
        assert_abs_diff_eq!(*value, 10.0 / 3.0, epsilon = 1e-6);
    }
    println!("   converged after {} iterations to {:?}", report.iterations, last);
}

#[test]
fn test_model2_grid_assignment() {
    let even = LayerGrid::new(&[50.0, 50.0], 100);
    assert_eq!(even.dx(), 1.0);
    assert_eq!(even.ranges(), &[0..50, 50..100]);
    assert!(even.unassigned().is_empty());

    // 30/100 = 0.3, and 10/0.3 truncates to 33 nodes per layer
    let uneven = LayerGrid::new(&[10.0, 10.0, 10.0], 100);
    assert_eq!(uneven.ranges(), &[0..33, 33..66, 66..99]);
    assert_eq!(uneven.unassigned(), 99..100);

    let model = ContinuumDiffusion::new(uneven, &[1.0, 2.0, 3.0], &[1.0, 1.0, 1.0]);
    assert_eq!(model.concentration()[99], 0.0);
    assert_eq!(model.diffusivity()[99], 0.0);
}

#[test]
fn test_non_convergence_policies_differ() {
    let slow = vec![
        LayerInput::new(10.0, 10.0, 1.0, 1e-12),
        LayerInput::new(10.0, 0.0, 1.0, 1e-12),
    ];

    let model1 = profile(ModelKind::Model1, slow.clone());
    match run(&model1, 86_400.0, 1e-12, 5) {
        Err(BioturbationError::SteadyStateNotReached { iterations }) => assert_eq!(iterations, 5),
        other => panic!("expected SteadyStateNotReached, got {other:?}"),
    }

    let model2 = profile(ModelKind::Model2, slow);
    let report = run(&model2, 86_400.0, 1e-12, 5).unwrap();
    assert!(!report.converged);
    assert_eq!(report.iterations, 5);
    for layer in 0..report.history.layer_count() {
        assert_eq!(report.history.layer(layer).len(), 5);
    }
}

#[test]
fn test_model2_zero_budget_yields_empty_history() {
    let layers = vec![
        LayerInput::new(10.0, 10.0, 1.0, 1e-8),
        LayerInput::new(10.0, 0.0, 1.0, 1e-8),
    ];
    let report = run(&profile(ModelKind::Model2, layers), 86_400.0, 1e-12, 0).unwrap();
    assert!(report.history.is_empty());
    assert_eq!(report.iterations, 0);
}

#[test]
fn test_model2_unpainted_layer_never_converges() {
    // second layer is thinner than one grid cell, so it owns no nodes
    let layers = vec![
        LayerInput::new(100.0, 1.0, 1.0, 1e-8),
        LayerInput::new(0.5, 1.0, 1.0, 1e-8),
    ];
    let report = run(&profile(ModelKind::Model2, layers), 1.0, 1.0, 3).unwrap();
    assert!(!report.converged);
    assert!(report.history.layer(1).iter().all(|v| v.is_nan()));
}

#[test]
fn test_model2_interior_smooths_a_step_profile() {
    let layers = vec![
        LayerInput::new(50.0, 1.0, 1.0, 1.0),
        LayerInput::new(50.0, 0.0, 1.0, 1.0),
    ];
    let soil = profile(ModelKind::Model2, layers);
    let (handle, balance) = MassBalanceOp::tracked(1e-9);

    // D = 0.2, dx = 1, dt_eff = 0.5: dt*D/dx^2 = 0.1, well inside the stable range
    let report = Simulation::new(SimProps {
        name: "smoothing".to_string(),
        integrator: integrator_for(&soil),
        ops: vec![handle],
        settings: RunSettings {
            dt: 50.0,
            tol: 1e-12,
            max_iter: 100,
        },
    })
    .run()
    .unwrap();

    let top = report.history.layer(0);
    let bottom = report.history.layer(1);
    assert_lt!(top[top.len() - 1], 1.0);
    assert_gt!(bottom[bottom.len() - 1], 0.0);
    assert_lt!(bottom[bottom.len() - 1], top[top.len() - 1]);

    // end nodes hold 1.0 and 0.0 and the front never reaches them in 100 steps
    assert_lt!(balance.borrow().max_drift, 1e-9);
}
