use dpm_schedule::domain::algorithm::{FlowAlgorithmConfig, flow_based_algorithm_with_config};
use dpm_schedule::domain::solver::solver_type::SolverType;
use dpm_schedule::domain::utils::report::ScheduleReport;
use dpm_schedule::error::Error;
use dpm_schedule::load_instance;

fn fixture(name: &str) -> String {
    format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn test_load_instance_with_defaults() {
    let instance = load_instance(&fixture("sleep_through_gap.json")).unwrap();

    assert_eq!(instance.name.as_str(), "sleep-through-gap");
    assert_eq!(instance.server_types.len(), 1);
    assert_eq!(instance.config, FlowAlgorithmConfig::default());

    let edge = &instance.server_types[0];
    assert_eq!(edge.name.as_str(), "edge");
    assert_eq!(edge.max_units(), 1);
    assert_eq!(edge.sigma(), 1);
    assert_eq!(edge.rate(0), 2.0);
    assert_eq!(edge.power_up_energy(0), 0.0);
    assert_eq!(edge.power_up_energy(1), 1.0);

    assert_eq!(instance.demand_profile.len(), 3);
    assert_eq!(instance.demand_profile.duration(1), 4.0);
}

#[test]
fn test_load_instance_with_algorithm_section() {
    let instance = load_instance(&fixture("mixed_farm.json")).unwrap();

    assert_eq!(instance.server_types.len(), 3);
    assert_eq!(instance.server_types.total_units(), 9);
    assert_eq!(instance.server_types[1].sigma(), 2);
    assert_eq!(instance.config.solver_type, SolverType::Direct);
    assert_eq!(instance.config.coverage_tolerance, 1e-6);
    assert_eq!(instance.config.rounding_epsilon, 0.0);
}

#[test]
fn test_loaded_instance_plans_and_reports() {
    let instance = load_instance(&fixture("sleep_through_gap.json")).unwrap();
    let config = FlowAlgorithmConfig { rounding_epsilon: 1e-9, ..instance.config };

    let (schedule, fractional_cost) = flow_based_algorithm_with_config(&instance.server_types, &instance.demand_profile, &config).unwrap();
    assert!((fractional_cost - 5.0).abs() < 0.0001);

    let mut runs = Vec::new();
    ScheduleReport::new(&schedule).write_runs(&mut runs).unwrap();
    let runs = String::from_utf8(runs).unwrap();

    // Header plus two active runs and one idle run.
    assert_eq!(runs.lines().count(), 4);
    assert!(runs.lines().skip(1).all(|line| line.starts_with("edge;")));
}

#[test]
fn test_missing_file() {
    let result = load_instance(&fixture("does_not_exist.json"));
    assert!(matches!(result, Err(Error::IoError(_))));
}

#[test]
fn test_missing_field() {
    let result = load_instance(&fixture("missing_demand.json"));
    assert!(matches!(result, Err(Error::DeserializationError(_))));
}

#[test]
fn test_invalid_timestamps() {
    let result = load_instance(&fixture("decreasing_timestamps.json"));
    assert!(matches!(result, Err(Error::ModelConstructionError(_))));
}

#[test]
fn test_unknown_solver_name() {
    match load_instance(&fixture("unknown_solver.json")) {
        Err(Error::ModelConstructionError(message)) => assert!(message.contains("ilp"), "message was '{}'", message),
        other => panic!("expected model construction error, got {:?}", other.map(|instance| instance.name)),
    }
}
