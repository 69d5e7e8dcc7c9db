use crate::domain::demand_profile::DemandProfile;
use crate::domain::schedule::Schedule;
use crate::domain::schedule::schedule_builder::construct_schedule;
use crate::domain::server_type::ServerTypes;
use crate::domain::solver::FractionalSolution;
use crate::domain::solver::network::construct_network;
use crate::domain::solver::solver_type::SolverType;
use crate::domain::target_allocation::TargetAllocation;
use crate::error::{Error, Result};

pub const ANALYTICS_TARGET: &str = "analytics";

/// Settings of the flow-based pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowAlgorithmConfig {
    pub solver_type: SolverType,

    /// Slack granted when checking that the fractional serving flow covers the demand.
    pub coverage_tolerance: f64,

    /// Added before flooring scaled activations. Zero floors exactly; a small positive value lets
    /// `2.9999999999` count as `3`.
    pub rounding_epsilon: f64,
}

impl Default for FlowAlgorithmConfig {
    fn default() -> Self {
        FlowAlgorithmConfig { solver_type: SolverType::Flow, coverage_tolerance: 1e-9, rounding_epsilon: 0.0 }
    }
}

/// Tau-scaling: scales every fractional activation by `tau`, floors it and caps it at the type's
/// unit count.
pub fn round_allocation(server_types: &ServerTypes, solution: &FractionalSolution, tau: usize, rounding_epsilon: f64) -> TargetAllocation {
    let mut d = TargetAllocation::new(server_types.len(), solution.num_breakpoints());

    for (i, server_type) in server_types.iter().enumerate() {
        for k in 0..solution.num_breakpoints() {
            let scaled = (tau as f64 * solution.activation(i, k) + rounding_epsilon).floor().max(0.0) as i64;
            d.set(i, k, scaled.min(server_type.max_units()));
        }
    }

    d
}

/// Checks that the fractional serving flow, summed over all types, covers the demand of every
/// breakpoint up to `tolerance`.
pub fn verify_flow(demand_profile: &DemandProfile, solution: &FractionalSolution, tolerance: f64) -> Result<()> {
    for k in demand_profile.breakpoints() {
        let covered = solution.coverage(k);
        let demand = demand_profile.demand(k);

        if covered < demand - tolerance {
            log::warn!("Fractional flow covers only {} of demand {} at breakpoint {}.", covered, demand, k);
            return Err(Error::FlowCoverageViolation { breakpoint: k, covered, demand });
        }
    }

    Ok(())
}

/// Runs the flow-based pipeline with the default configuration.
///
/// `use_flow` selects the two-commodity flow relaxation; otherwise the direct fractional program
/// is solved. Returns the validated schedule and the fractional lower bound.
pub fn flow_based_algorithm<'a>(server_types: &'a ServerTypes, demand_profile: &'a DemandProfile, use_flow: bool) -> Result<(Schedule<'a>, f64)> {
    let config = FlowAlgorithmConfig { solver_type: SolverType::from_use_flow(use_flow), ..FlowAlgorithmConfig::default() };

    flow_based_algorithm_with_config(server_types, demand_profile, &config)
}

pub fn flow_based_algorithm_with_config<'a>(
    server_types: &'a ServerTypes,
    demand_profile: &'a DemandProfile,
    config: &FlowAlgorithmConfig,
) -> Result<(Schedule<'a>, f64)> {
    let mut network = construct_network(server_types, demand_profile);
    let tau = server_types.len();

    let solution = {
        let mut solver = config.solver_type.get_instance(server_types, demand_profile, &mut network);
        solver.solve()?
    };

    log::info!("Solved {} relaxation with fractional cost {:.6}.", config.solver_type, solution.cost);

    let d = round_allocation(server_types, &solution, tau, config.rounding_epsilon);
    let schedule = construct_schedule(server_types, demand_profile, &d)?;

    verify_flow(demand_profile, &solution, config.coverage_tolerance)?;

    let total_energy = schedule.total_energy();

    tracing::info!(
        target: ANALYTICS_TARGET,
        Solver = %config.solver_type,
        ServerTypes = tau,
        Breakpoints = demand_profile.len(),
        FractionalCost = solution.cost,
        TotalEnergy = total_energy,
        EnergyGap = total_energy - solution.cost,
        "Flow-based schedule constructed"
    );

    Ok((schedule, solution.cost))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::server_type::{PowerState, ServerType};
    use crate::domain::utils::id::ServerTypeName;

    fn farm() -> ServerTypes {
        let a = ServerType::new(ServerTypeName::new("a"), 1.0, vec![PowerState::new(0.0, 1.0)], 2).unwrap();
        let b = ServerType::new(ServerTypeName::new("b"), 1.0, vec![PowerState::new(0.0, 1.0)], 5).unwrap();
        ServerTypes::new(vec![a, b]).unwrap()
    }

    #[test]
    fn rounding_scales_floors_and_caps() {
        let solution = FractionalSolution::new(0.0, vec![vec![0.4, 1.5, 0.9999999999], vec![0.0, 2.6, 1.0]]);

        let d = round_allocation(&farm(), &solution, 2, 1e-9);

        assert_eq!(d.row(0), &[0, 2, 2]);
        assert_eq!(d.row(1), &[0, 5, 2]);
    }

    #[test]
    fn coverage_check_honors_tolerance() {
        let profile = DemandProfile::new(vec![0.0, 1.0, 2.0], vec![2.0, 1.0]).unwrap();

        let covering = FractionalSolution::new(0.0, vec![vec![1.0, 0.5], vec![1.0 - 1e-12, 0.5]]);
        assert!(verify_flow(&profile, &covering, 1e-9).is_ok());

        let short = FractionalSolution::new(0.0, vec![vec![1.0, 0.25], vec![1.0, 0.5]]);
        match verify_flow(&profile, &short, 1e-9) {
            Err(Error::FlowCoverageViolation { breakpoint, covered, demand }) => {
                assert_eq!(breakpoint, 1);
                assert_eq!(covered, 0.75);
                assert_eq!(demand, 1.0);
            }
            other => panic!("expected a coverage violation, got {:?}", other),
        }
    }

    #[test]
    fn rounding_with_tau_one_floors_near_integers_up() {
        let solution = FractionalSolution::new(0.0, vec![vec![1.0 - 1e-12, 0.5], vec![0.0, 1.0]]);

        let d = round_allocation(&farm(), &solution, 1, 1e-9);

        assert_eq!(d.row(0), &[1, 0]);
        assert_eq!(d.row(1), &[0, 1]);
    }

    #[test]
    fn default_config_floors_without_slack() {
        let solution = FractionalSolution::new(0.0, vec![vec![1.0 - 1e-12, 2.0], vec![0.0, 1.0]]);
        let config = FlowAlgorithmConfig::default();

        let d = round_allocation(&farm(), &solution, 1, config.rounding_epsilon);

        assert_eq!(config.rounding_epsilon, 0.0);
        assert_eq!(d.row(0), &[0, 2]);
        assert_eq!(d.row(1), &[0, 1]);
    }
}
