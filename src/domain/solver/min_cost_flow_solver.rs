use std::collections::HashMap;

use good_lp::{Expression, Solution, SolverModel, Variable, constraint, default_solver, variable, variables};

use crate::domain::demand_profile::DemandProfile;
use crate::domain::solver::network::{FlowNetwork, NodeId};
use crate::domain::solver::{FractionalSolution, FractionalSolver};
use crate::error::SolverError;

/// Solves the minimum-cost two-commodity flow relaxation on a [`FlowNetwork`].
///
/// Servers are conserved at every node and every edge is bounded by its capacity. Serving flow
/// (commodity 1) summed over all types must cover the demand of each breakpoint; idle flow
/// (commodity 2) is only bound by conservation. The optimal flows are written back into the
/// network.
pub struct MinimumCostTwoCommodityFlowSolver<'a> {
    network: &'a mut FlowNetwork,
    demand_profile: &'a DemandProfile,
}

impl<'a> MinimumCostTwoCommodityFlowSolver<'a> {
    pub fn new(network: &'a mut FlowNetwork, demand_profile: &'a DemandProfile) -> Self {
        MinimumCostTwoCommodityFlowSolver { network, demand_profile }
    }
}

impl FractionalSolver for MinimumCostTwoCommodityFlowSolver<'_> {
    fn solve(&mut self) -> Result<FractionalSolution, SolverError> {
        let mut vars = variables!();

        let flows: Vec<Variable> = self.network.edges.iter().map(|edge| vars.add(variable().min(0.0).max(edge.capacity))).collect();
        let objective: Expression = self.network.edges.iter().zip(&flows).map(|(edge, &flow)| edge.cost * flow).sum();

        let mut balances: HashMap<NodeId, Expression> = HashMap::new();
        for (edge, &flow) in self.network.edges.iter().zip(&flows) {
            *balances.entry(edge.tail).or_insert_with(|| Expression::from(0.0)) += flow;
            *balances.entry(edge.head).or_insert_with(|| Expression::from(0.0)) -= flow;
        }

        let mut problem = vars.minimise(objective).using(default_solver);
        let mut num_constraints = 0;

        for node in self.network.nodes() {
            let balance = balances.remove(&node).unwrap_or_else(|| Expression::from(0.0));
            let supply = self.network.supply(node);

            problem = problem.with(constraint!(balance == supply));
            num_constraints += 1;
        }

        for k in self.demand_profile.breakpoints() {
            let serving: Expression = (0..self.network.num_server_types()).map(|i| flows[self.network.active_edge_index(i, k)]).sum();
            let demand = self.demand_profile.demand(k);

            problem = problem.with(constraint!(serving >= demand));
            num_constraints += 1;
        }

        log::debug!("Solving two-commodity flow relaxation with {} variables and {} constraints.", flows.len(), num_constraints);

        let solution = problem.solve()?;

        self.network.reset_flows();
        for (edge, &flow) in self.network.edges.iter_mut().zip(&flows) {
            edge.flow = solution.value(flow).max(0.0);
        }

        let idle_flow: f64 = self.network.edges.iter().map(|edge| edge.flow2()).sum();
        log::trace!("Two-commodity flow routes {:.4} servers over idle edges.", idle_flow);

        let activation = (0..self.network.num_server_types())
            .map(|i| self.demand_profile.breakpoints().map(|k| self.network.active_edge(i, k).flow1()).collect())
            .collect();

        Ok(FractionalSolution::new(self.network.total_cost(), activation))
    }
}
