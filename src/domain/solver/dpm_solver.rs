use good_lp::{Expression, ProblemVariables, Solution, SolverModel, Variable, constraint, default_solver, variable, variables};

use crate::domain::demand_profile::DemandProfile;
use crate::domain::server_type::{ACTIVE_LEVEL, ServerType, ServerTypes};
use crate::domain::solver::{FractionalSolution, FractionalSolver};
use crate::error::SolverError;

/// Variables of one server type in the direct program.
struct TypeVariables {
    /// `x[j][k]`: servers residing in level `j` during breakpoint `k`.
    residency: Vec<Vec<Variable>>,
    /// `w[j][k - 1]`: servers waking from idle level `j` at breakpoint `k >= 1`. Level 0 is empty.
    wake_ups: Vec<Vec<Variable>>,
    /// `f[j][k - 1]`: serving servers falling into idle level `j` at breakpoint `k >= 1`. Level 0 is empty.
    fall_asleep: Vec<Vec<Variable>>,
}

/// Direct fractional program over per-level residency and transitions.
///
/// Every server of a type sits in exactly one level per breakpoint, starting anywhere at no
/// cost. Moving from an idle level back to serving pays that level's power-up energy; falling
/// asleep is free.
pub struct DpmSolver<'a> {
    server_types: &'a ServerTypes,
    demand_profile: &'a DemandProfile,
}

impl<'a> DpmSolver<'a> {
    pub fn new(server_types: &'a ServerTypes, demand_profile: &'a DemandProfile) -> Self {
        DpmSolver { server_types, demand_profile }
    }

    /// Adds the variables of `server_type` and returns them with their objective terms.
    fn add_variables(&self, vars: &mut ProblemVariables, server_type: &ServerType) -> (TypeVariables, Expression) {
        let n = self.demand_profile.len();
        let units = server_type.max_units() as f64;
        let mut cost = Expression::from(0.0);

        let mut residency = Vec::with_capacity(server_type.num_levels());
        for j in 0..server_type.num_levels() {
            let levels: Vec<Variable> = (0..n).map(|_| vars.add(variable().min(0.0).max(units))).collect();

            for (k, &x) in levels.iter().enumerate() {
                cost += server_type.rate(j) * self.demand_profile.duration(k) * x;
            }
            residency.push(levels);
        }

        let mut wake_ups = vec![Vec::new()];
        let mut fall_asleep = vec![Vec::new()];

        for j in server_type.idle_levels() {
            let wake: Vec<Variable> = (1..n).map(|_| vars.add(variable().min(0.0))).collect();
            for &w in &wake {
                cost += server_type.power_up_energy(j) * w;
            }

            wake_ups.push(wake);
            fall_asleep.push((1..n).map(|_| vars.add(variable().min(0.0))).collect());
        }

        (TypeVariables { residency, wake_ups, fall_asleep }, cost)
    }
}

impl FractionalSolver for DpmSolver<'_> {
    fn solve(&mut self) -> Result<FractionalSolution, SolverError> {
        let n = self.demand_profile.len();
        let mut vars = variables!();
        let mut objective = Expression::from(0.0);
        let mut variables = Vec::with_capacity(self.server_types.len());

        for server_type in self.server_types {
            let (type_variables, cost) = self.add_variables(&mut vars, server_type);
            objective += cost;
            variables.push(type_variables);
        }

        let mut problem = vars.minimise(objective).using(default_solver);
        let mut num_constraints = 0;

        for (type_vars, server_type) in variables.iter().zip(self.server_types) {
            let units: Expression = type_vars.residency.iter().map(|levels| levels[0]).sum();
            let max_units = server_type.max_units() as f64;
            problem = problem.with(constraint!(units == max_units));
            num_constraints += 1;

            for k in 1..n {
                let mut serving = Expression::from(type_vars.residency[ACTIVE_LEVEL][k]) - type_vars.residency[ACTIVE_LEVEL][k - 1];

                for j in server_type.idle_levels() {
                    let wake_up = type_vars.wake_ups[j][k - 1];
                    let asleep = type_vars.fall_asleep[j][k - 1];

                    serving -= wake_up;
                    serving += asleep;

                    let idle = Expression::from(type_vars.residency[j][k]) - type_vars.residency[j][k - 1] + wake_up - asleep;
                    problem = problem.with(constraint!(idle == 0.0));
                    num_constraints += 1;
                }

                problem = problem.with(constraint!(serving == 0.0));
                num_constraints += 1;
            }
        }

        for k in self.demand_profile.breakpoints() {
            let serving: Expression = variables.iter().map(|type_vars| type_vars.residency[ACTIVE_LEVEL][k]).sum();
            let demand = self.demand_profile.demand(k);

            problem = problem.with(constraint!(serving >= demand));
            num_constraints += 1;
        }

        log::debug!("Solving direct fractional program with {} constraints.", num_constraints);

        let solution = problem.solve()?;

        let mut cost = 0.0;
        for (type_vars, server_type) in variables.iter().zip(self.server_types) {
            for (j, levels) in type_vars.residency.iter().enumerate() {
                for (k, &x) in levels.iter().enumerate() {
                    cost += server_type.rate(j) * self.demand_profile.duration(k) * solution.value(x);
                }
            }

            let mut wake_ups = 0.0;
            for j in server_type.idle_levels() {
                for &w in &type_vars.wake_ups[j] {
                    let value = solution.value(w);
                    cost += server_type.power_up_energy(j) * value;
                    wake_ups += value;
                }
            }

            let transitions: f64 = type_vars.fall_asleep.iter().flatten().map(|&f| solution.value(f)).sum();
            log::trace!("Server type '{}': {:.4} fractional wake-ups, {:.4} fractional transitions to sleep.", server_type.name, wake_ups, transitions);
        }

        let activation = variables.iter().map(|type_vars| type_vars.residency[ACTIVE_LEVEL].iter().map(|&x| solution.value(x).max(0.0)).collect()).collect();

        Ok(FractionalSolution::new(cost, activation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::utils::id::ServerTypeName;
    use crate::domain::server_type::PowerState;

    #[test]
    fn sleeping_through_a_gap_pays_one_wake_up() {
        let server_type = ServerType::new(ServerTypeName::new("a"), 2.0, vec![PowerState::new(0.0, 1.0)], 1).unwrap();
        let server_types = ServerTypes::new(vec![server_type]).unwrap();
        let profile = DemandProfile::new(vec![0.0, 1.0, 5.0, 6.0], vec![1.0, 0.0, 1.0]).unwrap();

        let solution = DpmSolver::new(&server_types, &profile).solve().unwrap();

        assert!((solution.cost - 5.0).abs() < 0.0001, "cost was {}", solution.cost);
        assert!(solution.activation(0, 1).abs() < 0.0001);
    }
}
