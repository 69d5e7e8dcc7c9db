use crate::error::SolverError;

pub mod dpm_solver;
pub mod min_cost_flow_solver;
pub mod network;
pub mod solver_type;

/// Fractional relaxation of the provisioning problem: its optimal cost, a lower bound on any
/// integral schedule of the same model, and the fractional number of serving servers `a[i, k]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FractionalSolution {
    pub cost: f64,
    num_breakpoints: usize,
    activation: Vec<f64>,
}

impl FractionalSolution {
    /// `activation` holds one row per server type.
    pub fn new(cost: f64, activation: Vec<Vec<f64>>) -> Self {
        let num_breakpoints = activation.first().map_or(0, Vec::len);

        FractionalSolution { cost, num_breakpoints, activation: activation.into_iter().flatten().collect() }
    }

    pub fn activation(&self, i: usize, k: usize) -> f64 {
        self.activation[i * self.num_breakpoints + k]
    }

    pub fn num_breakpoints(&self) -> usize {
        self.num_breakpoints
    }

    pub fn num_server_types(&self) -> usize {
        if self.num_breakpoints == 0 { 0 } else { self.activation.len() / self.num_breakpoints }
    }

    /// Serving servers summed over all types at breakpoint `k`.
    pub fn coverage(&self, k: usize) -> f64 {
        (0..self.num_server_types()).map(|i| self.activation(i, k)).sum()
    }
}

/// A strategy that solves the fractional relaxation.
pub trait FractionalSolver {
    fn solve(&mut self) -> Result<FractionalSolution, SolverError>;
}
