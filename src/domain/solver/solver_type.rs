use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::demand_profile::DemandProfile;
use crate::domain::server_type::ServerTypes;
use crate::domain::solver::FractionalSolver;
use crate::domain::solver::dpm_solver::DpmSolver;
use crate::domain::solver::min_cost_flow_solver::MinimumCostTwoCommodityFlowSolver;
use crate::domain::solver::network::FlowNetwork;
use crate::error::ConversionError;

/// The available relaxations of the provisioning problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SolverType {
    /// **Minimum-cost two-commodity flow** over the time-expanded network.
    #[default]
    Flow,
    /// **Direct fractional program** over per-state residency and transition variables.
    Direct,
}

impl SolverType {
    /// Factory method returning the concrete solver for the enum variant. The flow solver works on
    /// `network` and leaves its optimal flows there.
    pub fn get_instance<'a>(self, server_types: &'a ServerTypes, demand_profile: &'a DemandProfile, network: &'a mut FlowNetwork) -> Box<dyn FractionalSolver + 'a> {
        match self {
            SolverType::Flow => Box::new(MinimumCostTwoCommodityFlowSolver::new(network, demand_profile)),
            SolverType::Direct => Box::new(DpmSolver::new(server_types, demand_profile)),
        }
    }

    pub fn from_use_flow(use_flow: bool) -> Self {
        if use_flow { SolverType::Flow } else { SolverType::Direct }
    }
}

impl FromStr for SolverType {
    type Err = ConversionError;

    fn from_str(solver_type: &str) -> Result<SolverType, Self::Err> {
        match solver_type.to_ascii_lowercase().as_str() {
            "flow" | "min-cost-flow" => Ok(SolverType::Flow),
            "direct" | "dpm" => Ok(SolverType::Direct),
            _ => Err(ConversionError::UnknownSolverType(solver_type.to_string())),
        }
    }
}

impl TryFrom<String> for SolverType {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SolverType> for String {
    fn from(solver_type: SolverType) -> Self {
        solver_type.to_string()
    }
}

impl fmt::Display for SolverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverType::Flow => write!(f, "flow"),
            SolverType::Direct => write!(f, "direct"),
        }
    }
}
