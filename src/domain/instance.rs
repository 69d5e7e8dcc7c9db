use crate::api::instance_dto::{AlgorithmConfigDto, InstanceDto};
use crate::domain::algorithm::FlowAlgorithmConfig;
use crate::domain::demand_profile::DemandProfile;
use crate::domain::server_type::{ServerType, ServerTypes};
use crate::domain::solver::solver_type::SolverType;
use crate::domain::utils::id::InstanceName;
use crate::error::{Error, Result};

/// A provisioning problem as loaded from disk: the farm, the demand it has to serve and the
/// settings of the algorithm that plans it.
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: InstanceName,
    pub server_types: ServerTypes,
    pub demand_profile: DemandProfile,
    pub config: FlowAlgorithmConfig,
}

impl TryFrom<AlgorithmConfigDto> for FlowAlgorithmConfig {
    type Error = Error;

    fn try_from(dto: AlgorithmConfigDto) -> Result<Self> {
        let defaults = FlowAlgorithmConfig::default();

        let solver_type = match dto.solver {
            Some(name) => name.parse::<SolverType>()?,
            None => defaults.solver_type,
        };

        let config = FlowAlgorithmConfig {
            solver_type,
            coverage_tolerance: dto.coverage_tolerance.unwrap_or(defaults.coverage_tolerance),
            rounding_epsilon: dto.rounding_epsilon.unwrap_or(defaults.rounding_epsilon),
        };

        if !(config.coverage_tolerance >= 0.0) || !(config.rounding_epsilon >= 0.0) {
            return Err(Error::ModelConstructionError(format!(
                "Tolerances must be non-negative, got coverageTolerance {} and roundingEpsilon {}.",
                config.coverage_tolerance, config.rounding_epsilon
            )));
        }

        Ok(config)
    }
}

impl TryFrom<InstanceDto> for Instance {
    type Error = Error;

    fn try_from(dto: InstanceDto) -> Result<Self> {
        let server_types = dto.server_types.into_iter().map(ServerType::try_from).collect::<Result<Vec<_>>>()?;
        let server_types = ServerTypes::new(server_types)?;

        let demand_profile = DemandProfile::try_from(dto.demand_profile)?;

        let config = match dto.algorithm {
            Some(algorithm) => FlowAlgorithmConfig::try_from(algorithm)?,
            None => FlowAlgorithmConfig::default(),
        };

        log::debug!(
            "Instance '{}' has {} server types with {} units over {} breakpoints, peak demand {}.",
            dto.name,
            server_types.len(),
            server_types.total_units(),
            demand_profile.len(),
            demand_profile.peak_demand()
        );

        Ok(Instance { name: InstanceName::new(dto.name), server_types, demand_profile, config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_algorithm_fields_fall_back_to_defaults() {
        let dto = AlgorithmConfigDto { solver: Some("direct".to_string()), coverage_tolerance: None, rounding_epsilon: Some(1e-6) };

        let config = FlowAlgorithmConfig::try_from(dto).unwrap();

        assert_eq!(config.solver_type, SolverType::Direct);
        assert_eq!(config.coverage_tolerance, 1e-9);
        assert_eq!(config.rounding_epsilon, 1e-6);
    }

    #[test]
    fn unknown_solver_is_a_model_error() {
        let dto = AlgorithmConfigDto { solver: Some("branch-and-bound".to_string()), ..AlgorithmConfigDto::default() };

        assert!(matches!(FlowAlgorithmConfig::try_from(dto), Err(Error::ModelConstructionError(_))));
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let dto = AlgorithmConfigDto { coverage_tolerance: Some(-1.0), ..AlgorithmConfigDto::default() };

        assert!(FlowAlgorithmConfig::try_from(dto).is_err());
    }
}
