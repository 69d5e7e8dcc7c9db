use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDto {
    pub name: String,
    pub server_types: Vec<ServerTypeDto>,
    pub demand_profile: DemandProfileDto,

    #[serde(default)]
    pub algorithm: Option<AlgorithmConfigDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ServerTypeDto {
    pub id: String,
    pub max_units: i64,
    pub active_rate: f64,
    pub sleep_states: Vec<PowerStateDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct PowerStateDto {
    pub rate: f64,
    pub power_up_energy: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DemandProfileDto {
    pub timestamps: Vec<f64>,
    pub demand: Vec<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmConfigDto {
    pub solver: Option<String>,
    pub coverage_tolerance: Option<f64>,
    pub rounding_epsilon: Option<f64>,
}
