use std::ops::Index;

use crate::api::instance_dto::{PowerStateDto, ServerTypeDto};
use crate::domain::utils::id::ServerTypeName;
use crate::error::{Error, Result};

/// Level of the active (serving) power state. All other levels are idle states.
pub const ACTIVE_LEVEL: usize = 0;

/// A single power state of a server type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerState {
    /// Energy drawn per time unit by one server residing in this state.
    pub rate: f64,

    /// One-time energy paid when a server leaves this state to serve again.
    /// Always `0.0` for the active state.
    pub power_up_energy: f64,
}

impl PowerState {
    pub fn new(rate: f64, power_up_energy: f64) -> Self {
        PowerState { rate, power_up_energy }
    }

    /// Energy of one server residing in this state for `duration` and powering up once.
    pub fn run_energy(&self, duration: f64) -> f64 {
        self.rate * duration + self.power_up_energy
    }
}

/// Static description of one server type: its power states and how many
/// physical units of it exist.
///
/// Level `0` is the active state, levels `1..=sigma` are idle states ordered as given.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerType {
    pub name: ServerTypeName,
    states: Vec<PowerState>,
    max_units: i64,
}

impl ServerType {
    pub fn new(name: ServerTypeName, active_rate: f64, sleep_states: Vec<PowerState>, max_units: i64) -> Result<Self> {
        if sleep_states.is_empty() {
            return Err(Error::ModelConstructionError(format!("Server type '{}' needs at least one sleep state.", name)));
        }

        if max_units < 0 {
            return Err(Error::ModelConstructionError(format!("Server type '{}' has a negative unit count: {}", name, max_units)));
        }

        let mut states = Vec::with_capacity(sleep_states.len() + 1);
        states.push(PowerState::new(active_rate, 0.0));
        states.extend(sleep_states);

        let is_valid = |value: f64| value.is_finite() && value >= 0.0;

        for (level, state) in states.iter().enumerate() {
            if !is_valid(state.rate) || !is_valid(state.power_up_energy) {
                return Err(Error::ModelConstructionError(format!(
                    "Server type '{}' has an invalid power state at level {}: rate {}, power-up energy {}",
                    name, level, state.rate, state.power_up_energy
                )));
            }
        }

        Ok(ServerType { name, states, max_units })
    }

    /// Number of idle states. Levels run from `0` to `sigma` inclusive.
    pub fn sigma(&self) -> usize {
        self.states.len() - 1
    }

    pub fn num_levels(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, level: usize) -> &PowerState {
        &self.states[level]
    }

    pub fn rate(&self, level: usize) -> f64 {
        self.states[level].rate
    }

    pub fn power_up_energy(&self, level: usize) -> f64 {
        self.states[level].power_up_energy
    }

    /// Maximum number of physical units (`m`).
    pub fn max_units(&self) -> i64 {
        self.max_units
    }

    pub fn idle_levels(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.sigma()
    }
}

impl TryFrom<ServerTypeDto> for ServerType {
    type Error = Error;

    fn try_from(dto: ServerTypeDto) -> Result<Self> {
        let sleep_states = dto.sleep_states.iter().map(|PowerStateDto { rate, power_up_energy }| PowerState::new(*rate, *power_up_energy)).collect();

        ServerType::new(ServerTypeName::new(dto.id), dto.active_rate, sleep_states, dto.max_units)
    }
}

/// The catalog of all server types of a farm. The position in the catalog is the type index `i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerTypes {
    types: Vec<ServerType>,
}

impl ServerTypes {
    pub fn new(types: Vec<ServerType>) -> Result<Self> {
        if types.is_empty() {
            return Err(Error::ModelConstructionError("A server farm needs at least one server type.".to_string()));
        }

        Ok(ServerTypes { types })
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ServerType> {
        self.types.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServerType> {
        self.types.iter()
    }

    pub fn indices(&self) -> std::ops::Range<usize> {
        0..self.types.len()
    }

    pub fn total_units(&self) -> i64 {
        self.types.iter().map(ServerType::max_units).sum()
    }
}

impl Index<usize> for ServerTypes {
    type Output = ServerType;

    fn index(&self, index: usize) -> &ServerType {
        &self.types[index]
    }
}

impl<'a> IntoIterator for &'a ServerTypes {
    type Item = &'a ServerType;
    type IntoIter = std::slice::Iter<'a, ServerType>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.iter()
    }
}
