use thiserror::Error as ThisError;

use crate::domain::demand_profile::DemandProfile;
use crate::domain::schedule::run::{Run, decompose};
use crate::domain::server_type::{ACTIVE_LEVEL, ServerTypes};
use crate::domain::target_allocation::TargetAllocation;
use crate::error::{Error, Result};

pub mod run;
pub mod schedule_builder;

/// Reason a ledger cell range failed the feasibility check.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Infeasibility {
    #[error("{count} servers committed to level {level}")]
    NegativeResidency { level: usize, count: i64 },

    #[error("{active} servers active, but {required} required")]
    ActiveMismatch { active: i64, required: i64 },

    #[error("{occupied} servers occupied, but only {max_units} units exist")]
    CapacityExceeded { occupied: i64, max_units: i64 },
}

/// Residency ledger: how many servers of type `i` reside in power level `j` at breakpoint `k`.
///
/// The table is dense. Each server type owns one contiguous block of
/// `breakpoints * levels` cells, so per-type work never touches another type's cells.
/// Commitments accumulate by addition.
#[derive(Debug, Clone)]
pub struct Schedule<'a> {
    server_types: &'a ServerTypes,
    demand_profile: &'a DemandProfile,
    target: TargetAllocation,
    offsets: Vec<usize>,
    cells: Vec<i64>,
}

impl<'a> Schedule<'a> {
    pub fn new(server_types: &'a ServerTypes, demand_profile: &'a DemandProfile, target: TargetAllocation) -> Self {
        let mut offsets = Vec::with_capacity(server_types.len());
        let mut size = 0;

        for server_type in server_types {
            offsets.push(size);
            size += demand_profile.len() * server_type.num_levels();
        }

        Schedule { server_types, demand_profile, target, offsets, cells: vec![0; size] }
    }

    fn index(&self, i: usize, k: usize, j: usize) -> usize {
        self.offsets[i] + k * self.server_types[i].num_levels() + j
    }

    /// Adds `delta` servers of type `i` to level `j` at breakpoint `k`.
    pub fn commit(&mut self, i: usize, k: usize, delta: i64, j: usize) {
        if delta == 0 {
            return;
        }

        let index = self.index(i, k, j);
        self.cells[index] += delta;

        log::trace!("Committed {} servers of type '{}' to level {} at breakpoint {}.", delta, self.server_types[i].name, j, k);
    }

    pub fn residency(&self, i: usize, k: usize, j: usize) -> i64 {
        self.cells[self.index(i, k, j)]
    }

    /// Servers of type `i` serving at breakpoint `k`.
    pub fn active(&self, i: usize, k: usize) -> i64 {
        self.residency(i, k, ACTIVE_LEVEL)
    }

    /// Servers of type `i` residing in any level at breakpoint `k`.
    pub fn occupied(&self, i: usize, k: usize) -> i64 {
        let start = self.index(i, k, 0);
        self.cells[start..start + self.server_types[i].num_levels()].iter().sum()
    }

    pub fn level_series(&self, i: usize, j: usize) -> Vec<i64> {
        self.demand_profile.breakpoints().map(|k| self.residency(i, k, j)).collect()
    }

    pub fn peak_active(&self, i: usize) -> i64 {
        self.demand_profile.breakpoints().map(|k| self.active(i, k)).max().unwrap_or(0)
    }

    pub fn server_types(&self) -> &'a ServerTypes {
        self.server_types
    }

    pub fn demand_profile(&self) -> &'a DemandProfile {
        self.demand_profile
    }

    pub fn target(&self) -> &TargetAllocation {
        &self.target
    }

    /// All runs of the ledger, per server type and level in ascending order.
    pub fn runs(&self) -> Vec<Run> {
        let mut runs = Vec::new();

        for (i, server_type) in self.server_types.iter().enumerate() {
            for j in 0..server_type.num_levels() {
                let series = self.level_series(i, j);

                runs.extend(decompose(&series).into_iter().map(|(start, end, count)| Run { server_type: i, level: j, start, end, count }));
            }
        }

        runs
    }

    /// Energy of a single run: running energy over its span plus one power-up per server.
    pub fn run_energy(&self, run: &Run) -> f64 {
        let state = self.server_types[run.server_type].state(run.level);
        let duration = self.demand_profile.span(run.start, run.end);

        state.run_energy(duration) * run.count as f64
    }

    /// Continuous energy drawn by all residing servers.
    pub fn running_energy(&self) -> f64 {
        self.runs().iter().map(|run| self.server_types[run.server_type].rate(run.level) * self.demand_profile.span(run.start, run.end) * run.count as f64).sum()
    }

    /// One-time energy paid at the start of every run.
    pub fn power_up_energy(&self) -> f64 {
        self.runs().iter().map(|run| self.server_types[run.server_type].power_up_energy(run.level) * run.count as f64).sum()
    }

    pub fn total_energy(&self) -> f64 {
        self.runs().iter().map(|run| self.run_energy(run)).sum()
    }

    /// Verifies that every breakpoint serves exactly the target count, that no cell is negative
    /// and that no type occupies more units than it has.
    pub fn check_feasible(&self) -> Result<()> {
        for (i, server_type) in self.server_types.iter().enumerate() {
            for k in self.demand_profile.breakpoints() {
                let infeasible = |violation: Infeasibility| {
                    log::error!("Schedule for server type '{}' is infeasible at breakpoint {}: {}", server_type.name, k, violation);
                    Err(Error::ScheduleInfeasible { server_type: server_type.name.to_string(), breakpoint: k, violation })
                };

                for j in 0..server_type.num_levels() {
                    let count = self.residency(i, k, j);

                    if count < 0 {
                        return infeasible(Infeasibility::NegativeResidency { level: j, count });
                    }
                }

                let active = self.active(i, k);
                let required = self.target.get(i, k);

                if active != required {
                    return infeasible(Infeasibility::ActiveMismatch { active, required });
                }

                let occupied = self.occupied(i, k);

                if occupied > server_type.max_units() {
                    return infeasible(Infeasibility::CapacityExceeded { occupied, max_units: server_type.max_units() });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::server_type::{PowerState, ServerType};
    use crate::domain::utils::id::ServerTypeName;

    fn farm(max_units: i64) -> ServerTypes {
        let server_type = ServerType::new(ServerTypeName::new("a"), 2.0, vec![PowerState::new(0.5, 3.0)], max_units).unwrap();
        ServerTypes::new(vec![server_type]).unwrap()
    }

    #[test]
    fn commitments_accumulate() {
        let server_types = farm(4);
        let profile = DemandProfile::new(vec![0.0, 1.0, 2.0], vec![1.0, 1.0]).unwrap();
        let mut schedule = Schedule::new(&server_types, &profile, TargetAllocation::new(1, 2));

        schedule.commit(0, 1, 2, 1);
        schedule.commit(0, 1, 1, 1);
        schedule.commit(0, 1, 0, 0);
        schedule.commit(0, 1, 3, 0);
        schedule.commit(0, 1, -1, 0);

        assert_eq!(schedule.residency(0, 1, 1), 3);
        assert_eq!(schedule.active(0, 1), 2);
        assert_eq!(schedule.occupied(0, 1), 5);
        assert_eq!(schedule.occupied(0, 0), 0);
    }

    #[test]
    fn energy_charges_one_power_up_per_run() {
        let server_types = farm(4);
        let profile = DemandProfile::new(vec![0.0, 1.0, 3.0, 6.0], vec![0.0, 0.0, 0.0]).unwrap();
        let mut schedule = Schedule::new(&server_types, &profile, TargetAllocation::new(1, 3));

        for (k, count) in [2, 3, 1].into_iter().enumerate() {
            schedule.commit(0, k, count, 1);
        }

        // Residency time: 2 * 1 + 3 * 2 + 1 * 3 = 11 server-time units at rate 0.5.
        assert!((schedule.running_energy() - 5.5).abs() < 1e-12);
        // Three runs start: two at breakpoint 0, one at breakpoint 1.
        assert!((schedule.power_up_energy() - 9.0).abs() < 1e-12);
        assert!((schedule.total_energy() - 14.5).abs() < 1e-12);
        assert_eq!(schedule.runs().len(), 3);
    }

    #[test]
    fn active_runs_carry_no_power_up() {
        let server_types = farm(4);
        let profile = DemandProfile::new(vec![0.0, 1.0, 2.0, 3.0], vec![1.0, 0.0, 1.0]).unwrap();
        let mut schedule = Schedule::new(&server_types, &profile, TargetAllocation::new(1, 3));

        schedule.commit(0, 0, 1, ACTIVE_LEVEL);
        schedule.commit(0, 2, 1, ACTIVE_LEVEL);

        assert!((schedule.total_energy() - 4.0).abs() < 1e-12);
        assert_eq!(schedule.power_up_energy(), 0.0);
    }

    #[test]
    fn detects_active_mismatch() {
        let server_types = farm(4);
        let profile = DemandProfile::new(vec![0.0, 1.0], vec![2.0]).unwrap();
        let target = TargetAllocation::from_rows(vec![vec![2]]).unwrap();
        let mut schedule = Schedule::new(&server_types, &profile, target);
        schedule.commit(0, 0, 1, ACTIVE_LEVEL);

        match schedule.check_feasible() {
            Err(Error::ScheduleInfeasible { breakpoint, violation, .. }) => {
                assert_eq!(breakpoint, 0);
                assert_eq!(violation, Infeasibility::ActiveMismatch { active: 1, required: 2 });
            }
            other => panic!("expected an infeasible schedule, got {:?}", other),
        }
    }

    #[test]
    fn detects_capacity_overrun() {
        let server_types = farm(2);
        let profile = DemandProfile::new(vec![0.0, 1.0], vec![1.0]).unwrap();
        let target = TargetAllocation::from_rows(vec![vec![1]]).unwrap();
        let mut schedule = Schedule::new(&server_types, &profile, target);
        schedule.commit(0, 0, 1, ACTIVE_LEVEL);
        schedule.commit(0, 0, 2, 1);

        match schedule.check_feasible() {
            Err(Error::ScheduleInfeasible { violation, .. }) => {
                assert_eq!(violation, Infeasibility::CapacityExceeded { occupied: 3, max_units: 2 });
            }
            other => panic!("expected an infeasible schedule, got {:?}", other),
        }
    }

    #[test]
    fn detects_negative_cells() {
        let server_types = farm(2);
        let profile = DemandProfile::new(vec![0.0, 1.0], vec![0.0]).unwrap();
        let mut schedule = Schedule::new(&server_types, &profile, TargetAllocation::new(1, 1));
        schedule.commit(0, 0, -1, 1);

        assert!(matches!(
            schedule.check_feasible(),
            Err(Error::ScheduleInfeasible { violation: Infeasibility::NegativeResidency { level: 1, count: -1 }, .. })
        ));
    }
}
