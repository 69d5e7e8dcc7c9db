use crate::domain::demand_profile::DemandProfile;
use crate::domain::schedule::Schedule;
use crate::domain::server_type::{ACTIVE_LEVEL, ServerTypes};
use crate::domain::target_allocation::TargetAllocation;
use crate::error::{Error, Result};

/// What to do with servers that are no longer needed after breakpoint `k - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpDecision {
    /// Keep the servers in idle `level` from `k` until breakpoint `until`, where they serve again.
    Batch { until: usize, level: usize },

    /// No later breakpoint needs more servers than are already guaranteed. The servers drop into
    /// the deepest `level` for good; no residency is committed for them.
    PowerDown { level: usize },
}

/// Converts a target allocation into a residency ledger by batching the servers released between
/// two breakpoints into idle runs that last until they are needed again.
pub struct ScheduleBuilder<'a, 'd> {
    server_types: &'a ServerTypes,
    demand_profile: &'a DemandProfile,
    d: &'d TargetAllocation,
}

impl<'a, 'd> ScheduleBuilder<'a, 'd> {
    pub fn new(server_types: &'a ServerTypes, demand_profile: &'a DemandProfile, d: &'d TargetAllocation) -> Result<Self> {
        if d.num_server_types() != server_types.len() || d.num_breakpoints() != demand_profile.len() {
            return Err(Error::ModelConstructionError(format!(
                "Target allocation covers {} server types and {} breakpoints, but the farm has {} server types and the profile {} breakpoints.",
                d.num_server_types(),
                d.num_breakpoints(),
                server_types.len(),
                demand_profile.len()
            )));
        }

        Ok(ScheduleBuilder { server_types, demand_profile, d })
    }

    /// Energy of one additional server of type `i` idling in `level` from breakpoint `k` and
    /// powering up at breakpoint `p`.
    pub fn level_cost(&self, i: usize, level: usize, k: usize, p: usize) -> f64 {
        self.server_types[i].state(level).run_energy(self.demand_profile.span(k, p))
    }

    /// Finds the earliest breakpoint after `k` that needs more than `mu` servers of type `i` and
    /// the idle level that bridges the gap to it most cheaply. Exact ties go to the lower level.
    pub fn find_next_power_up(&self, i: usize, k: usize, mu: i64) -> PowerUpDecision {
        let server_type = &self.server_types[i];

        let Some(p) = (k + 1..self.demand_profile.len()).find(|&p| self.d.get(i, p) >= mu + 1) else {
            return PowerUpDecision::PowerDown { level: server_type.sigma() };
        };

        let mut level = 1;
        let mut best_cost = self.level_cost(i, level, k, p);

        for j in server_type.idle_levels().skip(1) {
            let cost = self.level_cost(i, j, k, p);

            if cost < best_cost {
                best_cost = cost;
                level = j;
            }
        }

        PowerUpDecision::Batch { until: p, level }
    }

    fn build_server_type(&self, schedule: &mut Schedule<'a>, i: usize) {
        let name = &self.server_types[i].name;

        for k in self.demand_profile.breakpoints() {
            schedule.commit(i, k, self.d.get(i, k), ACTIVE_LEVEL);

            let previous = self.d.previous(i, k);
            let mut mu = self.d.get(i, k);

            while mu < previous {
                match self.find_next_power_up(i, k, mu) {
                    PowerUpDecision::Batch { until, level } => {
                        let new_mu = previous.min(self.d.get(i, until));

                        log::debug!(
                            "Server type '{}': {} servers idle in level {} from breakpoint {} until {}.",
                            name,
                            new_mu - mu,
                            level,
                            k,
                            until
                        );

                        for q in k..until {
                            schedule.commit(i, q, new_mu - mu, level);
                        }

                        mu = new_mu;
                    }
                    PowerUpDecision::PowerDown { level } => {
                        log::debug!("Server type '{}': {} servers drop into level {} at breakpoint {}.", name, previous - mu, level, k);

                        mu = previous;
                    }
                }
            }
        }
    }

    /// Builds and validates the ledger for all server types.
    pub fn build(&self) -> Result<Schedule<'a>> {
        let mut schedule = Schedule::new(self.server_types, self.demand_profile, self.d.clone());

        for i in self.server_types.indices() {
            self.build_server_type(&mut schedule, i);
        }

        schedule.check_feasible()?;

        log::info!(
            "Constructed schedule for {} server types over {} breakpoints with total energy {:.4}.",
            self.server_types.len(),
            self.demand_profile.len(),
            schedule.total_energy()
        );

        Ok(schedule)
    }
}

/// Turns the per-breakpoint server counts `d` into an energy-aware power-state schedule.
///
/// Fails with [`Error::ScheduleInfeasible`] if the resulting ledger does not serve exactly `d`
/// or exceeds a type's unit count, which only happens for inconsistent inputs.
pub fn construct_schedule<'a>(server_types: &'a ServerTypes, demand_profile: &'a DemandProfile, d: &TargetAllocation) -> Result<Schedule<'a>> {
    ScheduleBuilder::new(server_types, demand_profile, d)?.build()
}
