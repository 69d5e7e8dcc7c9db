use std::fs::File;
use std::io::Write;

use serde::Serialize;

use crate::domain::schedule::Schedule;
use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResidencyRow<'r> {
    server_type: &'r str,
    breakpoint: usize,
    start: f64,
    end: f64,
    level: usize,
    count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RunRow<'r> {
    server_type: &'r str,
    level: usize,
    start_breakpoint: usize,
    end_breakpoint: usize,
    count: i64,
    energy: f64,
}

/// Writes a validated schedule as `;`-separated tables.
pub struct ScheduleReport<'s, 'a> {
    schedule: &'s Schedule<'a>,
}

impl<'s, 'a> ScheduleReport<'s, 'a> {
    pub fn new(schedule: &'s Schedule<'a>) -> Self {
        ScheduleReport { schedule }
    }

    /// One row per non-zero ledger cell, ordered by server type, breakpoint and level.
    pub fn write_residency<W: Write>(&self, writer: W) -> Result<()> {
        let server_types = self.schedule.server_types();
        let demand_profile = self.schedule.demand_profile();
        let mut csv_wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

        for (i, server_type) in server_types.iter().enumerate() {
            for k in demand_profile.breakpoints() {
                for level in 0..server_type.num_levels() {
                    let count = self.schedule.residency(i, k, level);
                    if count == 0 {
                        continue;
                    }

                    csv_wtr.serialize(ResidencyRow {
                        server_type: server_type.name.as_str(),
                        breakpoint: k,
                        start: demand_profile.t(k),
                        end: demand_profile.t(k + 1),
                        level,
                        count,
                    })?;
                }
            }
        }

        csv_wtr.flush()?;
        Ok(())
    }

    /// One row per run, with the energy it contributes to the schedule's total.
    pub fn write_runs<W: Write>(&self, writer: W) -> Result<()> {
        let server_types = self.schedule.server_types();
        let mut csv_wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

        for run in self.schedule.runs() {
            csv_wtr.serialize(RunRow {
                server_type: server_types[run.server_type].name.as_str(),
                level: run.level,
                start_breakpoint: run.start,
                end_breakpoint: run.end,
                count: run.count,
                energy: self.schedule.run_energy(&run),
            })?;
        }

        csv_wtr.flush()?;
        Ok(())
    }

    pub fn write_residency_file(&self, file_path: &str) -> Result<()> {
        log::info!("Writing residency report to '{}'.", file_path);
        self.write_residency(File::create(file_path)?)
    }

    pub fn write_runs_file(&self, file_path: &str) -> Result<()> {
        log::info!("Writing run report to '{}'.", file_path);
        self.write_runs(File::create(file_path)?)
    }
}
