use anyhow::Context;
use clap::Parser;

use dpm_schedule::domain::algorithm::flow_based_algorithm_with_config;
use dpm_schedule::domain::solver::solver_type::SolverType;
use dpm_schedule::domain::utils::report::ScheduleReport;
use dpm_schedule::{load_instance, logger};

#[derive(Parser)]
#[command(author, version, about = "Plans energy-minimal power states for a heterogeneous server farm", long_about = None)]
struct Cli {
    /// Instance JSON file describing server types and demand
    #[arg(long)]
    instance: String,

    /// Fractional relaxation to solve: `flow` or `direct`. Overrides the instance file.
    #[arg(long)]
    solver: Option<SolverType>,

    /// Coverage tolerance of the flow cross-check. Overrides the instance file.
    #[arg(long)]
    tolerance: Option<f64>,

    /// Write the residency table to this CSV file
    #[arg(long)]
    report: Option<String>,

    /// Write the run table to this CSV file
    #[arg(long)]
    runs: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init();

    let instance = load_instance(&cli.instance).with_context(|| format!("loading instance '{}'", cli.instance))?;

    let mut config = instance.config;
    if let Some(solver_type) = cli.solver {
        config.solver_type = solver_type;
    }
    if let Some(tolerance) = cli.tolerance {
        config.coverage_tolerance = tolerance;
    }

    let (schedule, fractional_cost) = flow_based_algorithm_with_config(&instance.server_types, &instance.demand_profile, &config)
        .with_context(|| format!("planning instance '{}'", instance.name))?;

    println!("Instance:        {}", instance.name);
    println!("Solver:          {}", config.solver_type);
    println!("Fractional cost: {:.4}", fractional_cost);
    println!("Total energy:    {:.4}", schedule.total_energy());
    println!("  running:       {:.4}", schedule.running_energy());
    println!("  power-up:      {:.4}", schedule.power_up_energy());

    for (i, server_type) in instance.server_types.iter().enumerate() {
        println!("  {:<20} peak active {:>4} of {}", server_type.name.as_str(), schedule.peak_active(i), server_type.max_units());
    }

    let report = ScheduleReport::new(&schedule);

    if let Some(path) = &cli.report {
        report.write_residency_file(path).with_context(|| format!("writing residency report '{}'", path))?;
    }
    if let Some(path) = &cli.runs {
        report.write_runs_file(path).with_context(|| format!("writing run report '{}'", path))?;
    }

    Ok(())
}
