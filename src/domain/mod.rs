pub mod algorithm;
pub mod demand_profile;
pub mod instance;
pub mod schedule;
pub mod server_type;
pub mod solver;
pub mod target_allocation;
pub mod utils;
