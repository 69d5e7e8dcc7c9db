use crate::api::instance_dto::InstanceDto;
use crate::domain::instance::Instance;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Reads a provisioning instance from a JSON file and builds its domain model.
pub fn load_instance(file_path: &str) -> Result<Instance> {
    let instance_dto: InstanceDto = parse_json_file::<InstanceDto>(file_path)?;
    log::info!("JSON file '{}' parsed successfully.", file_path);

    let instance = Instance::try_from(instance_dto)?;
    log::info!("Instance '{}' constructed successfully.", instance.name);

    Ok(instance)
}
