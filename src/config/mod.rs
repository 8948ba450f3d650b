mod loader;
mod types;

pub use loader::{load_launch_config, CONFIG_FILE_NAME};
pub use types::{LaunchConfiguration, DEFAULT_PORT};
