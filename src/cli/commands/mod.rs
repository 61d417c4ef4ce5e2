mod config;
mod serve;

pub use config::{cmd_check_config, cmd_init_config};
pub use serve::cmd_serve;
