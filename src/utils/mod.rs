pub mod config;
pub mod harvest_toml;
pub mod logger;

pub use config::*;
pub use harvest_toml::{apply_file_to_opts, load_harvest_toml, parse_harvest_toml};
pub use logger::setup_logging;
