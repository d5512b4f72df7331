//! Configuration for the activity engine
//!
//! `ActivityConfig` is declared with the `config_struct!` macro so every field
//! has its default next to its type, and TOML files only need the keys that
//! differ.

#[macro_use]
pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::ActivityConfig;
pub use utils::{
    load_config, load_config_from_path, load_config_from_str, save_config_to_path,
    CONFIG_FILE_PATH,
};
