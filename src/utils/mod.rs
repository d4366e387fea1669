pub mod config;
pub mod logger;
pub mod mbtree_toml;

pub use config::*;
pub use logger::{Colors, setup_logging};
pub use mbtree_toml::{MbtreeToml, apply_file_to_opts, load_mbtree_toml, parse_mbtree_toml};
