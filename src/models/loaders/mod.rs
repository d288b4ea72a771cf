pub mod toml_loader;

pub use toml_loader::{load_toml_to_raw_test, parse_raw_test};
