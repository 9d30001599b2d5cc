pub mod cli;
pub mod explorer;
mod http;
pub mod load_config;
pub mod platform;

pub use cli::{run, Cli, Commands};
