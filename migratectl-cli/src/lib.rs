mod cli;
pub mod commands;
mod logging;

pub use cli::{Cli, CliError, main, run};
pub use logging::init_logging;
