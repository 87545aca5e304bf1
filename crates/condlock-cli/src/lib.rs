// condlock-cli: lock and unlock named keys from the command line

pub mod app;
pub mod cli;
pub mod logging;
pub mod settings;

pub use app::{execute, run};
pub use cli::{Cli, Command};
pub use settings::Settings;
