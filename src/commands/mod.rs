pub mod check;
pub mod common;
pub mod config;
pub mod probe;
pub mod run;

// Re-export command functions
pub use check::cmd_check;
pub use config::cmd_config;
pub use probe::cmd_probe;
pub use run::cmd_run;
