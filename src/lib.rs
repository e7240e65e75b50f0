pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod health;
pub mod monitor;
pub mod process;
pub mod readiness;
pub mod reconcile;
pub mod reporter;
pub mod state;
pub mod window;

// Re-export core types for convenience
pub use config::Config;
pub use engine::{LaunchMode, Platform};
pub use error::ReconcileError;
pub use monitor::Monitor;
pub use reconcile::{PassMode, Reconciler};
pub use state::{Dimension, ReconcileOutcome, Status};
