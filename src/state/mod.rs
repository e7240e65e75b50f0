pub mod board;
pub mod types;

pub use board::{DimensionReport, StatusBoard};
pub use types::{Dimension, ReconcileOutcome, Status};
