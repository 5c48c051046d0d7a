//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod aggregate;
pub mod input;
pub mod models;
pub mod size;
pub mod utils;

// Re-export main command functions
pub use aggregate::{build_report, execute_aggregate};
pub use input::{load_input, TraceInput};
pub use models::{AggregateArgs, SizeArgs};
pub use size::{execute_size, measure_input};
pub use utils::display_version;
