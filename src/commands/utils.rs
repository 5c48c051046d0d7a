use crate::sizing::SizerProfile;
use crate::utils::config::{DEFAULT_MAX_TRACE_DEPTH, REPORT_SCHEMA_VERSION};

/// Display version information
pub fn display_version() {
    println!("apm-trace v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", REPORT_SCHEMA_VERSION);
    println!("Default memory model: {:?}", SizerProfile::default());
    println!("Default max trace depth: {}", DEFAULT_MAX_TRACE_DEPTH);
    println!();
    println!("Aggregates invocation traces and measurements into per-method, SQL, HTTP and exception summaries.");
}
