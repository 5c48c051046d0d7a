use std::path::PathBuf;

/// Arguments for the aggregate command
#[derive(Debug, Clone)]
pub struct AggregateArgs {
    /// Trace input JSON file
    pub input: PathBuf,

    /// Input traces are flat records linked by parent id
    pub flat: bool,

    /// Engine configuration TOML (optional)
    pub config: Option<PathBuf>,

    /// Output path for the JSON report
    pub output: PathBuf,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Keep only the N largest aggregates per table
    pub top: Option<usize>,
}

impl Default for AggregateArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("traces.json"),
            flat: false,
            config: None,
            output: PathBuf::from("report.json"),
            print_summary: false,
            top: None,
        }
    }
}

/// Arguments for the size command
#[derive(Debug, Clone)]
pub struct SizeArgs {
    /// Trace input JSON file
    pub input: PathBuf,

    /// Input traces are flat records linked by parent id
    pub flat: bool,

    /// Engine configuration TOML (optional)
    pub config: Option<PathBuf>,
}
