//! Trace input files.
//!
//! An input file is a JSON object with two optional lists: `traces`
//! (invocation trees, or flat invocation records) and `records`
//! (standalone measurements such as HTTP samples).
//!
//! Nested input is parsed on a growing stack, so tree depth is limited by
//! the configured `max_depth` rather than by the JSON parser.

use crate::model::MeasurementRecord;
use crate::trace::{assemble, relink, InvocationTrace};
use crate::utils::error::InputError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Deserializer;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Parsed contents of a trace input file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceInput {
    #[serde(default)]
    pub traces: Vec<InvocationTrace>,

    #[serde(default)]
    pub records: Vec<MeasurementRecord>,
}

impl TraceInput {
    /// Link flat invocation records into trees
    pub fn assembled(mut self, max_depth: usize) -> Result<Self, InputError> {
        let records = std::mem::take(&mut self.traces);
        self.traces = assemble(records, max_depth)?;
        Ok(self)
    }

    /// Recompute parent links and counts of trees read in nested form
    pub fn relinked(mut self, max_depth: usize) -> Result<Self, InputError> {
        self.traces = std::mem::take(&mut self.traces)
            .into_iter()
            .map(|tree| relink(tree, max_depth))
            .collect::<Result<_, _>>()?;
        Ok(self)
    }
}

/// Read a trace input file
///
/// With `flat` set, `traces` holds one record per call and is assembled
/// into trees before returning. Otherwise every tree is relinked.
///
/// # Errors
/// * `InputError::ReadFailed` - file cannot be opened
/// * `InputError::JsonError` - file is not a valid trace input
/// * `InputError::InvalidTrace` - flat records do not form a forest, or a
///   tree nests deeper than `max_depth`
pub fn load_input(path: impl AsRef<Path>, flat: bool, max_depth: usize) -> Result<TraceInput, InputError> {
    let path = path.as_ref();
    debug!("Reading trace input from: {}", path.display());

    let file = File::open(path)?;
    let mut json = Deserializer::from_reader(BufReader::new(file));
    json.disable_recursion_limit();
    let input = TraceInput::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;

    info!(
        "Loaded {} {} and {} standalone records",
        input.traces.len(),
        if flat { "invocation records" } else { "traces" },
        input.records.len()
    );

    if flat {
        input.assembled(max_depth)
    } else {
        input.relinked(max_depth)
    }
}
