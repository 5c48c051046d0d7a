//! SQL statement execution samples.

use super::identity::SampleIdentity;
use super::timer::TimerSample;
use crate::sizing::{self, EstimatedSize, MemorySizer};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// Timing of one SQL statement, with the bound parameter values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlSample {
    pub timer: TimerSample,

    /// Statement text as issued, with `?` placeholders
    pub sql: String,

    /// Issued through a prepared statement
    #[serde(default)]
    pub prepared_statement: bool,

    /// Bound parameter values, in placeholder order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_values: Vec<String>,

    #[serde(skip)]
    rendered: OnceLock<String>,
}

impl SqlSample {
    pub fn new(timer: TimerSample, sql: impl Into<String>) -> Self {
        Self {
            timer,
            sql: sql.into(),
            prepared_statement: false,
            parameter_values: Vec::new(),
            rendered: OnceLock::new(),
        }
    }

    /// Sample for a prepared statement with bound parameters
    pub fn prepared(timer: TimerSample, sql: impl Into<String>, parameters: Vec<String>) -> Self {
        Self {
            prepared_statement: true,
            parameter_values: parameters,
            ..Self::new(timer, sql)
        }
    }

    /// Shortcut for a single execution of `sql`
    pub fn single(identity: SampleIdentity, sql: impl Into<String>, duration: f64) -> Self {
        Self::new(TimerSample::single(identity, duration), sql)
    }

    /// Statement text with every `?` replaced by its parameter value
    ///
    /// Placeholders without a bound value stay as `?`. Computed on first
    /// call and cached.
    pub fn rendered_sql(&self) -> &str {
        self.rendered
            .get_or_init(|| render(&self.sql, &self.parameter_values))
    }
}

fn render(sql: &str, parameters: &[String]) -> String {
    if parameters.is_empty() {
        return sql.to_string();
    }

    let mut out = String::with_capacity(sql.len() + parameters.iter().map(String::len).sum::<usize>());
    let mut values = parameters.iter();
    for c in sql.chars() {
        if c != '?' {
            out.push(c);
            continue;
        }
        match values.next() {
            Some(value) => out.push_str(value),
            None => out.push('?'),
        }
    }
    out
}

// The render cache is derived from the other fields and never compared.
impl PartialEq for SqlSample {
    fn eq(&self, other: &Self) -> bool {
        self.timer == other.timer
            && self.sql == other.sql
            && self.prepared_statement == other.prepared_statement
            && self.parameter_values == other.parameter_values
    }
}

impl Eq for SqlSample {}

impl Hash for SqlSample {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.timer.hash(state);
        self.sql.hash(state);
        self.prepared_statement.hash(state);
        self.parameter_values.hash(state);
    }
}

impl EstimatedSize for SqlSample {
    fn estimated_size(&self, sizer: &dyn MemorySizer, align: bool) -> u64 {
        let mut size = self.timer.estimated_size(sizer, false);
        // prepared flag; sql, parameter list, rendered text references
        size += sizer.primitive_sizes(1, 0, 0, 0, 3, 0);
        size += sizer.size_of_string(&self.sql);
        if !self.parameter_values.is_empty() {
            size += sizer.size_of_array(self.parameter_values.len());
            size += self
                .parameter_values
                .iter()
                .map(|p| sizer.size_of_string(p))
                .sum::<u64>();
        }
        sizing::finish(sizer, size, align)
    }
}
