//! Invocation traces: call trees recorded per request.
//!
//! This module handles:
//! - The owned tree model (`InvocationTrace`)
//! - Own, nested and exclusive duration attribution
//! - Assembling trees from flat agent records and relinking nested input
//! - Extracting samples from a tree for aggregation

pub mod builder;
pub mod duration;
pub mod extract;
pub mod invocation;

// Re-export main types and functions
pub use builder::{assemble, relink};
pub use duration::{exclusive_duration, nested_duration, own_duration, synthetic_timer};
pub use extract::{extract_samples, ExtractedSamples};
pub use invocation::{Descendants, InvocationTrace};
