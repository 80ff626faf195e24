//! CLI library components for the lookup table checker.

pub mod document;
pub mod logging;
pub mod pipeline;
