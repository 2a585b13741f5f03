//! Scenario tests driving the full request → fetch → normalize pipeline.

pub(crate) mod frames;
