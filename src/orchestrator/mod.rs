//! Orchestration layer.
//!
//! The facade that wires infrastructure, services and the workflow into the
//! operations UI code calls, plus concurrent fan-out over multiple files.

pub mod pipeline;

pub use pipeline::QuizPipeline;
