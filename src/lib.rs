//! Shared fixtures for the workspace integration tests

pub mod graph;
pub mod logs;

pub use graph::{GraphSpec, Node};
pub use logs::LogCapture;
