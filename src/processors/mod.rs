//! File discovery and translation pipeline stages

pub mod batch;
pub mod discovery;
pub mod xml;
