//! Utility modules

pub mod time;

pub use time::RunContext;
