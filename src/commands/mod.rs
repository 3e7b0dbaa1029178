//! Command implementations.

pub mod kernel;
pub mod provision;
pub mod run;
