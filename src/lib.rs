//! nbenv - Notebook environment provisioning CLI
//!
//! Builds pyenv-pinned virtual environments from YAML specs, registers them
//! as Jupyter kernels, and runs notebooks inside them with papermill.

pub mod commands;
pub mod config;
pub mod error;
pub mod kernel;
pub mod logging;
pub mod notebook;
pub mod process;
pub mod provision;
pub mod spec;
pub mod tools;
pub mod version;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use error::{NbenvError, Result};
