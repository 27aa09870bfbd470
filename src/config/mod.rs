//! Configuration module for gptbot
//!
//! Model settings come from a YAML file that may be absent; secrets and
//! paths come from the environment.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;
