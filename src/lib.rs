pub mod clienv;
pub mod config;
pub mod error;
pub mod installer;
pub mod layout;
pub mod lifecycle;
pub mod ownership;
pub mod provision;

pub use config::{ConfigurationSet, Role};
pub use error::{NodeError, Result};
pub use lifecycle::{NodeController, NodeStatus};
