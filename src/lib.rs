// Library crate shared by the agent and check binaries and the integration
// tests.

pub mod agent;
pub mod api;
pub mod checks;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod params;
pub mod records;
pub mod section;
