pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod parsing;
pub mod resolver;
pub mod store;
pub mod types;

pub use config::Settings;
pub use error::{Result, RoamError};
pub use store::Store;
