pub mod config;
pub mod errors;
pub mod format;
pub mod fsops;
pub mod logging;
pub mod media;
pub mod progress;
pub mod safety;

pub use config::Config;
pub use errors::SweepError;
