//! CLI command implementations.

mod analyze;
mod cache;
mod config;
mod creator;
mod doctor;

pub use analyze::run_analyze;
pub use cache::run_cache;
pub use config::run_config;
pub use creator::{run_batch, run_creator};
pub use doctor::run_doctor;
