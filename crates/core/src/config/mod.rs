pub mod app_config;
pub mod integrations;
pub mod sources;
pub mod validation;

pub use app_config::*;
pub use integrations::*;
pub use sources::*;
pub use validation::*;
