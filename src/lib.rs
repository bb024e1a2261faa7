pub mod assemble;
pub mod config;
pub mod error;
pub mod fetch;
pub mod query;
pub mod series;

pub use config::Config;
pub use error::PipelineError;
pub use series::DatasetRegistry;
