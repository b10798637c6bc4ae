// irpass-pipeline: ordered, named grouping of optimizer passes and the
// machinery to run them against a bound compilation unit.

pub mod config;
pub mod error;
pub mod pipeliner;

pub use config::{PipelineSpec, StageKind, StageSpec};
pub use error::ConfigError;
pub use pipeliner::{PassPipeliner, StageBuilder};
