use thiserror::Error;

/// Errors of the pipeline-description layer.
///
/// These cover validation of a textual description only. Once a pipeline is
/// validly constructed there is no recoverable error category: configuring an
/// invalid pass or violating the frozen precondition is fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed pipeline description: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate stage name {name:?}")]
    DuplicateStage { name: String },
    #[error("stage {stage:?} references unknown pass {pass:?}")]
    UnknownPass { stage: String, pass: String },
}
