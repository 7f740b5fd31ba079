use thiserror::Error;

/// Failures of the growth model itself. Cloneable so a run can carry them in its status.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Invalid initial parameters: {0}")]
    InvalidParameters(String),

    #[error("Response curve '{0}' has no control points")]
    EmptyCurve(&'static str),

    #[error("Response curve '{0}' is not strictly increasing in x")]
    UnorderedCurve(&'static str),

    #[error("Preset field '{0}' is not a finite number")]
    NonFiniteParameter(&'static str),

    #[error("Run would take {requested} steps, more than the limit of {limit}")]
    TooManySteps { requested: usize, limit: usize },
}

#[derive(Debug, Error)]
pub enum MycoforgeError {
    #[error("No parameter preset was provided for the simulation")]
    PresetNotDefined,

    #[error("Preset '{0}' not found")]
    PresetNotFound(String),

    #[error("Preset '{0}' is invalid: {1}")]
    InvalidPreset(String, #[source] ModelError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("An error occurred during logging: {0}")]
    LoggingError(#[from] anyhow::Error),
}
