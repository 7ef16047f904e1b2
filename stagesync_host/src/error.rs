use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("heater '{0}' sensor unavailable")]
    SensorUnavailable(String),
    #[error("script rejected: {0}")]
    Rejected(String),
    #[error("malformed command at line {line}: {text}")]
    Malformed { line: usize, text: String },
    #[error("unknown heater '{0}'")]
    UnknownHeater(String),
}

pub type Result<T> = std::result::Result<T, HostError>;
