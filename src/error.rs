use std::fmt;

/// Result type for signalq operations
pub type Result<T> = std::result::Result<T, TrafficError>;

/// Main error type for the signal-control trainer
#[derive(Debug, Clone)]
pub enum TrafficError {
    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter or configuration value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// A required external tool or variable could not be located
    EnvironmentMissing(String),

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),

    /// The simulator rejected a command or spoke an unexpected protocol
    SimulatorError(String),

    /// The simulator did not answer within the configured wait
    SimulatorTimeout(String),

    /// Numerical computation errors
    NumericalError(String),

    /// Sampling asked for more transitions than memory holds
    InsufficientSamples {
        requested: usize,
        available: usize,
    },

    /// Invalid action
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Rendering a run artifact failed
    PlotError(String),
}

impl fmt::Display for TrafficError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrafficError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            TrafficError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            TrafficError::EnvironmentMissing(msg) => write!(f, "Environment missing: {}", msg),
            TrafficError::IoError(msg) => write!(f, "IO error: {}", msg),
            TrafficError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            TrafficError::SimulatorError(msg) => write!(f, "Simulator error: {}", msg),
            TrafficError::SimulatorTimeout(msg) => write!(f, "Simulator timeout: {}", msg),
            TrafficError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            TrafficError::InsufficientSamples { requested, available } => {
                write!(
                    f,
                    "Insufficient samples: requested {}, memory holds {}",
                    requested, available
                )
            }
            TrafficError::InvalidAction { action, max_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, max_actions)
            }
            TrafficError::PlotError(msg) => write!(f, "Plot error: {}", msg),
        }
    }
}

impl std::error::Error for TrafficError {}

impl From<std::io::Error> for TrafficError {
    fn from(err: std::io::Error) -> Self {
        TrafficError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for TrafficError {
    fn from(err: bincode::Error) -> Self {
        TrafficError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for TrafficError {
    fn from(err: serde_json::Error) -> Self {
        TrafficError::SerializationError(err.to_string())
    }
}

impl From<image::ImageError> for TrafficError {
    fn from(err: image::ImageError) -> Self {
        TrafficError::PlotError(err.to_string())
    }
}

// Helper functions for common error patterns
impl TrafficError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        TrafficError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        TrafficError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for failures that mean the simulator session is unusable.
    pub fn is_simulator_failure(&self) -> bool {
        matches!(
            self,
            TrafficError::SimulatorError(_) | TrafficError::SimulatorTimeout(_)
        )
    }
}
