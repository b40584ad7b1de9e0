use thiserror::Error;

/// Main error type for the tuner.
#[derive(Error, Debug)]
pub enum TunerError {
    #[error("invalid value for {parameter}: {value} (allowed: {allowed})")]
    InvalidParameterValue {
        parameter: String,
        value: String,
        allowed: String,
    },

    #[error("no prior state to revert for {parameter}")]
    NoPriorState { parameter: String },

    #[error("baseline has not been calibrated")]
    UninitializedBaseline,

    #[error("evaluation failed for benchmark {benchmark}: {message}")]
    Evaluation { benchmark: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for tuner operations.
pub type TunerResult<T> = Result<T, TunerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_carries_context() {
        let err = TunerError::InvalidParameterValue {
            parameter: "page_size".into(),
            value: "12345".into(),
            allowed: "16384, 32768".into(),
        };
        assert!(err.to_string().contains("page_size"));
        assert!(err.to_string().contains("12345"));

        let err = TunerError::Evaluation {
            benchmark: "lhcb".into(),
            message: "generator exited with 1".into(),
        };
        assert!(err.to_string().contains("lhcb"));
        assert!(err.to_string().contains("generator"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TunerError = io.into();
        assert!(matches!(err, TunerError::Io(_)));
    }
}
