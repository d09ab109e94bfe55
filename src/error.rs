use thiserror::Error;

#[derive(Debug, Error)]
pub enum FluencyError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl FluencyError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_message_is_rendered() {
        let err = FluencyError::invalid_input("medium threshold above high");
        assert_eq!(err.to_string(), "invalid input: medium threshold above high");
    }

    #[test]
    fn io_error_carries_context() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = FluencyError::io("read engine config", source);
        assert!(err.to_string().starts_with("I/O error while read engine config"));
    }
}
