use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The caller omitted or blanked a required field.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider answered, but the payload could not be interpreted.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The provider could not resolve the symbol (unknown ticker, transport, timeout).
    #[error("Provider error: {0}")]
    ProviderFailure(String),

    /// The ticker-list collaborator could not be reached at all.
    #[error("Ticker source unreachable: {0}")]
    SourceUnreachable(String),
}

impl AnalysisError {
    /// Stable snake_case tag for API consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::InvalidInput(_) => "invalid_input",
            AnalysisError::InvalidData(_) => "invalid_data",
            AnalysisError::ProviderFailure(_) => "provider_failure",
            AnalysisError::SourceUnreachable(_) => "source_unreachable",
        }
    }

    /// The message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            AnalysisError::InvalidInput(msg)
            | AnalysisError::InvalidData(msg)
            | AnalysisError::ProviderFailure(msg)
            | AnalysisError::SourceUnreachable(msg) => msg,
        }
    }

    /// Collapse any fault raised by a provider into `ProviderFailure`.
    ///
    /// The message of a non-provider variant is kept with its prefix so the
    /// caller can still tell a malformed payload from an unknown symbol.
    pub fn into_provider_failure(self) -> Self {
        match self {
            AnalysisError::ProviderFailure(msg) => AnalysisError::ProviderFailure(msg),
            other => AnalysisError::ProviderFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_data_becomes_provider_failure() {
        let err = AnalysisError::InvalidData("missing chart result".into());
        assert_eq!(
            err.into_provider_failure(),
            AnalysisError::ProviderFailure("Invalid data: missing chart result".into())
        );
    }

    #[test]
    fn test_kind_and_message() {
        let err = AnalysisError::InvalidInput("Symbol not provided".into());
        assert_eq!(err.kind(), "invalid_input");
        assert_eq!(err.message(), "Symbol not provided");
        assert_eq!(err.to_string(), "Invalid input: Symbol not provided");
        assert_eq!(
            AnalysisError::SourceUnreachable("down".into()).kind(),
            "source_unreachable"
        );
    }

    #[test]
    fn test_provider_failure_message_is_untouched() {
        let err = AnalysisError::ProviderFailure("BADSYM.NS: Quote not found".into());
        assert_eq!(err.clone().into_provider_failure(), err);
    }
}
