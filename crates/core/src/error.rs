use std::fmt;

/// Failure taxonomy for the advisory core.
///
/// `InvalidInput` is a caller mistake, `NumericalFailure` is a data-quality problem in the
/// asset universe, and `ExternalDataUnavailable` only ever describes the market feed (the
/// orchestrator degrades instead of failing on it).
#[derive(Debug, Clone, PartialEq)]
pub enum AdvisoryError {
    InvalidInput {
        field: &'static str,
        detail: String,
    },
    NumericalFailure {
        stage: &'static str,
        detail: String,
    },
    ExternalDataUnavailable {
        source: String,
        detail: String,
    },
}

pub type CoreResult<T> = Result<T, AdvisoryError>;

impl AdvisoryError {
    pub fn invalid(field: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            detail: detail.into(),
        }
    }

    pub fn numerical(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::NumericalFailure {
            stage,
            detail: detail.into(),
        }
    }

    pub fn unavailable(source: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ExternalDataUnavailable {
            source: source.into(),
            detail: detail.into(),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    pub fn is_numerical_failure(&self) -> bool {
        matches!(self, Self::NumericalFailure { .. })
    }
}

impl fmt::Display for AdvisoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { field, detail } => {
                write!(f, "invalid input (field={field}): {detail}")
            }
            Self::NumericalFailure { stage, detail } => {
                write!(f, "numerical failure (stage={stage}): {detail}")
            }
            Self::ExternalDataUnavailable { source, detail } => {
                write!(f, "external data unavailable (source={source}): {detail}")
            }
        }
    }
}

impl std::error::Error for AdvisoryError {}
