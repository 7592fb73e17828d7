pub type RasterResult<T> = Result<T, RasterError>;

#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    /// Input bytes or buffer could not be interpreted as an image.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("validation error: {0}")]
    Validation(String),

    /// No pixel passed the content alpha threshold.
    #[error("empty content: no pixel above the alpha threshold")]
    EmptyContent,

    #[error("budget unsatisfiable: {actual} bytes at floor quality exceeds budget of {budget} bytes")]
    BudgetUnsatisfiable { budget: usize, actual: usize },

    #[error("partial packaging failure: {failed} of {total} assets skipped")]
    PartialPackaging { failed: usize, total: usize },

    #[error("archive error: {0}")]
    Archive(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RasterError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Whether a pipeline stage may recover from this error locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EmptyContent | Self::BudgetUnsatisfiable { .. } | Self::PartialPackaging { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(RasterError::decode("x").to_string().contains("decode error:"));
        assert!(RasterError::encode("x").to_string().contains("encode error:"));
        assert!(
            RasterError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(RasterError::archive("x").to_string().contains("archive error:"));
    }

    #[test]
    fn recoverable_taxonomy() {
        assert!(RasterError::EmptyContent.is_recoverable());
        assert!(
            RasterError::BudgetUnsatisfiable {
                budget: 10,
                actual: 20
            }
            .is_recoverable()
        );
        assert!(RasterError::PartialPackaging { failed: 1, total: 3 }.is_recoverable());
        assert!(!RasterError::decode("bad").is_recoverable());
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = RasterError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
