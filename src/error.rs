use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("Algorithm unavailable: {0}")]
    AlgorithmUnavailable(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}

impl HashError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        HashError::MalformedRecord(reason.into())
    }

    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        HashError::AlgorithmUnavailable(reason.into())
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, HashError::MalformedRecord(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_reason() {
        let err = HashError::malformed("expected 3 fields, found 2");
        assert_eq!(
            err.to_string(),
            "Malformed record: expected 3 fields, found 2"
        );

        let err = HashError::unavailable("PBKDF2 rejected output length");
        assert!(err.to_string().starts_with("Algorithm unavailable"));
    }

    #[test]
    fn test_is_malformed() {
        assert!(HashError::malformed("x").is_malformed());
        assert!(!HashError::unavailable("x").is_malformed());
    }
}
