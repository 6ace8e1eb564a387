use thiserror::Error;

/// Scoring failures. Signal extraction itself never fails (missing related
/// data degrades to zero); the only hard error is an entry whose content
/// snapshot cannot be resolved at all, which must not be scored as an
/// all-zero item.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("feed entry {0} has no resolvable content item")]
    MissingItem(i64),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid scoring config: {0}")]
    Invalid(String),
}
