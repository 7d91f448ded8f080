//! Error taxonomy for the analysis pipeline.
//!
//! Failures from the source adapters and the oracle client propagate with
//! their reason intact. Malformed oracle replies never reach this module;
//! the recovery layer absorbs them (see [`crate::recovery`]).

use thiserror::Error;

use crate::connector_git::FetchError;
use crate::oracle::OracleError;

/// Coarse classification a caller can map onto a status or exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input itself cannot be analyzed (client fault, never retried).
    InputShape,
    /// Fetching the input failed (client fault, derived from the fetcher).
    Infrastructure,
    /// The input was fine but the oracle could not be used (upstream fault).
    Oracle,
    Internal,
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("No analysis-supported source files found in the repository.")]
    NoAnalyzableFiles,

    #[error("{0}")]
    EmptyDocument(String),

    #[error("Input not found: {0}")]
    SourceNotFound(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("LLM request failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalyzeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyzeError::NoAnalyzableFiles
            | AnalyzeError::EmptyDocument(_)
            | AnalyzeError::SourceNotFound(_) => ErrorKind::InputShape,
            AnalyzeError::Fetch(_) => ErrorKind::Infrastructure,
            AnalyzeError::Oracle(_) => ErrorKind::Oracle,
            AnalyzeError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::InputShape | ErrorKind::Infrastructure => 2,
            ErrorKind::Oracle => 3,
            ErrorKind::Internal => 1,
        }
    }
}

impl From<tokio::task::JoinError> for AnalyzeError {
    fn from(err: tokio::task::JoinError) -> Self {
        AnalyzeError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_exit_codes() {
        assert_eq!(AnalyzeError::NoAnalyzableFiles.exit_code(), 2);
        assert_eq!(
            AnalyzeError::Fetch(FetchError::GitUnavailable).kind(),
            ErrorKind::Infrastructure
        );
        assert_eq!(
            AnalyzeError::Oracle(OracleError::MissingCredential).exit_code(),
            3
        );
        assert_eq!(AnalyzeError::Internal("boom".into()).exit_code(), 1);
    }

    #[test]
    fn fetch_reason_is_preserved() {
        let err = AnalyzeError::from(FetchError::RepositoryNotFound(
            "https://github.com/acme/private".into(),
        ));
        assert!(err.to_string().contains("acme/private"));
    }
}
