//! Error types for sloctally.

use std::path::PathBuf;

use crate::analysis::AnalysisError;
use crate::output::OutputError;
use crate::walker::WalkError;

/// Top-level error type for sloctally operations.
#[derive(Debug, thiserror::Error)]
pub enum SloctallyError {
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("configuration error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Map an error to its exit code.
pub fn exit_code(error: &SloctallyError) -> i32 {
    match error {
        SloctallyError::PathNotFound(_) => 3,
        SloctallyError::Walk(WalkError::NotFound { .. }) => 3,
        SloctallyError::Walk(WalkError::PermissionDenied { .. }) => 4,
        SloctallyError::Walk(WalkError::InvalidPattern { .. }) => 2,
        SloctallyError::Walk(WalkError::Io { .. }) => 1,
        SloctallyError::Analysis(_) => 2,
        SloctallyError::Output(_) => 1,
    }
}
