mod codes;

pub use codes::ExitCode;

use crate::history::HistoryError;
use crate::revert::RevertError;
use crate::scanner::ScannerError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end the whole run
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Target directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("History file error: {message}")]
    HistoryError {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("Revert failed: {message}")]
    RevertError { message: String },

    #[error("Interrupted")]
    Interrupted,

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::DirectoryNotFound { .. } => ExitCode::DirectoryNotFound,
            AppError::NotADirectory { .. } => ExitCode::DirectoryNotFound,
            AppError::PermissionDenied { .. } => ExitCode::PermissionError,
            AppError::InvalidArgument { .. } => ExitCode::InvalidArguments,
            AppError::HistoryError { .. } => ExitCode::HistoryError,
            AppError::RevertError { .. } => ExitCode::RevertError,
            AppError::Interrupted => ExitCode::Interrupted,
            AppError::Other(_) => ExitCode::GeneralError,
        }
    }

    pub fn detailed_message(&self) -> String {
        match self {
            AppError::DirectoryNotFound { path } => {
                format!(
                    "The specified directory does not exist:\n  {}\n\n\
                     Please verify the path and try again.",
                    path.display()
                )
            }

            AppError::NotADirectory { path } => {
                format!(
                    "The specified path is not a directory:\n  {}\n\n\
                     Please provide the folder that holds the episodes.",
                    path.display()
                )
            }

            AppError::PermissionDenied { path } => {
                format!(
                    "Permission denied when accessing:\n  {}\n\n\
                     Please check file permissions or run with appropriate privileges.",
                    path.display()
                )
            }

            AppError::InvalidArgument { message } => {
                format!("{}\n\nRun with --help to see the accepted values.", message)
            }

            AppError::HistoryError { path, message } => {
                let path_info = path
                    .as_ref()
                    .map(|p| format!("File: {}\n", p.display()))
                    .unwrap_or_default();

                format!(
                    "History file error:\n  {}\n{}\n\
                     Ensure the history file exists and is valid JSON.",
                    message, path_info
                )
            }

            AppError::RevertError { message } => {
                format!(
                    "Could not revert the recorded renames:\n  {}\n\n\
                     Files may have been moved since the history was written.",
                    message
                )
            }

            AppError::Interrupted => {
                "Interrupted before all files were processed.\n\
                 Files already renamed keep their new names."
                    .to_string()
            }

            AppError::Other(message) => message.clone(),
        }
    }
}

impl From<ScannerError> for AppError {
    fn from(err: ScannerError) -> Self {
        match err {
            ScannerError::PathNotFound(path) => AppError::DirectoryNotFound { path },
            ScannerError::NotADirectory(path) => AppError::NotADirectory { path },
            ScannerError::PermissionDenied(path) => AppError::PermissionDenied { path },
            ScannerError::IoError(e) => AppError::Other(format!("I/O error: {}", e)),
        }
    }
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        AppError::HistoryError {
            path: err.path().map(PathBuf::from),
            message: err.to_string(),
        }
    }
}

impl From<RevertError> for AppError {
    fn from(err: RevertError) -> Self {
        match err {
            RevertError::History(e) => e.into(),
            other => AppError::RevertError {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let err = AppError::DirectoryNotFound {
            path: PathBuf::from("/test"),
        };
        assert_eq!(err.exit_code(), ExitCode::DirectoryNotFound);

        let err = AppError::PermissionDenied {
            path: PathBuf::from("/test"),
        };
        assert_eq!(err.exit_code(), ExitCode::PermissionError);

        assert_eq!(AppError::Interrupted.exit_code(), ExitCode::Interrupted);
        assert_eq!(
            AppError::Other("boom".into()).exit_code(),
            ExitCode::GeneralError
        );
    }

    #[test]
    fn test_detailed_message_includes_context() {
        let err = AppError::HistoryError {
            path: Some(PathBuf::from("/tv/history.json")),
            message: "Invalid JSON".to_string(),
        };

        let msg = err.detailed_message();
        assert!(msg.contains("Invalid JSON"));
        assert!(msg.contains("/tv/history.json"));
    }

    #[test]
    fn test_scanner_error_conversion() {
        let scanner_err = ScannerError::PathNotFound(PathBuf::from("/missing"));
        let app_err: AppError = scanner_err.into();
        assert_eq!(app_err.exit_code(), ExitCode::DirectoryNotFound);
    }

    #[test]
    fn test_revert_error_conversion() {
        let err: AppError = RevertError::ValidationFailed("a.mkv missing".into()).into();
        assert_eq!(err.exit_code(), ExitCode::RevertError);

        let err: AppError = RevertError::History(HistoryError::ReadError {
            path: PathBuf::from("/x.json"),
            message: "Invalid JSON".into(),
        })
        .into();
        assert_eq!(err.exit_code(), ExitCode::HistoryError);
    }
}
