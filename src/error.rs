use std::io;

use thiserror::Error;

/// Recoverable failures of a single transfer item.
///
/// None of these stop the dashboard; they are rendered into the output pane
/// through their `Display` text.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{tool} not found. Install {tool} and ensure it is on PATH.")]
    ToolNotFound { tool: String },

    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write log file: {path} ({source})")]
    LogFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Lost track of {tool}: {source}")]
    Wait {
        tool: String,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    /// Classify a spawn failure, separating a missing binary from other errors.
    pub fn from_spawn(tool: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            TransferError::ToolNotFound { tool: tool.to_string() }
        } else {
            TransferError::Spawn { tool: tool.to_string(), source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = TransferError::from_spawn("rclone", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.to_string(), "rclone not found. Install rclone and ensure it is on PATH.");
    }

    #[test]
    fn test_other_spawn_error_keeps_reason() {
        let err = TransferError::from_spawn("rclone", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, TransferError::Spawn { .. }));
        assert!(err.to_string().starts_with("Failed to start rclone:"));
    }

    #[test]
    fn test_log_file_message_names_path() {
        let err = TransferError::LogFile {
            path: "/var/log/rclone_tui.log".to_string(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("Cannot write log file: /var/log/rclone_tui.log"));
    }
}
