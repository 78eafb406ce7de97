use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while tailing a log file
#[derive(Debug, Error)]
pub enum TailError {
    #[error("log file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied reading {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TailError {
    /// Classify an I/O error raised for `path`
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Errors worth retrying after a backoff once a session is running
    ///
    /// At open time every error is fatal to that attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::PermissionDenied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_maps_kinds() {
        let path = Path::new("/var/log/kodi.log");
        let err = TailError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, TailError::NotFound(_)));
        assert!(!err.is_transient());

        let err = TailError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, TailError::PermissionDenied(_)));

        let err = TailError::from_io(path, io::Error::other("disk hiccup"));
        assert!(err.is_transient());
        assert!(err.to_string().contains("disk hiccup"));
    }
}
