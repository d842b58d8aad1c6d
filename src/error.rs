use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocgrepError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid search pattern '{term}': {source}")]
    InvalidPattern {
        term: String,
        #[source]
        source: regex::Error,
    },

    #[error("File is corrupt or protected: {0}")]
    CorruptOrProtected(PathBuf),

    #[error("File is corrupt or locked by another application: {0}")]
    CorruptOrLocked(PathBuf),

    #[error("Archive may be encrypted: {0}")]
    EncryptedArchive(PathBuf),

    #[error("Failed to extract entry '{entry}' from archive '{archive}': {source}")]
    ArchiveEntry {
        entry: String,
        archive: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Archive tool unavailable: {0}")]
    ArchiveTool(String),

    #[error("Failed to process file '{path}': {source}")]
    FileProcessing {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("An unexpected error occurred: {0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DocgrepError>;

/// Classifies a container that failed to parse. Office and OpenDocument
/// applications leave `~$`-prefixed lock files next to open documents, so a
/// path with that marker is reported as locked rather than protected.
pub fn corrupt_container(path: &std::path::Path) -> DocgrepError {
    let locked = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("~$"))
        .unwrap_or(false);
    if locked {
        DocgrepError::CorruptOrLocked(path.to_path_buf())
    } else {
        DocgrepError::CorruptOrProtected(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn lock_file_marker_selects_locked_variant() {
        let err = corrupt_container(Path::new("/tmp/~$report.docx"));
        assert!(matches!(err, DocgrepError::CorruptOrLocked(_)));

        let err = corrupt_container(Path::new("/tmp/report.docx"));
        assert!(matches!(err, DocgrepError::CorruptOrProtected(_)));
    }
}
