use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("No files for year {year} found in '{dir}'")]
    NoInputFiles { dir: PathBuf, year: i32 },

    #[error("Invalid file pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to read directory '{0}'")]
    ReadDir(PathBuf, #[source] std::io::Error),

    #[error("Failed to check for existing file '{0}'")]
    ExistenceCheck(PathBuf, #[source] std::io::Error),

    #[error("Failed to run '{program}'. Is it installed?")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}
