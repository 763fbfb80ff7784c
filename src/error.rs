//! Fatal errors.
//!
//! Anything that merely degrades a descriptor (an unknown option, a missing
//! source file, an unreadable include) is a [`Diagnostic`](crate::Diagnostic)
//! collected on the model instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for descriptor operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A master descriptor or foreign project file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output descriptor could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A foreign project file is not well-formed XML.
    #[error("{}: XML error: {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    /// No adapter understands this foreign project file.
    #[error("unsupported project format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("unknown option: {0}")]
    UnknownOption(String),

    /// A boolean option given something other than a boolean, or a value
    /// no quoting style can write back intact.
    #[error("invalid value for {option}: {value:?}")]
    InvalidValue { option: String, value: String },
}

impl Error {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
