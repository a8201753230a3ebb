//! Error types for the slidetree library.

use std::io;
use thiserror::Error;

/// Result type alias for slidetree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a presentation package.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The container is missing, unreadable, or not a ZIP archive.
    #[error("Cannot open package: {0}")]
    PackageOpen(String),

    /// A part path does not exist in the container.
    #[error("Part not found: {path}")]
    PartNotFound {
        /// Part path inside the container
        path: String,
    },

    /// A relationship id is absent from a part's relationship table.
    #[error("Relationship {id} not found in relationships of '{source_part}'")]
    RelationshipNotFound {
        /// Part whose relationship table was consulted
        source_part: String,
        /// The missing relationship id
        id: String,
    },

    /// A relationship id resolves, but to a part of the wrong kind.
    #[error("Relationship {id} of '{source_part}' has type {rel_type}, expected {expected}")]
    UnexpectedRelationshipType {
        /// Part whose relationship table was consulted
        source_part: String,
        /// The relationship id
        id: String,
        /// Type the relationship declares
        rel_type: String,
        /// Type the caller required
        expected: String,
    },

    /// The presentation descriptor lacks required structure.
    #[error("Malformed presentation: {0}")]
    MalformedPresentation(String),

    /// A part is not well-formed XML.
    #[error("Malformed XML in '{part}': {message}")]
    MalformedXml {
        /// Part being parsed (empty when parsing loose bytes)
        part: String,
        /// Parser diagnostic
        message: String,
    },

    /// A slide index was outside `[0, count)`.
    #[error("Slide index {index} out of range (slide count is {count})")]
    IndexOutOfRange {
        /// Requested index as given by the caller
        index: i64,
        /// Number of slides in the presentation
        count: usize,
    },

    /// A slide has no `p:cSld/p:spTree` root.
    #[error("Shape tree not found in '{part}'")]
    ShapeTreeNotFound {
        /// Slide part path
        part: String,
    },

    /// A failure while handling a specific slide.
    #[error("Slide {index}: {source}")]
    Slide {
        /// Zero-based slide index
        index: usize,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Error producing JSON output.
    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl Error {
    /// Attach a slide index to an error, unless it already carries one.
    pub fn in_slide(self, index: usize) -> Self {
        match self {
            Error::Slide { .. } | Error::IndexOutOfRange { .. } => self,
            other => Error::Slide {
                index,
                source: Box::new(other),
            },
        }
    }

    /// The error with any slide context removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Slide { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn malformed_xml(part: &str, message: impl ToString) -> Self {
        Error::MalformedXml {
            part: part.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::PackageOpen(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::malformed_xml("", err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialize(err.to_string())
    }
}
