// Error taxonomy for the collection core and the file codecs.
//
// Container errors and codec errors are separate enums: callers of the
// container never see I/O failures, and the codecs never report index
// violations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by `Collection` operations.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// Index-based access, removal, or edit beyond the current bounds.
    #[error("index {index} out of range for collection of {len} records")]
    OutOfRange { index: usize, len: usize },
}

/// Errors reported by the text and binary codecs.
///
/// Malformed text rows are deliberately NOT represented here: they are
/// recovered per row and collected as [`RowIssue`](crate::files::RowIssue)
/// diagnostics in the import report, while the import keeps going.
#[derive(Debug, Error)]
pub enum FileError {
    /// Source or destination could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Text import found no header line, or a header that does not match
    /// the expected `Manufacturer;Model;...` layout. Fatal to the import.
    #[error("missing or unrecognized header line in {}", path.display())]
    MissingHeader { path: PathBuf },

    /// Binary stream ended mid-record or carried garbage field values.
    /// Fatal to the load; nothing is appended to the collection.
    #[error("corrupt binary data while reading record {record}: {detail}")]
    CorruptData { record: usize, detail: String },

    /// Any other I/O failure while reading or writing an open stream.
    #[error(transparent)]
    Io(#[from] io::Error),
}
