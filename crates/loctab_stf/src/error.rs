//! Error types that can be emitted from this library
//!

use std::io;

use miette::Diagnostic;
use thiserror::Error;

use crate::compression::CorruptStream;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(io::Error),

    /// The stream ended before a field or string payload was fully read
    #[error("unexpected end of input")]
    #[diagnostic(help("the file is truncated or its declared lengths are wrong"))]
    TruncatedInput,

    /// String bytes are not valid UTF-8
    #[error("string is not valid utf-8")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    /// A string is too long for its 16 bit length prefix
    #[error("string of {length} bytes exceeds the 65535 byte limit")]
    StringTooLong {
        /// UTF-8 length of the rejected string
        length: usize,
    },

    /// More records than the 32 bit count field can describe
    #[error("{0} records do not fit in the record count field")]
    TooManyRecords(usize),

    /// The compressed region could not be inflated
    #[error("malformed compressed region")]
    Decompression(#[source] io::Error),

    /// The codec was used after being closed, or records were written out of order
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// The operation was cancelled before it touched the stream
    #[error("operation cancelled")]
    Cancelled,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        if err
            .get_ref()
            .is_some_and(|inner| inner.is::<CorruptStream>())
        {
            return Error::Decompression(err);
        }

        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::TruncatedInput,
            _ => Error::IOError(err),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
