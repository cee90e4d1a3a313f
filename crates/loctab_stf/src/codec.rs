//! Blocking codec for length prefixed strings
//!

use std::io::{Read, Write};

use tracing::{instrument, trace};

use crate::{
    buffer::ScratchBuffer,
    error::{Error, Result},
    framing::{self, LENGTH_SIZE},
    options::CodecOptions,
};

pub(crate) fn require_open<S>(stream: &mut Option<S>) -> Result<&mut S> {
    stream.as_mut().ok_or(Error::InvalidState("codec is closed"))
}

/// Reads and writes strings framed by a big endian `u16` byte length
///
/// ```
/// # fn doit() -> loctab_stf::error::Result<()> {
/// use loctab_stf::codec::StringCodec;
///
/// let mut codec = StringCodec::new(std::io::Cursor::new(Vec::new()));
/// codec.write_string("hello")?;
///
/// let written = codec.into_inner().unwrap().into_inner();
/// assert_eq!(written, b"\x00\x05hello");
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug)]
pub struct StringCodec<S> {
    stream: Option<S>,
    scratch: ScratchBuffer,
    leave_open: bool,
    lossy: bool,
}

impl<S> StringCodec<S> {
    /// Wrap `stream` with default options
    pub fn new(stream: S) -> Self {
        Self::with_options(stream, &CodecOptions::default())
    }

    pub fn with_options(stream: S, options: &CodecOptions) -> Self {
        Self {
            stream: Some(stream),
            scratch: ScratchBuffer::with_capacity(options.initial_capacity),
            leave_open: options.leave_open,
            lossy: options.lossy_utf8,
        }
    }

    /// Current scratch buffer capacity
    pub fn capacity(&self) -> usize {
        self.scratch.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Get a reference to the underlying stream
    pub fn get_ref(&self) -> Result<&S> {
        self.stream
            .as_ref()
            .ok_or(Error::InvalidState("codec is closed"))
    }

    /// Get a mutable reference to the underlying stream
    ///
    /// Reading or writing through it desynchronizes the codec from the stream.
    pub fn get_mut(&mut self) -> Result<&mut S> {
        require_open(&mut self.stream)
    }

    /// Release the stream. Any further operation fails with [`Error::InvalidState`].
    ///
    /// The stream is handed back when the codec was opened with `leave_open`, and dropped
    /// otherwise. Closing twice is a no-op.
    pub fn close(&mut self) -> Option<S> {
        let stream = self.stream.take()?;
        if self.leave_open {
            return Some(stream);
        }
        drop(stream);
        None
    }

    /// Unwrap and return the stream regardless of `leave_open`
    pub fn into_inner(mut self) -> Option<S> {
        self.stream.take()
    }
}

impl<S: Read> StringCodec<S> {
    /// Read one string
    pub fn read_string(&mut self) -> Result<String> {
        let stream = require_open(&mut self.stream)?;

        let mut prefix = [0; LENGTH_SIZE];
        stream.read_exact(&mut prefix)?;
        let length = framing::decode_length(prefix);

        stream.read_exact(self.scratch.fill(length))?;
        let value = self.scratch.decode(length, self.lossy)?;

        trace!(length, "read string");
        Ok(value)
    }
}

impl<S: Write> StringCodec<S> {
    /// Write one string
    ///
    /// Nothing reaches the stream when the string is too long.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let stream = require_open(&mut self.stream)?;

        let prefix = framing::encode_length(value)?;
        stream.write_all(&prefix)?;
        stream.write_all(self.scratch.stage(value))?;

        trace!(length = value.len(), "wrote string");
        Ok(())
    }

    /// Flush the stream
    #[instrument(skip(self), err)]
    pub fn flush(&mut self) -> Result<()> {
        require_open(&mut self.stream)?.flush()?;
        Ok(())
    }
}
