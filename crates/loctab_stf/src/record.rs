//! Blocking record stream: a count header followed by key/text string pairs
//!

use std::io::{Read, Write};

use tracing::{instrument, trace};

use crate::{
    codec::StringCodec,
    error::{Error, Result},
    framing::{self, COUNT_SIZE},
    options::CodecOptions,
};

/// Progress through the records of one stream
///
/// Shared by the blocking and async record streams.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Progress {
    /// Count read from, or written to, the stream
    pub count: Option<i32>,
    /// Records read or written so far
    pub done: usize,
}

impl Progress {
    pub fn remaining(&self) -> Option<usize> {
        self.count
            .map(|count| framing::records_in(count).saturating_sub(self.done))
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == Some(0)
    }

    pub fn check_declare(&self) -> Result<()> {
        match self.count {
            Some(_) => Err(Error::InvalidState("record count was already written")),
            None => Ok(()),
        }
    }

    /// Check that one more record may be written
    pub fn check_write(&self, key: &str, text: &str) -> Result<()> {
        match self.remaining() {
            None => Err(Error::InvalidState("record count has not been written")),
            Some(0) => Err(Error::InvalidState("more records than the declared count")),
            Some(_) => {
                framing::check_length(key)?;
                framing::check_length(text)?;
                Ok(())
            }
        }
    }

    pub fn check_finished(&self) -> Result<()> {
        match self.remaining() {
            Some(0) => Ok(()),
            None => Err(Error::InvalidState("record count has not been written")),
            Some(_) => Err(Error::InvalidState("fewer records than the declared count")),
        }
    }
}

/// Reads or writes the records of a table's compressed region
///
/// ```
/// # fn doit() -> loctab_stf::error::Result<()> {
/// use loctab_stf::record::RecordStream;
/// use std::io::Cursor;
///
/// let mut writer = RecordStream::new(Cursor::new(Vec::new()));
/// writer.write_count(1)?;
/// writer.write_record("greeting", "Hello")?;
///
/// let mut reader = RecordStream::new(writer.into_inner().unwrap_or_default());
/// reader.get_mut()?.set_position(0);
/// for record in reader.records() {
///     let (key, text) = record?;
///     println!("{key}\t{text}");
/// }
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug)]
pub struct RecordStream<S> {
    codec: StringCodec<S>,
    progress: Progress,
}

impl<S> RecordStream<S> {
    pub fn new(stream: S) -> Self {
        Self::with_options(stream, &CodecOptions::default())
    }

    pub fn with_options(stream: S, options: &CodecOptions) -> Self {
        Self {
            codec: StringCodec::with_options(stream, options),
            progress: Progress::default(),
        }
    }

    /// The count, once read or written
    pub fn count(&self) -> Option<i32> {
        self.progress.count
    }

    /// Records left to read or write, once the count is known
    pub fn remaining(&self) -> Option<usize> {
        self.progress.remaining()
    }

    /// Scratch buffer capacity of the underlying string codec
    pub fn capacity(&self) -> usize {
        self.codec.capacity()
    }

    pub fn get_mut(&mut self) -> Result<&mut S> {
        self.codec.get_mut()
    }

    /// See [`StringCodec::close`]
    pub fn close(&mut self) -> Option<S> {
        self.codec.close()
    }

    pub fn into_inner(self) -> Option<S> {
        self.codec.into_inner()
    }
}

impl<S: Read> RecordStream<S> {
    /// Read the record count. Later calls return the same value without touching the stream.
    #[instrument(skip(self), err)]
    pub fn read_count(&mut self) -> Result<i32> {
        if let Some(count) = self.progress.count {
            return Ok(count);
        }

        let mut field = [0; COUNT_SIZE];
        self.codec.get_mut()?.read_exact(&mut field)?;

        let count = framing::decode_count(field);
        self.progress.count = Some(count);
        Ok(count)
    }

    /// Read the next record, or `None` once the count is exhausted
    pub fn read_record(&mut self) -> Result<Option<(String, String)>> {
        self.read_count()?;
        if self.progress.is_complete() {
            return Ok(None);
        }

        let key = self.codec.read_string()?;
        let text = self.codec.read_string()?;
        self.progress.done += 1;

        trace!(index = self.progress.done - 1, key = %key, "read record");
        Ok(Some((key, text)))
    }

    /// Lazily iterate over the remaining records
    ///
    /// Dropping the iterator early keeps the position; a later call resumes after the
    /// last record yielded.
    pub fn records(&mut self) -> Records<'_, S> {
        Records {
            stream: self,
            failed: false,
        }
    }
}

impl<S: Write> RecordStream<S> {
    /// Write the record count. It may only be written once.
    #[instrument(skip(self), err)]
    pub fn write_count(&mut self, count: i32) -> Result<()> {
        self.progress.check_declare()?;
        self.codec
            .get_mut()?
            .write_all(&framing::encode_count(count))?;

        self.progress.count = Some(count);
        Ok(())
    }

    /// Write one record, key first
    ///
    /// Both strings are checked before either is written, so a rejected record leaves no bytes.
    pub fn write_record(&mut self, key: &str, text: &str) -> Result<()> {
        self.progress.check_write(key, text)?;

        self.codec.write_string(key)?;
        self.codec.write_string(text)?;
        self.progress.done += 1;

        trace!(index = self.progress.done - 1, key = %key, "wrote record");
        Ok(())
    }

    /// Write records in the order given
    pub fn write_all<I, K, V>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, text) in records {
            self.write_record(key.as_ref(), text.as_ref())?;
        }
        Ok(())
    }

    /// Check that exactly the declared number of records was written
    pub fn verify_complete(&self) -> Result<()> {
        self.progress.check_finished()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.codec.flush()
    }
}

/// Iterator over the records of a [`RecordStream`]
///
/// Stops after the first error.
pub struct Records<'a, S> {
    stream: &'a mut RecordStream<S>,
    failed: bool,
}

impl<S: Read> Iterator for Records<'_, S> {
    type Item = Result<(String, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.stream.read_record() {
            Ok(record) => record.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.stream.remaining() {
            Some(remaining) if !self.failed => (0, Some(remaining)),
            Some(_) => (0, Some(0)),
            None => (0, None),
        }
    }
}
