//! Loading string tables
//!

use std::{fs::File, io::Read, path::Path};

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, instrument};

use crate::{
    compression::{AsyncInflateReader, InflateReader},
    error::{Error, Result},
    framing::{self, HEADER_SIZE},
    nonblocking::AsyncRecordStream,
    options::TableOptions,
    record::RecordStream,
    types::{Entries, StringTable},
};

/// Upper bound on entries reserved from an untrusted count
const MAX_RESERVED: usize = 1 << 16;

impl StringTable {
    /// Read a table from `reader`
    ///
    /// ```no_run
    /// use std::io::prelude::*;
    ///
    /// fn list_entries(reader: impl Read) -> loctab_stf::error::Result<()> {
    ///     let table = loctab_stf::StringTable::load(reader)?;
    ///
    ///     for (key, text) in table.iter() {
    ///         println!("{}\t{}", key, text);
    ///     }
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn load<R: Read>(reader: R) -> Result<StringTable> {
        Self::load_with(reader, &TableOptions::default())
    }

    /// Read a table from `reader` with explicit options
    ///
    /// Either the whole table is returned or an error; nothing partial is kept. The
    /// compressed region is read through its zlib trailer, so a region cut short fails even
    /// when every record arrived.
    #[instrument(skip_all, err)]
    pub fn load_with<R: Read>(mut reader: R, options: &TableOptions) -> Result<StringTable> {
        let mut field = [0; HEADER_SIZE];
        reader.read_exact(&mut field)?;
        let header = framing::decode_header(field);

        let mut records = RecordStream::with_options(InflateReader::new(reader), &options.codec);
        let count = records.read_count()?;

        let mut entries = Entries::with_capacity(framing::records_in(count).min(MAX_RESERVED));
        for record in records.records() {
            let (key, text) = record?;
            entries.insert(key, text);
        }
        records
            .into_inner()
            .ok_or(Error::InvalidState("record stream was closed"))?
            .finish()?;

        debug!(header, count, entries = entries.len(), "loaded string table");
        Ok(StringTable::new(header, entries))
    }

    /// Open and read the table stored at `path`
    #[instrument(skip(path), fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<StringTable> {
        Self::load(File::open(path.as_ref())?)
    }

    /// Async version of [`StringTable::load`]
    pub async fn load_async<R: AsyncRead + Unpin>(reader: R) -> Result<StringTable> {
        Self::load_async_with(reader, &TableOptions::default()).await
    }

    /// Async version of [`StringTable::load_with`]
    ///
    /// Cancellation from the options is checked before each field is read.
    #[instrument(skip_all, err)]
    pub async fn load_async_with<R: AsyncRead + Unpin>(
        mut reader: R,
        options: &TableOptions,
    ) -> Result<StringTable> {
        options.codec.check_cancelled()?;
        let mut field = [0; HEADER_SIZE];
        reader.read_exact(&mut field).await?;
        let header = framing::decode_header(field);

        let mut records =
            AsyncRecordStream::with_options(AsyncInflateReader::new(reader), &options.codec);
        let count = records.read_count().await?;

        let mut entries = Entries::with_capacity(framing::records_in(count).min(MAX_RESERVED));
        while let Some(record) = records.next_record().await {
            let (key, text) = record?;
            entries.insert(key, text);
        }
        options.codec.check_cancelled()?;
        records
            .into_inner()
            .ok_or(Error::InvalidState("record stream was closed"))?
            .finish()
            .await?;

        debug!(header, count, entries = entries.len(), "loaded string table");
        Ok(StringTable::new(header, entries))
    }

    /// Async version of [`StringTable::open`]
    #[instrument(skip(path), fields(path = %path.as_ref().display()), err)]
    pub async fn open_async(path: impl AsRef<Path>) -> Result<StringTable> {
        Self::load_async(tokio::fs::File::open(path.as_ref()).await?).await
    }
}
