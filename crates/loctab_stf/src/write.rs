//! Saving string tables
//!

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument};

use crate::{
    compression::{async_deflate_writer, DeflateWriter},
    error::{Error, Result},
    framing,
    nonblocking::AsyncRecordStream,
    options::TableOptions,
    record::RecordStream,
    types::StringTable,
};

impl StringTable {
    /// Write this table to `writer`, compressing at the best level
    ///
    /// ```
    /// # fn doit() -> loctab_stf::error::Result<()> {
    /// use loctab_stf::StringTable;
    ///
    /// // We use a buffer here, though you'd normally use a `File`
    /// let table = StringTable::from_records(1, [("greeting", "Hello")]);
    /// let mut buf = Vec::new();
    /// table.save(&mut buf)?;
    ///
    /// assert_eq!(&buf[..4], &[0x01, 0x00, 0x00, 0x00]);
    /// assert_eq!(StringTable::load(buf.as_slice())?, table);
    /// # Ok(())
    /// # }
    /// # doit().unwrap();
    /// ```
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        self.save_with(writer, &TableOptions::default())
    }

    /// Write this table to `writer` with explicit options
    ///
    /// Records are written in the table's iteration order. On failure, whatever reached
    /// `writer` is unusable.
    ///
    /// `writer` is flushed, never closed; pass it by value to have it dropped afterwards.
    #[instrument(skip_all, fields(header = self.header(), entries = self.len()), err)]
    pub fn save_with<W: Write>(&self, mut writer: W, options: &TableOptions) -> Result<()> {
        let count = framing::count_for(self.len())?;

        writer.write_all(&framing::encode_header(self.header()))?;

        let mut records = RecordStream::with_options(
            DeflateWriter::new(writer, options.compression_level),
            &options.codec,
        );
        records.write_count(count)?;
        records.write_all(self.iter())?;
        records.verify_complete()?;

        let deflate = records
            .into_inner()
            .ok_or(Error::InvalidState("record stream was closed"))?;
        let uncompressed = deflate.total_in();
        deflate.finish()?.flush()?;

        debug!(uncompressed, "saved string table");
        Ok(())
    }

    /// Create (or truncate) the file at `path` and save this table into it
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()), err)]
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = BufWriter::new(File::create(path.as_ref())?);
        self.save(&mut file)?;
        file.into_inner().map_err(|err| err.into_error())?.sync_all()?;
        Ok(())
    }

    /// Async version of [`StringTable::save`]
    pub async fn save_async<W: AsyncWrite + Unpin>(&self, writer: W) -> Result<()> {
        self.save_async_with(writer, &TableOptions::default()).await
    }

    /// Async version of [`StringTable::save_with`]
    ///
    /// Writes the same bytes as the blocking version. Cancellation from the options is
    /// checked before each field is written.
    ///
    /// `writer` is shut down once the table is complete, unless the codec options ask to
    /// leave it open, in which case it is only flushed.
    #[instrument(skip_all, fields(header = self.header(), entries = self.len()), err)]
    pub async fn save_async_with<W: AsyncWrite + Unpin>(
        &self,
        mut writer: W,
        options: &TableOptions,
    ) -> Result<()> {
        let count = framing::count_for(self.len())?;

        options.codec.check_cancelled()?;
        writer
            .write_all(&framing::encode_header(self.header()))
            .await?;

        let mut records = AsyncRecordStream::with_options(
            async_deflate_writer(
                writer,
                options.compression_level,
                options.codec.leave_open,
            ),
            &options.codec,
        );
        records.write_count(count).await?;
        records.write_all(self.iter()).await?;
        records.verify_complete()?;

        // writes the zlib trailer, then shuts down (or with leave_open, flushes) `writer`
        let mut deflate = records
            .into_inner()
            .ok_or(Error::InvalidState("record stream was closed"))?;
        deflate.shutdown().await?;

        debug!("saved string table");
        Ok(())
    }

    /// Async version of [`StringTable::save_to`]
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()), err)]
    pub async fn save_to_async(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = tokio::io::BufWriter::new(tokio::fs::File::create(path.as_ref()).await?);
        self.save_async(&mut file).await?;
        file.into_inner().sync_all().await?;
        Ok(())
    }
}
