//! Async record stream

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{instrument, trace};

use crate::{
    error::Result,
    framing::{self, COUNT_SIZE},
    nonblocking::AsyncStringCodec,
    options::CodecOptions,
    record::Progress,
};

/// Async version of [`crate::record::RecordStream`]
///
/// Records are pulled one at a time with [`AsyncRecordStream::next_record`]; the task may
/// be suspended between (and within) records without losing its place.
///
/// ```
/// # async fn doit() -> loctab_stf::error::Result<()> {
/// use loctab_stf::nonblocking::AsyncRecordStream;
///
/// let input: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x00, 0x01, b'k', 0x00, 0x01, b'v'];
/// let mut records = AsyncRecordStream::new(input);
/// while let Some(record) = records.next_record().await {
///     let (key, text) = record?;
///     println!("{key}\t{text}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AsyncRecordStream<S> {
    codec: AsyncStringCodec<S>,
    progress: Progress,
    failed: bool,
}

impl<S> AsyncRecordStream<S> {
    pub fn new(stream: S) -> Self {
        Self::with_options(stream, &CodecOptions::default())
    }

    pub fn with_options(stream: S, options: &CodecOptions) -> Self {
        Self {
            codec: AsyncStringCodec::with_options(stream, options),
            progress: Progress::default(),
            failed: false,
        }
    }

    pub fn count(&self) -> Option<i32> {
        self.progress.count
    }

    pub fn remaining(&self) -> Option<usize> {
        self.progress.remaining()
    }

    pub fn capacity(&self) -> usize {
        self.codec.capacity()
    }

    pub fn get_mut(&mut self) -> Result<&mut S> {
        self.codec.get_mut()
    }

    pub fn close(&mut self) -> Option<S> {
        self.codec.close()
    }

    pub fn into_inner(self) -> Option<S> {
        self.codec.into_inner()
    }
}

impl<S: AsyncRead + Unpin> AsyncRecordStream<S> {
    /// Read the record count once; later calls do not touch the stream.
    #[instrument(skip(self), err)]
    pub async fn read_count(&mut self) -> Result<i32> {
        if let Some(count) = self.progress.count {
            return Ok(count);
        }

        self.codec.check_cancelled()?;
        let mut field = [0; COUNT_SIZE];
        self.codec.get_mut()?.read_exact(&mut field).await?;

        let count = framing::decode_count(field);
        self.progress.count = Some(count);
        Ok(count)
    }

    /// Read the next record
    ///
    /// Returns `None` once every record was read, or after an error was returned.
    pub async fn next_record(&mut self) -> Option<Result<(String, String)>> {
        if self.failed {
            return None;
        }

        match self.read_record().await {
            Ok(record) => record.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }

    async fn read_record(&mut self) -> Result<Option<(String, String)>> {
        self.read_count().await?;
        if self.progress.is_complete() {
            return Ok(None);
        }

        let key = self.codec.read_string().await?;
        let text = self.codec.read_string().await?;
        self.progress.done += 1;

        trace!(index = self.progress.done - 1, key = %key, "read record");
        Ok(Some((key, text)))
    }
}

impl<S: AsyncWrite + Unpin> AsyncRecordStream<S> {
    #[instrument(skip(self), err)]
    pub async fn write_count(&mut self, count: i32) -> Result<()> {
        self.progress.check_declare()?;
        self.codec.check_cancelled()?;
        self.codec
            .get_mut()?
            .write_all(&framing::encode_count(count))
            .await?;

        self.progress.count = Some(count);
        Ok(())
    }

    /// Write one record, key first. Both strings are checked before either is written.
    pub async fn write_record(&mut self, key: &str, text: &str) -> Result<()> {
        self.progress.check_write(key, text)?;

        self.codec.write_string(key).await?;
        self.codec.write_string(text).await?;
        self.progress.done += 1;

        trace!(index = self.progress.done - 1, key = %key, "wrote record");
        Ok(())
    }

    pub async fn write_all<I, K, V>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, text) in records {
            self.write_record(key.as_ref(), text.as_ref()).await?;
        }
        Ok(())
    }

    pub fn verify_complete(&self) -> Result<()> {
        self.progress.check_finished()
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.codec.flush().await
    }

    /// See [`AsyncStringCodec::finish`]
    pub async fn finish(&mut self) -> Result<Option<S>> {
        self.codec.finish().await
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use tokio_util::sync::CancellationToken;

    use crate::error::{Error, Result};
    use crate::nonblocking::AsyncRecordStream;
    use crate::options::CodecOptions;
    use crate::record::RecordStream;

    #[tokio::test]
    async fn matches_blocking_layout() -> Result<()> {
        let records = [("b", "2"), ("a", "1"), ("ключ", "значение")];

        let mut blocking = RecordStream::new(Cursor::new(Vec::new()));
        blocking.write_count(3)?;
        blocking.write_all(records)?;

        let mut suspending = AsyncRecordStream::new(Cursor::new(Vec::new()));
        suspending.write_count(3).await?;
        suspending.write_all(records).await?;
        suspending.verify_complete()?;

        assert_eq!(
            blocking.into_inner().unwrap_or_default().into_inner(),
            suspending.into_inner().unwrap_or_default().into_inner()
        );

        Ok(())
    }

    #[tokio::test]
    async fn read_all_records() -> Result<()> {
        #[rustfmt::skip]
        let input = vec![
            0x00u8, 0x00, 0x00, 0x02,
            0x00, 0x01, 0x61, 0x00, 0x01, 0x31,
            0x00, 0x01, 0x61, 0x00, 0x01, 0x32,
        ];

        let mut records = AsyncRecordStream::new(Cursor::new(input));
        let mut read = Vec::new();
        while let Some(record) = records.next_record().await {
            read.push(record?);
        }

        assert_eq!(
            read,
            vec![
                ("a".to_string(), "1".to_string()),
                ("a".to_string(), "2".to_string())
            ]
        );
        assert_eq!(records.remaining(), Some(0));

        Ok(())
    }

    #[tokio::test]
    async fn negative_count_yields_nothing() -> Result<()> {
        let input = vec![0x80u8, 0x00, 0x00, 0x00];
        let mut records = AsyncRecordStream::new(Cursor::new(input));
        assert_eq!(records.read_count().await?, i32::MIN);
        assert!(records.next_record().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn cancel_between_records() -> Result<()> {
        #[rustfmt::skip]
        let input = vec![
            0x00u8, 0x00, 0x00, 0x02,
            0x00, 0x01, 0x61, 0x00, 0x01, 0x31,
            0x00, 0x01, 0x62, 0x00, 0x01, 0x32,
        ];

        let token = CancellationToken::new();
        let mut records = AsyncRecordStream::with_options(
            Cursor::new(input),
            &CodecOptions::builder().cancellation(token.clone()).build(),
        );

        assert!(matches!(records.next_record().await, Some(Ok(_))));
        token.cancel();

        assert!(matches!(
            records.next_record().await,
            Some(Err(Error::Cancelled))
        ));
        assert!(records.next_record().await.is_none());
        assert_eq!(records.get_mut()?.position(), 10);
        assert_eq!(records.remaining(), Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn cancel_before_count() -> Result<()> {
        let token = CancellationToken::new();
        token.cancel();

        let mut records = AsyncRecordStream::with_options(
            Cursor::new(vec![0x00u8, 0x00, 0x00, 0x00]),
            &CodecOptions::builder().cancellation(token).build(),
        );
        assert!(matches!(records.read_count().await, Err(Error::Cancelled)));
        assert_eq!(records.get_mut()?.position(), 0);
        assert_eq!(records.count(), None);

        Ok(())
    }
}
