//! Async codec for length prefixed strings

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, trace};

use crate::{
    buffer::ScratchBuffer,
    codec::require_open,
    error::Result,
    framing::{self, LENGTH_SIZE},
    options::{ensure_active, CodecOptions},
};

/// Async version of [`crate::codec::StringCodec`]
///
/// Every read or write first checks the cancellation token from [`CodecOptions`]; a
/// cancelled operation fails with [`crate::error::Error::Cancelled`] before touching the
/// stream.
#[derive(Debug)]
pub struct AsyncStringCodec<S> {
    stream: Option<S>,
    scratch: ScratchBuffer,
    leave_open: bool,
    lossy: bool,
    cancellation: Option<CancellationToken>,
}

impl<S> AsyncStringCodec<S> {
    pub fn new(stream: S) -> Self {
        Self::with_options(stream, &CodecOptions::default())
    }

    pub fn with_options(stream: S, options: &CodecOptions) -> Self {
        Self {
            stream: Some(stream),
            scratch: ScratchBuffer::with_capacity(options.initial_capacity),
            leave_open: options.leave_open,
            lossy: options.lossy_utf8,
            cancellation: options.cancellation.clone(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.scratch.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Fail with [`crate::error::Error::Cancelled`] if cancellation was requested
    pub fn check_cancelled(&self) -> Result<()> {
        ensure_active(self.cancellation.as_ref())
    }

    pub fn get_mut(&mut self) -> Result<&mut S> {
        require_open(&mut self.stream)
    }

    /// Release the stream, see [`crate::codec::StringCodec::close`]
    pub fn close(&mut self) -> Option<S> {
        let stream = self.stream.take()?;
        if self.leave_open {
            return Some(stream);
        }
        drop(stream);
        None
    }

    pub fn into_inner(mut self) -> Option<S> {
        self.stream.take()
    }
}

impl<S: AsyncRead + Unpin> AsyncStringCodec<S> {
    pub async fn read_string(&mut self) -> Result<String> {
        self.check_cancelled()?;
        let stream = require_open(&mut self.stream)?;

        let mut prefix = [0; LENGTH_SIZE];
        stream.read_exact(&mut prefix).await?;
        let length = framing::decode_length(prefix);

        stream.read_exact(self.scratch.fill(length)).await?;
        let value = self.scratch.decode(length, self.lossy)?;

        trace!(length, "read string");
        Ok(value)
    }
}

impl<S: AsyncWrite + Unpin> AsyncStringCodec<S> {
    pub async fn write_string(&mut self, value: &str) -> Result<()> {
        self.check_cancelled()?;
        let stream = require_open(&mut self.stream)?;

        let prefix = framing::encode_length(value)?;
        stream.write_all(&prefix).await?;
        stream.write_all(self.scratch.stage(value)).await?;

        trace!(length = value.len(), "wrote string");
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        require_open(&mut self.stream)?.flush().await?;
        Ok(())
    }

    /// Flush, then release the stream. Without `leave_open` the stream is shut down first.
    #[instrument(skip(self), err)]
    pub async fn finish(&mut self) -> Result<Option<S>> {
        let stream = require_open(&mut self.stream)?;
        if self.leave_open {
            stream.flush().await?;
        } else {
            stream.shutdown().await?;
        }
        Ok(self.close())
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use tokio_util::sync::CancellationToken;

    use crate::error::{Error, Result};
    use crate::nonblocking::AsyncStringCodec;
    use crate::options::CodecOptions;

    #[tokio::test]
    async fn read_and_write() -> Result<()> {
        let mut writer = AsyncStringCodec::new(Cursor::new(Vec::new()));
        writer.write_string("hello").await?;
        writer.write_string("").await?;

        let mut written = writer.into_inner().unwrap_or_default();
        assert_eq!(
            written.get_ref(),
            &vec![0x00, 0x05, 0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x00, 0x00]
        );

        written.set_position(0);
        let mut reader = AsyncStringCodec::new(written);
        assert_eq!(reader.read_string().await?, "hello");
        assert_eq!(reader.read_string().await?, "");
        assert!(matches!(
            reader.read_string().await,
            Err(Error::TruncatedInput)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_read_leaves_position() -> Result<()> {
        let token = CancellationToken::new();
        let mut reader = AsyncStringCodec::with_options(
            Cursor::new(vec![0x00u8, 0x01, 0x61, 0x00, 0x01, 0x62]),
            &CodecOptions::builder().cancellation(token.clone()).build(),
        );

        assert_eq!(reader.read_string().await?, "a");
        token.cancel();

        assert!(matches!(reader.read_string().await, Err(Error::Cancelled)));
        assert_eq!(reader.get_mut()?.position(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_write_writes_nothing() -> Result<()> {
        let token = CancellationToken::new();
        token.cancel();

        let mut writer = AsyncStringCodec::with_options(
            Cursor::new(Vec::new()),
            &CodecOptions::builder().cancellation(token).build(),
        );
        assert!(matches!(
            writer.write_string("a").await,
            Err(Error::Cancelled)
        ));
        assert!(writer.get_mut()?.get_ref().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn finish_releases_stream() -> Result<()> {
        let mut writer = AsyncStringCodec::with_options(
            Cursor::new(Vec::new()),
            &CodecOptions::builder().leave_open(true).build(),
        );
        writer.write_string("a").await?;

        let stream = writer.finish().await?;
        assert_eq!(
            stream.map(|s| s.into_inner()),
            Some(vec![0x00, 0x01, 0x61])
        );
        assert!(matches!(
            writer.write_string("b").await,
            Err(Error::InvalidState(_))
        ));

        Ok(())
    }
}
