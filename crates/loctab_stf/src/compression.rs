//! zlib adapters around the compressed region of a table.

use std::{
    io::{self, BufRead, BufReader, Read, Write},
    pin::Pin,
    task::{ready, Context, Poll},
};

use async_compression::{tokio::write::ZlibEncoder as AsyncZlibEncoder, Level};
use flate2::{write::ZlibEncoder, Compression, Decompress, FlushDecompress, Status};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, ReadBuf};
use tracing::instrument;

use crate::options::BEST_COMPRESSION;

/// Tags an I/O error as coming from the inflater rather than the underlying stream
#[derive(Error, Debug)]
#[error("{0}")]
pub(crate) struct CorruptStream(flate2::DecompressError);

fn level(compression_level: u32) -> u32 {
    compression_level.min(BEST_COMPRESSION)
}

/// Inflate state shared by the blocking and async readers
///
/// Only errors raised by the inflater itself are tagged [`CorruptStream`]; errors of the
/// underlying stream never pass through here.
struct Inflater {
    inner: Decompress,
    finished: bool,
}

impl Inflater {
    fn new() -> Self {
        Self {
            inner: Decompress::new(true),
            finished: false,
        }
    }

    /// Feed `input` and fill `output`, returning bytes consumed and produced.
    ///
    /// An empty `input` means the stream ended; if the zlib stream (trailer included) is not
    /// complete by then, the region was cut short.
    fn step(&mut self, input: &[u8], output: &mut [u8]) -> io::Result<(usize, usize)> {
        let eof = input.is_empty();
        let flush = if eof {
            FlushDecompress::Finish
        } else {
            FlushDecompress::None
        };

        let (before_in, before_out) = (self.inner.total_in(), self.inner.total_out());
        let status = self
            .inner
            .decompress(input, output, flush)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, CorruptStream(err)))?;
        let consumed = (self.inner.total_in() - before_in) as usize;
        let produced = (self.inner.total_out() - before_out) as usize;

        if status == Status::StreamEnd {
            self.finished = true;
        }
        if eof && produced == 0 && !self.finished {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "compressed region ended before the zlib trailer",
            ));
        }
        Ok((consumed, produced))
    }
}

/// Inflates the compressed region of a table being read
pub(crate) struct InflateReader<R: Read> {
    reader: BufReader<R>,
    inflater: Inflater,
}

impl<R: Read> InflateReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            inflater: Inflater::new(),
        }
    }

    /// Read up to the end of the zlib stream, checking its trailer
    #[instrument(skip(self), err)]
    pub fn finish(&mut self) -> io::Result<u64> {
        io::copy(self, &mut io::sink())
    }
}

impl<R: Read> Read for InflateReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.inflater.finished {
            return Ok(0);
        }

        loop {
            let input = self.reader.fill_buf()?;
            let (consumed, produced) = self.inflater.step(input, buf)?;
            self.reader.consume(consumed);

            if produced > 0 || self.inflater.finished {
                return Ok(produced);
            }
        }
    }
}

/// Deflates the compressed region of a table being written
pub(crate) struct DeflateWriter<W: Write> {
    inner: ZlibEncoder<W>,
}

impl<W: Write> DeflateWriter<W> {
    #[instrument(skip(writer))]
    pub fn new(writer: W, compression_level: u32) -> Self {
        Self {
            inner: ZlibEncoder::new(writer, Compression::new(level(compression_level))),
        }
    }

    /// Write the zlib trailer and return the underlying writer
    ///
    /// Flushing the encoder beforehand would emit a sync block, so callers go straight here.
    #[instrument(skip(self), err)]
    pub fn finish(self) -> io::Result<W> {
        self.inner.finish()
    }

    pub fn total_in(&self) -> u64 {
        self.inner.total_in()
    }
}

impl<W: Write> Write for DeflateWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Async counterpart of [`InflateReader`]
pub(crate) struct AsyncInflateReader<R> {
    reader: tokio::io::BufReader<R>,
    inflater: Inflater,
}

impl<R: AsyncRead + Unpin> AsyncInflateReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: tokio::io::BufReader::new(reader),
            inflater: Inflater::new(),
        }
    }

    /// Async version of [`InflateReader::finish`]
    #[instrument(skip(self), err)]
    pub async fn finish(&mut self) -> io::Result<u64> {
        tokio::io::copy(self, &mut tokio::io::sink()).await
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for AsyncInflateReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if buf.remaining() == 0 || this.inflater.finished {
            return Poll::Ready(Ok(()));
        }

        loop {
            let input = ready!(Pin::new(&mut this.reader).poll_fill_buf(cx))?;
            let (consumed, produced) = this.inflater.step(input, buf.initialize_unfilled())?;
            Pin::new(&mut this.reader).consume(consumed);
            buf.advance(produced);

            if produced > 0 || this.inflater.finished {
                return Poll::Ready(Ok(()));
            }
        }
    }
}

/// Sits between the async encoder and the caller's writer
///
/// With `leave_open` set, shutting the encoder down only flushes the writer, so the caller
/// can keep using it once the table is written.
pub(crate) struct ShutdownGuard<W> {
    inner: W,
    leave_open: bool,
}

impl<W: AsyncWrite + Unpin> AsyncWrite for ShutdownGuard<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.leave_open {
            Pin::new(&mut this.inner).poll_flush(cx)
        } else {
            Pin::new(&mut this.inner).poll_shutdown(cx)
        }
    }
}

/// Async counterpart of [`DeflateWriter`]; finished with `shutdown`
pub(crate) type AsyncDeflateWriter<W> = AsyncZlibEncoder<ShutdownGuard<W>>;

pub(crate) fn async_deflate_writer<W: AsyncWrite + Unpin>(
    writer: W,
    compression_level: u32,
    leave_open: bool,
) -> AsyncDeflateWriter<W> {
    AsyncZlibEncoder::with_quality(
        ShutdownGuard {
            inner: writer,
            leave_open,
        },
        Level::Precise(level(compression_level) as i32),
    )
}

#[cfg(test)]
mod test {
    use std::io::{self, Cursor, Read, Write};

    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use crate::compression::{
        async_deflate_writer, AsyncInflateReader, DeflateWriter, InflateReader,
    };
    use crate::error::{Error, Result};

    fn deflate(data: &[u8]) -> Result<Vec<u8>> {
        let mut writer = DeflateWriter::new(Vec::new(), 9);
        writer.write_all(data)?;
        Ok(writer.finish()?)
    }

    /// Hands out `data`, then fails the way a lost disk or socket would
    struct FailingReader {
        data: Cursor<Vec<u8>>,
        kind: io::ErrorKind,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match Read::read(&mut self.data, buf)? {
                0 => Err(io::Error::new(self.kind, "device went away")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn inflate_what_was_deflated() -> Result<()> {
        let mut writer = DeflateWriter::new(Vec::new(), 9);
        writer.write_all(b"Hello World")?;
        assert_eq!(writer.total_in(), 11);
        let compressed = writer.finish()?;

        // zlib header for the best compression level
        assert_eq!(&compressed[..2], &[0x78, 0xDA]);

        let mut output = Vec::new();
        InflateReader::new(Cursor::new(compressed)).read_to_end(&mut output)?;
        assert_eq!(output, b"Hello World");

        Ok(())
    }

    #[test]
    fn garbage_is_a_decompression_error() {
        let mut output = Vec::new();
        let err = InflateReader::new(Cursor::new(vec![0x12u8, 0x34, 0x56, 0x78, 0x9A]))
            .read_to_end(&mut output)
            .map_err(Error::from);

        assert!(matches!(err, Err(Error::Decompression(_))));
    }

    #[test]
    fn stream_errors_pass_through() -> Result<()> {
        let compressed = deflate(&[0x42; 64])?;

        for kind in [
            io::ErrorKind::Other,
            io::ErrorKind::InvalidData,
            io::ErrorKind::InvalidInput,
        ] {
            let mut reader = InflateReader::new(FailingReader {
                data: Cursor::new(compressed[..6].to_vec()),
                kind,
            });
            let err = reader.read_to_end(&mut Vec::new()).map_err(Error::from);
            assert!(matches!(err, Err(Error::IOError(ref e)) if e.kind() == kind));
        }

        Ok(())
    }

    #[test]
    fn missing_trailer_is_truncation() -> Result<()> {
        let compressed = deflate(b"Hello World")?;

        let mut reader = InflateReader::new(Cursor::new(&compressed[..compressed.len() - 4]));
        let err = reader.finish().map_err(Error::from);
        assert!(matches!(err, Err(Error::TruncatedInput)));

        let mut reader = InflateReader::new(Cursor::new(&compressed));
        assert_eq!(reader.finish()?, 11);

        Ok(())
    }

    #[test]
    fn bad_checksum_is_a_decompression_error() -> Result<()> {
        let mut compressed = deflate(b"Hello World")?;
        let last = compressed.len() - 1;
        compressed[last] ^= 0xFF;

        let err = InflateReader::new(Cursor::new(compressed))
            .finish()
            .map_err(Error::from);
        assert!(matches!(err, Err(Error::Decompression(_))));

        Ok(())
    }

    #[tokio::test]
    async fn async_inflate_matches_blocking() -> Result<()> {
        let data = b"Hello World ".repeat(500);
        let compressed = deflate(&data)?;

        let mut output = Vec::new();
        AsyncInflateReader::new(compressed.as_slice())
            .read_to_end(&mut output)
            .await?;
        assert_eq!(output, data);

        let truncated = &compressed[..compressed.len() - 4];
        let err = AsyncInflateReader::new(truncated)
            .finish()
            .await
            .map_err(Error::from);
        assert!(matches!(err, Err(Error::TruncatedInput)));

        Ok(())
    }

    #[tokio::test]
    async fn async_deflate_matches_blocking() -> Result<()> {
        let data = b"Hello World ".repeat(500);

        let mut writer = async_deflate_writer(Vec::new(), 9, false);
        writer.write_all(&data).await?;
        writer.shutdown().await?;

        assert_eq!(writer.into_inner().inner, deflate(&data)?);
        Ok(())
    }
}
