//! Options controlling how codecs and tables treat their streams.

use bon::Builder;
use tokio_util::sync::CancellationToken;

use crate::{
    buffer::DEFAULT_CAPACITY,
    error::{Error, Result},
};

/// Highest zlib compression level, used when saving by default
pub const BEST_COMPRESSION: u32 = 9;

/// Options for a string or record codec
///
/// ```
/// use loctab_stf::options::CodecOptions;
///
/// let options = CodecOptions::builder()
///     .initial_capacity(512)
///     .leave_open(true)
///     .build();
/// assert!(!options.lossy_utf8);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct CodecOptions {
    /// Starting size of the scratch buffer
    #[builder(default = DEFAULT_CAPACITY)]
    pub initial_capacity: usize,

    /// Hand the stream back from `close` instead of dropping it
    #[builder(default)]
    pub leave_open: bool,

    /// Replace malformed UTF-8 with U+FFFD instead of failing
    #[builder(default)]
    pub lossy_utf8: bool,

    /// Checked before every async read or write
    pub cancellation: Option<CancellationToken>,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CodecOptions {
    /// Fail with [`Error::Cancelled`] if the token was cancelled
    pub fn check_cancelled(&self) -> Result<()> {
        ensure_active(self.cancellation.as_ref())
    }
}

pub(crate) fn ensure_active(token: Option<&CancellationToken>) -> Result<()> {
    match token {
        Some(token) if token.is_cancelled() => Err(Error::Cancelled),
        _ => Ok(()),
    }
}

/// Options for loading or saving a whole table
#[derive(Debug, Clone, Builder)]
pub struct TableOptions {
    /// Options passed down to the record codec
    #[builder(default)]
    pub codec: CodecOptions,

    /// zlib level between 0 and 9
    #[builder(default = BEST_COMPRESSION)]
    pub compression_level: u32,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TableOptions {
    /// Shorthand for options that only differ by a cancellation token
    pub fn cancellable(token: CancellationToken) -> Self {
        Self::builder()
            .codec(CodecOptions::builder().cancellation(token).build())
            .build()
    }
}
