//! This library handles reading from and creating compressed localized **string table** files.
//!
//! # String Table Format Documentation
//!
//! A string table maps string keys to localized texts. The file is a small uncompressed header
//! followed by a single zlib stream holding every record.
//!
//! ## File Structure
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Header                 | 4 bytes: Opaque value, **little endian**                   |
//! | 0x0004         | Compressed Region      | zlib stream containing the record block                    |
//!
//! ### Header
//!
//! - **Header**: A 4-byte unsigned integer whose meaning is not interpreted by this crate. It is
//!   carried verbatim from [`StringTable::load`] to [`StringTable::save`].
//!
//! ### Record Block
//!
//! Once inflated, the compressed region contains a record count followed by that many records.
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Entry Count            | 4 bytes: Signed number of records, big endian           |
//! | 0x0004         | Records                | Entry Count records, see below                          |
//!
//! Each record has the following structure:
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Key Length             | 2 bytes: Length of the key in bytes, big endian         |
//! | 0x0002         | Key                    | (Key Length) bytes: UTF8 string                         |
//! | ...            | Text Length            | 2 bytes: Length of the text in bytes, big endian        |
//! | ...            | Text                   | (Text Length) bytes: UTF8 string                        |
//!
//! - A negative entry count is read as zero records.
//! - A key appearing more than once keeps the text of its last record.
//! - Strings longer than 65535 bytes cannot be stored.
//!
//! ## Additional Information
//!
//! - **Endianness**: Little-endian for the header, big-endian for every other integer
//! - **Compression**: zlib, written at the best compression level by default
//!
//! ## Blocking and async use
//!
//! [`codec::StringCodec`] and [`record::RecordStream`] work over [`std::io`]; the types in
//! [`nonblocking`] work over [`tokio::io`] and support cancellation. Both share the byte layout
//! in [`framing`], so a table written in one mode reads back the same in the other.
//!

pub mod buffer;
pub(crate) mod compression;
pub mod codec;
pub mod error;
pub mod framing;
pub mod nonblocking;
pub mod options;
pub mod read;
pub mod record;
pub mod types;
pub mod write;

pub use options::{CodecOptions, TableOptions};
pub use types::StringTable;
