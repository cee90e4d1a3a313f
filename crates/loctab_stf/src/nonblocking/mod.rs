//! Async codecs built on [`tokio::io`]
//!
//! These mirror [`crate::codec`] and [`crate::record`] and produce the same bytes; only the
//! way the task waits on I/O differs.

mod codec;
mod record;

pub use codec::AsyncStringCodec;
pub use record::AsyncRecordStream;
