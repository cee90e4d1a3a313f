//! Wire layout of a string table, independent of how bytes are moved.
//!
//! Both the blocking and the async codecs read and write raw fields and hand them to
//! the helpers here, so the byte layout lives in exactly one place.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Size of the uncompressed outer header
pub const HEADER_SIZE: usize = 4;

/// Size of the record count at the start of the compressed region
pub const COUNT_SIZE: usize = 4;

/// Size of the length prefix in front of every string
pub const LENGTH_SIZE: usize = 2;

/// Largest string, in UTF-8 bytes, a length prefix can describe
pub const MAX_STRING_LENGTH: usize = u16::MAX as usize;

/// The outer header is the only little endian field in the format.
pub fn decode_header(field: [u8; HEADER_SIZE]) -> u32 {
    LittleEndian::read_u32(&field)
}

pub fn encode_header(header: u32) -> [u8; HEADER_SIZE] {
    let mut field = [0; HEADER_SIZE];
    LittleEndian::write_u32(&mut field, header);
    field
}

pub fn decode_count(field: [u8; COUNT_SIZE]) -> i32 {
    BigEndian::read_i32(&field)
}

pub fn encode_count(count: i32) -> [u8; COUNT_SIZE] {
    let mut field = [0; COUNT_SIZE];
    BigEndian::write_i32(&mut field, count);
    field
}

/// Count field value for `records` records, failing when it cannot be represented.
pub fn count_for(records: usize) -> Result<i32> {
    i32::try_from(records).map_err(|_| Error::TooManyRecords(records))
}

/// Number of records a count field asks for. Negative counts ask for none.
pub fn records_in(count: i32) -> usize {
    usize::try_from(count).unwrap_or(0)
}

pub fn decode_length(field: [u8; LENGTH_SIZE]) -> usize {
    BigEndian::read_u16(&field) as usize
}

/// Check that `value` fits a length prefix and return its UTF-8 length.
pub fn check_length(value: &str) -> Result<u16> {
    let length = value.len();
    u16::try_from(length).map_err(|_| Error::StringTooLong { length })
}

/// Encode the length prefix for `value`.
pub fn encode_length(value: &str) -> Result<[u8; LENGTH_SIZE]> {
    let mut field = [0; LENGTH_SIZE];
    BigEndian::write_u16(&mut field, check_length(value)?);
    Ok(field)
}
