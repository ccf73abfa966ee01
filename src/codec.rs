//! Byte-level encodings for the three stores
//!
//! Everything on disk is built from two primitives:
//! - a variable-byte unsigned integer (7 bits per byte, low group first,
//!   high bit set on the final byte), and
//! - fixed-width big-endian 32-bit values for dictionary entries and
//!   counters.
//!
//! Store D values are concatenated `<varint docId><u8 occ>` records.
//! Store P keys are `<varint docId><varint wordId>`; values are varint
//! position lists. Any malformed byte sequence decodes to `CorruptValue`.

use crate::error::{Result, SquillError};

/// Append `value` as a self-delimiting variable-length integer
///
/// Seven value bits per byte, least-significant group first; the final
/// byte carries the high bit.
pub fn encode_vbyte(value: u32, output: &mut Vec<u8>) {
    let mut rest = value;
    while rest >= 0x80 {
        output.push((rest & 0x7F) as u8);
        rest >>= 7;
    }
    output.push(rest as u8 | 0x80);
}

/// Read one variable-length integer, advancing `pos` past it
///
/// Truncated input and values running past 32 bits are `CorruptValue`,
/// labelled with the store the bytes came from.
pub fn decode_vbyte(input: &[u8], pos: &mut usize, store: &'static str) -> Result<u32> {
    let mut value: u32 = 0;
    let mut shift: u32 = 0;
    loop {
        let Some(&group) = input.get(*pos) else {
            return Err(SquillError::CorruptValue(store));
        };
        *pos += 1;
        value |= ((group & 0x7F) as u32) << shift;
        if group & 0x80 != 0 {
            return Ok(value);
        }
        shift += 7;
        if shift > 28 {
            return Err(SquillError::CorruptValue(store));
        }
    }
}

/// Clamp an occurrence count to the single-byte on-disk range
pub fn clamp_occ(count: usize) -> u8 {
    count.min(255) as u8
}

/// Encode a dictionary value (positive wordId or the stopword marker)
pub fn encode_word_value(id: i32) -> [u8; 4] {
    id.to_be_bytes()
}

/// Decode a dictionary value; anything but 4 bytes is corrupt
pub fn decode_word_value(bytes: &[u8]) -> Result<i32> {
    let fixed: [u8; 4] = bytes
        .try_into()
        .map_err(|_| SquillError::CorruptValue("ixw"))?;
    Ok(i32::from_be_bytes(fixed))
}

/// Encode the document counter
pub fn encode_count(count: u32) -> [u8; 4] {
    count.to_be_bytes()
}

/// Decode the document counter
pub fn decode_count(bytes: &[u8]) -> Result<u32> {
    let fixed: [u8; 4] = bytes
        .try_into()
        .map_err(|_| SquillError::CorruptValue("ixd"))?;
    Ok(u32::from_be_bytes(fixed))
}

/// Store D key for a word: a single varint
///
/// A valid key has its high bit set only on the final byte, so the
/// reserved `NDOCS` key (plain ASCII) can never collide with one.
pub fn word_key(word_id: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(5);
    encode_vbyte(word_id, &mut key);
    key
}

/// Append one `(docId, occ)` record to a store D value
pub fn encode_doc_record(doc_id: u32, occ: u8, output: &mut Vec<u8>) {
    encode_vbyte(doc_id, output);
    output.push(occ);
}

/// Encode a full store D value from records
pub fn encode_doc_records(records: &[(u32, u8)]) -> Vec<u8> {
    let mut output = Vec::with_capacity(records.len() * 3);
    for &(doc_id, occ) in records {
        encode_doc_record(doc_id, occ, &mut output);
    }
    output
}

/// Decode a store D value by streaming records until exhaustion
pub fn decode_doc_records(input: &[u8]) -> Result<Vec<(u32, u8)>> {
    let mut records = Vec::new();
    let mut pos = 0;
    while pos < input.len() {
        let doc_id = decode_vbyte(input, &mut pos, "ixd")?;
        if pos >= input.len() {
            return Err(SquillError::CorruptValue("ixd"));
        }
        let occ = input[pos];
        pos += 1;
        records.push((doc_id, occ));
    }
    Ok(records)
}

/// Store P composite key: `<varint docId><varint wordId>`
pub fn pos_key(doc_id: u32, word_id: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(10);
    encode_vbyte(doc_id, &mut key);
    encode_vbyte(word_id, &mut key);
    key
}

/// Split a store P key back into `(docId, wordId)`
pub fn split_pos_key(key: &[u8]) -> Result<(u32, u32)> {
    let mut pos = 0;
    let doc_id = decode_vbyte(key, &mut pos, "ixp")?;
    let word_id = decode_vbyte(key, &mut pos, "ixp")?;
    if pos != key.len() {
        return Err(SquillError::CorruptValue("ixp"));
    }
    Ok((doc_id, word_id))
}

/// Encode an in-document position list
pub fn encode_positions(positions: &[u32]) -> Vec<u8> {
    let mut output = Vec::with_capacity(positions.len() * 2);
    for &position in positions {
        encode_vbyte(position, &mut output);
    }
    output
}

/// Decode an in-document position list
pub fn decode_positions(input: &[u8]) -> Result<Vec<u32>> {
    let mut positions = Vec::new();
    let mut pos = 0;
    while pos < input.len() {
        positions.push(decode_vbyte(input, &mut pos, "ixp")?);
    }
    Ok(positions)
}
