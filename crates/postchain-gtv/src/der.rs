//! DER-style tag and length octets.
//!
//! Only the universal tags the GTV encoding actually uses are known here.
//! Lengths follow the DER definite forms: short form below 128, long form
//! (`0x80 | k` then `k` big-endian octets) from 128 upwards.

use crate::error::GtvError;

// =============================================================================
// Constants
// =============================================================================

/// High nibble shared by every GTV choice tag (context-specific, constructed).
pub const CONTEXT_MARKER: u8 = 0xA;

/// Universal tags.
pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_NULL: u8 = 0x05;
pub const TAG_UTF8_STRING: u8 = 0x0C;
pub const TAG_SEQUENCE: u8 = 0x30;

/// Long-form flag on the first length octet.
const LONG_FORM: u8 = 0x80;

/// Most length octets accepted after a long-form marker.
const MAX_LENGTH_OCTETS: usize = 8;

// =============================================================================
// Lengths
// =============================================================================

/// Encode a definite length, short form when it fits in seven bits.
pub fn encode_length(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + MAX_LENGTH_OCTETS);
    write_length(&mut out, len);
    out
}

pub(crate) fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < LONG_FORM as usize {
        out.push(len as u8);
        return;
    }
    let bytes = (len as u64).to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.push(LONG_FORM | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

/// Decode the length of the TLV record whose tag octet sits at `offset`.
///
/// The length octet is read at `offset + 1`. Any length octet with the top
/// bit set starts a long form; its low seven bits count the big-endian
/// octets that follow.
///
/// Returns `(length, header_len)`, where `header_len` covers the tag and all
/// length octets, so the value starts at `offset + header_len`. Whether the
/// value itself fits in `buf` is left to the caller.
pub fn decode_length(buf: &[u8], offset: usize) -> Result<(usize, usize), GtvError> {
    let first = offset
        .checked_add(1)
        .and_then(|i| buf.get(i))
        .copied()
        .ok_or_else(|| GtvError::Format("missing length octet".into()))?;

    if first & LONG_FORM == 0 {
        return Ok((first as usize, 2));
    }

    let octets = (first & !LONG_FORM) as usize;
    if octets == 0 {
        return Err(GtvError::Format("indefinite length is not allowed".into()));
    }
    if octets > MAX_LENGTH_OCTETS {
        return Err(GtvError::Format(format!(
            "length uses {} octets, at most {} supported",
            octets, MAX_LENGTH_OCTETS
        )));
    }

    let start = offset + 2;
    let raw = buf
        .get(start..start + octets)
        .ok_or_else(|| GtvError::Format("truncated long-form length".into()))?;
    if raw[0] == 0 {
        return Err(GtvError::Format(
            "non-canonical length: leading zero octet".into(),
        ));
    }

    let len = raw.iter().fold(0u64, |acc, b| acc << 8 | *b as u64);
    if len < LONG_FORM as u64 {
        return Err(GtvError::Format(format!(
            "non-canonical length: {} must use the short form",
            len
        )));
    }
    let len = usize::try_from(len)
        .map_err(|_| GtvError::Format(format!("length {} does not fit in memory", len)))?;

    Ok((len, 2 + octets))
}

// =============================================================================
// Reader
// =============================================================================

pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn peek_tag(&self) -> Result<u8, GtvError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| GtvError::Format("unexpected end of input".into()))
    }

    /// Consume one TLV record and return its value octets.
    pub(crate) fn read_record(&mut self) -> Result<&'a [u8], GtvError> {
        let (len, header) = decode_length(self.data, self.pos)?;
        if self.remaining() - header < len {
            return Err(GtvError::Format(format!(
                "record declares {} value bytes, only {} remain",
                len,
                self.remaining() - header
            )));
        }
        let start = self.pos + header;
        self.pos = start + len;
        Ok(&self.data[start..start + len])
    }

    /// Consume a record that must carry `tag`, returning its value octets.
    pub(crate) fn read_primitive(&mut self, tag: u8, what: &str) -> Result<&'a [u8], GtvError> {
        let found = self.peek_tag()?;
        if found != tag {
            return Err(GtvError::Format(format!(
                "expected {} (tag 0x{:02x}), found tag 0x{:02x}",
                what, tag, found
            )));
        }
        self.read_record()
    }

    pub(crate) fn finish(&self, what: &str) -> Result<(), GtvError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(GtvError::Format(format!(
                "{} trailing bytes after {}",
                self.remaining(),
                what
            )))
        }
    }
}

// =============================================================================
// Writer
// =============================================================================

pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub(crate) fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
        }
    }

    pub(crate) fn write_tlv(&mut self, tag: u8, value: &[u8]) {
        self.buf.push(tag);
        write_length(&mut self.buf, value.len());
        self.buf.extend_from_slice(value);
    }

    /// Write a constructed record whose value is produced by `body`.
    pub(crate) fn write_nested(&mut self, tag: u8, body: impl FnOnce(&mut Writer)) {
        let mut inner = Writer::new();
        body(&mut inner);
        self.write_tlv(tag, &inner.buf);
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
