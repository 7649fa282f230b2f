//! Canonical GTV encoding.
//!
//! Every value is one context-specific constructed record `0xA0 | kind`
//! wrapping a single universal record:
//!
//! ```text
//! Null     A0 len  05 00
//! Bytes    A1 len  04 len <bytes>
//! Text     A2 len  0C len <utf-8>
//! Integer  A3 len  02 len <minimal two's complement, big-endian>
//! Map      A4 len  30 len { 30 len (0C len <key>) <value> }*
//! List     A5 len  30 len <value>*
//! ```
//!
//! The encoding of a value is unique, so the same bytes serve for hashing
//! and for the wire.

use crate::der::{
    Reader, Writer, CONTEXT_MARKER, TAG_INTEGER, TAG_NULL, TAG_OCTET_STRING, TAG_SEQUENCE,
    TAG_UTF8_STRING,
};
use crate::error::GtvError;
use crate::value::Gtv;

/// Deepest list nesting accepted by the decoder.
pub const MAX_NESTING_DEPTH: usize = 128;

/// The low nibble of a choice tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Null = 0,
    Bytes = 1,
    Text = 2,
    Integer = 3,
    Map = 4,
    List = 5,
}

impl Kind {
    fn of(value: &Gtv) -> Self {
        match value {
            Gtv::Null => Kind::Null,
            Gtv::Bytes(_) => Kind::Bytes,
            Gtv::Text(_) => Kind::Text,
            Gtv::Integer(_) => Kind::Integer,
            Gtv::Map(_) => Kind::Map,
            Gtv::List(_) => Kind::List,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, GtvError> {
        if tag >> 4 != CONTEXT_MARKER {
            return Err(GtvError::Format(format!(
                "tag 0x{:02x} is not a GTV choice tag",
                tag
            )));
        }
        match tag & 0x0F {
            0 => Ok(Kind::Null),
            1 => Ok(Kind::Bytes),
            2 => Ok(Kind::Text),
            3 => Ok(Kind::Integer),
            4 => Ok(Kind::Map),
            5 => Ok(Kind::List),
            other => Err(GtvError::UnknownTag(other)),
        }
    }

    fn tag(self) -> u8 {
        CONTEXT_MARKER << 4 | self as u8
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a value to its canonical bytes.
pub fn encode(value: &Gtv) -> Vec<u8> {
    let mut w = Writer::new();
    write_value(&mut w, value);
    w.into_bytes()
}

fn write_value(w: &mut Writer, value: &Gtv) {
    w.write_nested(Kind::of(value).tag(), |body| match value {
        Gtv::Null => body.write_tlv(TAG_NULL, &[]),
        Gtv::Bytes(v) => body.write_tlv(TAG_OCTET_STRING, v),
        Gtv::Text(v) => body.write_tlv(TAG_UTF8_STRING, v.as_bytes()),
        Gtv::Integer(v) => body.write_tlv(TAG_INTEGER, &integer_octets(*v)),
        Gtv::List(items) => body.write_nested(TAG_SEQUENCE, |seq| {
            for item in items {
                write_value(seq, item);
            }
        }),
        Gtv::Map(entries) => body.write_nested(TAG_SEQUENCE, |seq| {
            for (key, item) in entries {
                seq.write_nested(TAG_SEQUENCE, |pair| {
                    pair.write_tlv(TAG_UTF8_STRING, key.as_bytes());
                    write_value(pair, item);
                });
            }
        }),
    });
}

/// Minimal big-endian two's complement octets of `v`.
fn integer_octets(v: i64) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 && is_redundant_sign_octet(bytes[start], bytes[start + 1]) {
        start += 1;
    }
    bytes[start..].to_vec()
}

/// True when `first` only repeats the sign bit carried by `next`.
fn is_redundant_sign_octet(first: u8, next: u8) -> bool {
    (first == 0x00 && next & 0x80 == 0) || (first == 0xFF && next & 0x80 != 0)
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode exactly one value occupying the whole buffer.
pub fn decode(buf: &[u8]) -> Result<Gtv, GtvError> {
    let mut reader = Reader::new(buf);
    let value = read_value(&mut reader, 0)?;
    reader.finish("top-level value")?;
    Ok(value)
}

fn read_value(reader: &mut Reader<'_>, depth: usize) -> Result<Gtv, GtvError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(GtvError::Format(format!(
            "values nested deeper than {} levels",
            MAX_NESTING_DEPTH
        )));
    }

    let kind = Kind::from_tag(reader.peek_tag()?)?;
    let mut body = Reader::new(reader.read_record()?);
    let value = match kind {
        Kind::Null => {
            if !body.read_primitive(TAG_NULL, "NULL")?.is_empty() {
                return Err(GtvError::Format("NULL with a non-empty value".into()));
            }
            Gtv::Null
        }
        Kind::Bytes => Gtv::Bytes(body.read_primitive(TAG_OCTET_STRING, "OCTET STRING")?.to_vec()),
        Kind::Text => {
            let raw = body.read_primitive(TAG_UTF8_STRING, "UTF8String")?;
            let text = std::str::from_utf8(raw)
                .map_err(|e| GtvError::Format(format!("invalid UTF-8 in string: {}", e)))?;
            Gtv::Text(text.to_string())
        }
        Kind::Integer => Gtv::Integer(integer_from_octets(
            body.read_primitive(TAG_INTEGER, "INTEGER")?,
        )?),
        Kind::List => {
            let mut seq = Reader::new(body.read_primitive(TAG_SEQUENCE, "SEQUENCE")?);
            let mut items = Vec::new();
            while !seq.is_empty() {
                items.push(read_value(&mut seq, depth + 1)?);
            }
            Gtv::List(items)
        }
        Kind::Map => return Err(GtvError::Unsupported("decoding dict values".into())),
    };
    body.finish("GTV value")?;
    Ok(value)
}

fn integer_from_octets(raw: &[u8]) -> Result<i64, GtvError> {
    match raw.len() {
        0 => return Err(GtvError::Format("empty INTEGER".into())),
        1..=8 => {}
        n => {
            return Err(GtvError::Format(format!(
                "INTEGER of {} octets does not fit in 64 bits",
                n
            )))
        }
    }
    if raw.len() > 1 && is_redundant_sign_octet(raw[0], raw[1]) {
        return Err(GtvError::Format("non-minimal INTEGER encoding".into()));
    }

    let seed: i64 = if raw[0] & 0x80 != 0 { -1 } else { 0 };
    Ok(raw.iter().fold(seed, |acc, b| acc << 8 | *b as i64))
}

impl Gtv {
    /// Canonical encoding of this value.
    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }

    /// Decode a single value occupying the whole buffer.
    pub fn decode(buf: &[u8]) -> Result<Gtv, GtvError> {
        decode(buf)
    }
}
