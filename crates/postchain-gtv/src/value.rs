//! The GTV tagged value and its conversions from host types.
//!
//! Static host types convert with `From`. Conversions that can lose
//! information (`u64` above `i64::MAX`, dynamic JSON trees) go through
//! `TryFrom` and fail with [`GtvError::Conversion`] naming the offending type.

use crate::error::GtvError;
use serde_json::Value as Json;
use std::fmt;

/// A generic transaction value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gtv {
    Null,
    Integer(i64),
    Bytes(Vec<u8>),
    Text(String),
    List(Vec<Gtv>),
    /// Entries keep insertion order; keys are not checked for uniqueness.
    Map(Vec<(String, Gtv)>),
}

impl Gtv {
    /// Build a list from anything convertible element-wise.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Gtv>,
    {
        Gtv::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a map, preserving the iteration order of `entries`.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Gtv>,
    {
        Gtv::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Convert a dynamic JSON tree.
    pub fn from_json(value: &Json) -> Result<Self, GtvError> {
        Gtv::try_from(value)
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Gtv::Null => "null",
            Gtv::Integer(_) => "integer",
            Gtv::Bytes(_) => "byte array",
            Gtv::Text(_) => "string",
            Gtv::List(_) => "array",
            Gtv::Map(_) => "dict",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Gtv::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Gtv::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Gtv::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Gtv::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Gtv]> {
        match self {
            Gtv::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, Gtv)]> {
        match self {
            Gtv::Map(v) => Some(v),
            _ => None,
        }
    }

    /// First value stored under `key` in a map.
    pub fn get(&self, key: &str) -> Option<&Gtv> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn into_list(self) -> Option<Vec<Gtv>> {
        match self {
            Gtv::List(v) => Some(v),
            _ => None,
        }
    }
}

// =============================================================================
// Host conversions
// =============================================================================

impl From<i64> for Gtv {
    fn from(v: i64) -> Self {
        Gtv::Integer(v)
    }
}

impl From<i32> for Gtv {
    fn from(v: i32) -> Self {
        Gtv::Integer(v as i64)
    }
}

impl From<u32> for Gtv {
    fn from(v: u32) -> Self {
        Gtv::Integer(v as i64)
    }
}

impl TryFrom<u64> for Gtv {
    type Error = GtvError;

    fn try_from(v: u64) -> Result<Self, GtvError> {
        i64::try_from(v)
            .map(Gtv::Integer)
            .map_err(|_| GtvError::conversion("u64", format!("{} exceeds i64::MAX", v)))
    }
}

impl TryFrom<usize> for Gtv {
    type Error = GtvError;

    fn try_from(v: usize) -> Result<Self, GtvError> {
        i64::try_from(v)
            .map(Gtv::Integer)
            .map_err(|_| GtvError::conversion("usize", format!("{} exceeds i64::MAX", v)))
    }
}

impl From<&str> for Gtv {
    fn from(v: &str) -> Self {
        Gtv::Text(v.to_string())
    }
}

impl From<String> for Gtv {
    fn from(v: String) -> Self {
        Gtv::Text(v)
    }
}

impl From<Vec<u8>> for Gtv {
    fn from(v: Vec<u8>) -> Self {
        Gtv::Bytes(v)
    }
}

impl From<&[u8]> for Gtv {
    fn from(v: &[u8]) -> Self {
        Gtv::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Gtv {
    fn from(v: [u8; N]) -> Self {
        Gtv::Bytes(v.to_vec())
    }
}

impl From<Vec<Gtv>> for Gtv {
    fn from(v: Vec<Gtv>) -> Self {
        Gtv::List(v)
    }
}

impl<T: Into<Gtv>> From<Option<T>> for Gtv {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Gtv::Null)
    }
}

impl TryFrom<&Json> for Gtv {
    type Error = GtvError;

    fn try_from(value: &Json) -> Result<Self, GtvError> {
        match value {
            Json::Null => Ok(Gtv::Null),
            Json::Bool(b) => Err(GtvError::conversion(
                "bool",
                format!("booleans have no GTV form (got {})", b),
            )),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Gtv::Integer(i))
                } else if n.is_u64() {
                    Err(GtvError::conversion("u64", format!("{} exceeds i64::MAX", n)))
                } else {
                    Err(GtvError::conversion("f64", format!("{} is not an integer", n)))
                }
            }
            Json::String(s) => Ok(Gtv::Text(s.clone())),
            Json::Array(items) => items
                .iter()
                .map(Gtv::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Gtv::List),
            Json::Object(map) => map
                .iter()
                .map(|(k, v)| Gtv::try_from(v).map(|v| (k.clone(), v)))
                .collect::<Result<Vec<_>, _>>()
                .map(Gtv::Map),
        }
    }
}

impl TryFrom<Json> for Gtv {
    type Error = GtvError;

    fn try_from(value: Json) -> Result<Self, GtvError> {
        Gtv::try_from(&value)
    }
}

// =============================================================================
// Display
// =============================================================================

/// Compact literal form: `x"0102"` for bytes, quoted strings, `[..]` and `{..}`.
impl fmt::Display for Gtv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gtv::Null => write!(f, "null"),
            Gtv::Integer(v) => write!(f, "{}", v),
            Gtv::Bytes(v) => write!(f, "x\"{}\"", hex::encode(v)),
            Gtv::Text(v) => write!(f, "{:?}", v),
            Gtv::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Gtv::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}
