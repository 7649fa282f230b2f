//! Transaction status as reported by `GET tx/<brid>/<rid>/status`.

use crate::error::RpcError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Closed set of statuses a node reports for a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Waiting,
    Confirmed,
    Rejected,
    Unknown,
    Exception,
}

impl TxStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Waiting => "waiting",
            TxStatus::Confirmed => "confirmed",
            TxStatus::Rejected => "rejected",
            TxStatus::Unknown => "unknown",
            TxStatus::Exception => "exception",
        }
    }

    /// True once polling can stop.
    pub fn is_final(&self) -> bool {
        !matches!(self, TxStatus::Waiting)
    }
}

impl FromStr for TxStatus {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, RpcError> {
        match s {
            "waiting" => Ok(TxStatus::Waiting),
            "confirmed" => Ok(TxStatus::Confirmed),
            "rejected" => Ok(TxStatus::Rejected),
            "unknown" => Ok(TxStatus::Unknown),
            "exception" => Ok(TxStatus::Exception),
            other => Err(RpcError::UnexpectedStatus(other.to_string())),
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw status body; `status` is kept as text so unexpected values surface
/// in the error.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    /// Reject reason, sent by newer nodes alongside `rejected`.
    #[serde(default, rename = "rejectReason")]
    pub reject_reason: Option<String>,
}

impl StatusResponse {
    /// Parse `status` into the closed set.
    pub fn tx_status(&self) -> Result<TxStatus, RpcError> {
        self.status.parse()
    }
}

/// A transaction RID is 32 bytes as 64 hex characters.
pub fn validate_tx_rid(tx_rid: &str) -> Result<(), RpcError> {
    if tx_rid.len() != 64 {
        return Err(RpcError::InvalidTxRid(format!(
            "expected 64 hex characters, got {}",
            tx_rid.len()
        )));
    }
    if !tx_rid.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RpcError::InvalidTxRid(format!("'{}' is not hex", tx_rid)));
    }
    Ok(())
}
